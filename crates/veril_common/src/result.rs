//! Common result and error types for the veril front end.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value (which may be partial or degraded after
/// error recovery). `Err` indicates an unrecoverable internal error (a bug
/// in veril), not a user-facing error. User errors are reported through the
/// diagnostic sink and the operation still returns `Ok`.
pub type VerilResult<T> = Result<T, InternalError>;

/// An internal compiler error indicating a bug in veril, not a user input problem.
///
/// These errors should never occur during normal operation. If one does occur,
/// it means there is a logic error in the compiler that should be fixed.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
