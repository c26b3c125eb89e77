//! Diagnostic severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// A note attached to another diagnostic or informational output.
    Note,
    /// A warning: suspicious but legal input; compilation continues.
    Warning,
    /// An error: invalid input; the affected construct is degraded or dropped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Note), "note");
    }

    #[test]
    fn ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Note);
    }

    #[test]
    fn serde_roundtrip() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        let back: Severity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Severity::Warning);
    }
}
