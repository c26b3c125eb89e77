//! Diagnostic reporting for the veril front end.
//!
//! Errors, warnings, and notes are *data*, not control flow: every pipeline
//! stage appends [`Diagnostic`] values to a shared [`DiagnosticSink`] and
//! keeps going. At the end of a run the driver sorts the accumulated
//! diagnostics by source position and renders them in the fixed
//! `FILE:LINE:COL: kind: msg` format followed by an `(errors=N, warnings=M)`
//! summary.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{render_all, render_one, render_summary};
pub use severity::Severity;
pub use sink::DiagnosticSink;
