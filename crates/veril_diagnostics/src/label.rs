//! Secondary source locations attached to diagnostics.

use serde::{Deserialize, Serialize};
use veril_source::Span;

/// The role of a label within a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The primary location the diagnostic points at.
    Primary,
    /// An extra location providing context (e.g., "previously defined here").
    Secondary,
}

/// An annotated source span attached to a diagnostic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// Whether this label is the primary or a secondary location.
    pub style: LabelStyle,
    /// The annotated source span.
    pub span: Span,
    /// The annotation message.
    pub message: String,
}

impl Label {
    /// Creates a primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            style: LabelStyle::Primary,
            span,
            message: message.into(),
        }
    }

    /// Creates a secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            style: LabelStyle::Secondary,
            span,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_label() {
        let l = Label::primary(Span::DUMMY, "expected ';' here");
        assert_eq!(l.style, LabelStyle::Primary);
        assert_eq!(l.message, "expected ';' here");
    }

    #[test]
    fn secondary_label() {
        let l = Label::secondary(Span::DUMMY, "previously defined here");
        assert_eq!(l.style, LabelStyle::Secondary);
    }
}
