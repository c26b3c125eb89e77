//! Byte ranges within a source or preprocessed stream.
//!
//! Every token the lexer produces, every AST node boundary, and every
//! diagnostic the pipeline emits is anchored by a [`Span`]: a file handle
//! plus a half-open byte interval. The preprocessor also uses spans to mark
//! the extent of the construct behind each origin-map record (the
//! `` `include `` directive or macro instance that caused a splice), which
//! is why spans must merge cheaply and tolerate zero width: a pure
//! insertion point, such as the seam right after a spliced include, has
//! `start == end`.

use crate::file_id::FileId;
use serde::{Deserialize, Serialize};

/// A half-open byte interval `[start, end)` in one file.
///
/// Offsets index the text the span was produced over; for tokens of a
/// preprocessed stream that is the stream registered in the source
/// database, not the file on disk. Line/column resolution happens once, at
/// diagnostic-render time, through
/// [`SourceDb::resolve_span`](crate::SourceDb::resolve_span).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// The stream this interval indexes.
    pub file: FileId,
    /// First byte of the construct.
    pub start: u32,
    /// One past the last byte of the construct.
    pub end: u32,
}

impl Span {
    /// The span of entities with no textual origin: session-level
    /// diagnostics, predefined macros, and the seeded builtin classes.
    pub const DUMMY: Span = Span {
        file: FileId::DUMMY,
        start: 0,
        end: 0,
    };

    /// Anchors a new span at `[start, end)` of `file`.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// The smallest span covering both `self` and `other`.
    ///
    /// The parser uses this to grow a node's extent from its first token to
    /// the last one consumed.
    ///
    /// # Panics
    ///
    /// Panics when the spans index different streams; a node never spans
    /// two files (chunk files are parsed independently).
    pub fn merge(self, other: Span) -> Span {
        assert_eq!(self.file, other.file, "span endpoints in different streams");
        let start = if other.start < self.start {
            other.start
        } else {
            self.start
        };
        let end = if other.end > self.end {
            other.end
        } else {
            self.end
        };
        Span {
            file: self.file,
            start,
            end,
        }
    }

    /// Whether `other` lies entirely inside this span.
    ///
    /// Holds for a macro-instance span against the directive line that
    /// carries it, and fails across streams.
    pub fn contains(&self, other: Span) -> bool {
        self.file == other.file && self.start <= other.start && other.end <= self.end
    }

    /// Width of the interval in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether this span is a pure insertion point (zero width).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this span belongs to no stream (see [`Span::DUMMY`]).
    pub fn is_dummy(&self) -> bool {
        self.file == FileId::DUMMY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Offsets below index this directive line:
    //   `include "defs.svh"
    // tick at 0, keyword ends at 8, filename spans 9..19.
    fn in_stream(start: u32, end: u32) -> Span {
        Span::new(FileId::from_raw(3), start, end)
    }

    #[test]
    fn anchors_a_directive() {
        let directive = in_stream(0, 19);
        assert_eq!(directive.len(), 19);
        assert!(!directive.is_empty());
        assert!(!directive.is_dummy());
    }

    #[test]
    fn node_extent_grows_over_consumed_tokens() {
        // `module` keyword, then the matching `endmodule` much later.
        let first_token = in_stream(0, 6);
        let last_token = in_stream(120, 129);
        let node = first_token.merge(last_token);
        assert_eq!((node.start, node.end), (0, 129));
        // Growing is insensitive to which side came first.
        assert_eq!(last_token.merge(first_token), node);
    }

    #[test]
    fn merge_of_overlapping_selects_widest() {
        // A part-select `[7:0]` inside a wider declaration.
        let decl = in_stream(5, 40);
        let select = in_stream(18, 23);
        assert_eq!(decl.merge(select), decl);
    }

    #[test]
    #[should_panic(expected = "different streams")]
    fn merge_refuses_cross_stream_endpoints() {
        let a = Span::new(FileId::from_raw(0), 0, 4);
        let b = Span::new(FileId::from_raw(1), 0, 4);
        let _ = a.merge(b);
    }

    #[test]
    fn directive_line_contains_its_filename() {
        let directive = in_stream(0, 19);
        let filename = in_stream(9, 19);
        assert!(directive.contains(filename));
        assert!(!filename.contains(directive));
        // An identical range in another stream is unrelated.
        let elsewhere = Span::new(FileId::from_raw(9), 9, 19);
        assert!(!directive.contains(elsewhere));
    }

    #[test]
    fn splice_seam_is_an_insertion_point() {
        let seam = in_stream(57, 57);
        assert!(seam.is_empty());
        assert_eq!(seam.len(), 0);
        assert!(!seam.is_dummy());
    }

    #[test]
    fn session_level_spans_are_dummy() {
        assert!(Span::DUMMY.is_dummy());
        assert!(Span::DUMMY.is_empty());
        // A real stream's offset zero is not the dummy.
        assert!(!in_stream(0, 0).is_dummy());
    }

    #[test]
    fn survives_serialization() {
        let span = in_stream(9, 19);
        let json = serde_json::to_string(&span).unwrap();
        let back: Span = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);
    }
}
