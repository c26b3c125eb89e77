//! Line/column coordinates for diagnostic output.
//!
//! Byte spans stay byte spans until the very end of a run; only when the
//! renderer prints its fixed `FILE:LINE:COL: kind: msg` lines does a span
//! get resolved into this human-facing form.

use std::fmt;
use std::path::PathBuf;

/// A span translated to 1-indexed line/column coordinates.
///
/// Produced by [`SourceDb::resolve_span`](crate::SourceDb::resolve_span).
/// Because preprocessed streams are registered under the path of the file
/// they came from, `file_path` already names what the user expects to see
/// even when the span indexes a stream rather than the file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// Display path of the stream's originating file.
    pub file_path: PathBuf,
    /// Line of the first byte (1-indexed).
    pub start_line: u32,
    /// Column of the first byte (1-indexed).
    pub start_col: u32,
    /// Line of the last byte (1-indexed).
    pub end_line: u32,
    /// Column just past the last byte (1-indexed).
    pub end_col: u32,
}

impl fmt::Display for ResolvedSpan {
    /// The `FILE:LINE:COL` prefix of the diagnostic format; only the start
    /// position is printed, matching the renderer's single-line contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file_path.display(),
            self.start_line,
            self.start_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_the_diagnostic_prefix() {
        // An unresolved include on line 3 of an .svh header.
        let at = ResolvedSpan {
            file_path: PathBuf::from("rtl/include/defs.svh"),
            start_line: 3,
            start_col: 10,
            end_line: 3,
            end_col: 22,
        };
        assert_eq!(format!("{at}"), "rtl/include/defs.svh:3:10");
    }

    #[test]
    fn multi_line_constructs_print_their_start() {
        // A module spanning lines 1..=40 reports where it begins; the end
        // coordinates stay available for containment checks.
        let module = ResolvedSpan {
            file_path: PathBuf::from("core.sv"),
            start_line: 1,
            start_col: 1,
            end_line: 40,
            end_col: 10,
        };
        assert_eq!(format!("{module}"), "core.sv:1:1");
        assert_eq!(module.end_line, 40);
    }
}
