//! One registered file or preprocessed stream.

use crate::file_id::FileId;
use std::path::PathBuf;
use veril_common::ContentHash;

/// A unit of text the pipeline works over: an original `.sv`/`.svh` file,
/// an included header, a chunk of a split file, or a preprocessed stream.
///
/// A line index is built once at registration. It serves two consumers:
/// diagnostic rendering (offset to line/column) and the origin-map remap
/// (line back to offset), both of which run hot enough that rescanning the
/// text each time is not acceptable. The content hash identifies identical
/// text across registrations, which is what lets chunk files and re-loaded
/// headers be told apart from genuinely new sources.
pub struct SourceFile {
    /// The handle this text was registered under.
    pub id: FileId,
    /// Display path: the on-disk path, or for streams and chunks the path
    /// of the originating file (possibly suffixed with a chunk marker).
    pub path: PathBuf,
    /// The text itself.
    pub content: String,
    /// Offset of the first byte of each line; index 0 holds line 1.
    line_index: Vec<u32>,
    /// XXH3 hash of `content`.
    pub content_hash: ContentHash,
}

impl SourceFile {
    /// Registers text under a handle, building the line index up front.
    pub fn new(id: FileId, path: PathBuf, content: String) -> Self {
        let mut line_index = vec![0u32];
        line_index.extend(
            content
                .match_indices('\n')
                .map(|(offset, _)| (offset + 1) as u32),
        );
        let content_hash = ContentHash::from_bytes(content.as_bytes());
        Self {
            id,
            path,
            content,
            line_index,
            content_hash,
        }
    }

    /// Translates a byte offset to 1-indexed `(line, column)`.
    ///
    /// Binary-searches the line index; offsets past the end land on the
    /// last line, which keeps EOF diagnostics printable.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let slot = self
            .line_index
            .partition_point(|&start| start <= byte_offset)
            - 1;
        let line = (slot + 1) as u32;
        let col = byte_offset - self.line_index[slot] + 1;
        (line, col)
    }

    /// The inverse of [`line_col`](Self::line_col): the offset where a
    /// 1-indexed line begins, or `None` past the end of the text.
    ///
    /// The origin-map remap uses this to turn a resolved `(file, line)`
    /// back into a span the renderer can print.
    pub fn line_offset(&self, line: u32) -> Option<u32> {
        let slot = line.checked_sub(1)? as usize;
        self.line_index.get(slot).copied()
    }

    /// Number of lines, counting by content rather than separators: a
    /// trailing newline does not open a new line, and empty text is one
    /// line. This is the count line-preservation reasoning works with.
    pub fn line_count(&self) -> u32 {
        let mut count = self.line_index.len() as u32;
        if count > 1 && self.content.ends_with('\n') {
            count -= 1;
        }
        count
    }

    /// The text between two byte offsets.
    pub fn snippet(&self, start: u32, end: u32) -> &str {
        &self.content[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(content: &str) -> SourceFile {
        SourceFile::new(FileId::from_raw(0), PathBuf::from("fifo.sv"), content.to_string())
    }

    #[test]
    fn offsets_resolve_through_a_module_body() {
        let f = stream("module fifo;\nlogic [7:0] data;\nendmodule\n");
        // `module` keyword.
        assert_eq!(f.line_col(0), (1, 1));
        // `logic` on the second line (offset 13).
        assert_eq!(f.line_col(13), (2, 1));
        // `data` within that declaration (offset 25).
        assert_eq!(f.line_col(25), (2, 13));
        // `endmodule` opens line 3 (offset 31).
        assert_eq!(f.line_col(31), (3, 1));
    }

    #[test]
    fn line_offset_inverts_line_col() {
        let f = stream("`define W 8\nwire [`W-1:0] d;\n");
        for line in 1..=2u32 {
            let offset = f.line_offset(line).unwrap();
            assert_eq!(f.line_col(offset), (line, 1));
        }
        // The trailing newline leaves an empty EOF slot, then nothing.
        assert_eq!(f.line_offset(3), Some(f.content.len() as u32));
        assert_eq!(f.line_offset(4), None);
        assert_eq!(f.line_offset(0), None, "lines are 1-indexed");
    }

    #[test]
    fn offsets_past_eof_land_on_the_last_line() {
        let f = stream("module m; endmodule");
        let (line, _) = f.line_col(f.content.len() as u32 + 10);
        assert_eq!(line, 1);
    }

    #[test]
    fn line_count_matches_preprocessor_accounting() {
        // Directive-only text keeps its line count when the directives are
        // blanked out; the trailing newline opens no extra line.
        assert_eq!(stream("`define A\n`define B\n`undef A\n").line_count(), 3);
        assert_eq!(stream("\n\n\n").line_count(), 3);
        assert_eq!(stream("module m; endmodule").line_count(), 1);
        assert_eq!(stream("").line_count(), 1);
    }

    #[test]
    fn snippet_recovers_token_text() {
        let f = stream("assign y = a & b;");
        assert_eq!(f.snippet(0, 6), "assign");
        assert_eq!(f.snippet(11, 16), "a & b");
    }

    #[test]
    fn identical_chunks_hash_identically() {
        let a = SourceFile::new(
            FileId::from_raw(4),
            PathBuf::from("big.sv#chunk0"),
            "module a;\nendmodule\n".to_string(),
        );
        let b = SourceFile::new(
            FileId::from_raw(5),
            PathBuf::from("big.sv#chunk1"),
            "module a;\nendmodule\n".to_string(),
        );
        assert_eq!(a.content_hash, b.content_hash);
        let c = stream("module c;\nendmodule\n");
        assert_ne!(a.content_hash, c.content_hash);
    }
}
