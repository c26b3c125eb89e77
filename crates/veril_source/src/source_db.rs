//! The session-wide registry of source text.

use crate::file_id::FileId;
use crate::resolved_span::ResolvedSpan;
use crate::source_file::SourceFile;
use crate::span::Span;
use std::io;
use std::path::{Path, PathBuf};

/// Owner of every piece of text a run touches.
///
/// Four kinds of registration share one handle space, in the order the
/// pipeline encounters them: the configured sources, headers pulled in by
/// `` `include ``, chunk files split off oversized inputs, and the
/// preprocessed stream of each compiled file. A stream is registered under
/// its originating file's display path, so resolving any span, no matter
/// which stage produced it, prints a path the user recognizes.
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Reads a file from disk and registers it.
    ///
    /// Failure here is the one catastrophic condition of the front end:
    /// the driver aborts the run rather than compiling a partial file set.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add_source(path.to_path_buf(), content))
    }

    /// Registers in-memory text under a display path.
    ///
    /// This is how preprocessed streams and chunk files enter the registry,
    /// and how API callers compile without touching the filesystem.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(id, name.into(), content));
        id
    }

    /// The registered text behind a handle.
    ///
    /// # Panics
    ///
    /// Panics on a handle this registry never issued.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// The earliest registration under `path`, if any.
    ///
    /// The preprocessor calls this before loading an include target so a
    /// header pulled in by several files is registered exactly once. The
    /// earliest-wins rule also means a lookup after preprocessing still
    /// finds the on-disk original, not the stream sharing its path.
    pub fn find_by_path(&self, path: &Path) -> Option<FileId> {
        self.files.iter().find(|f| f.path == path).map(|f| f.id)
    }

    /// Number of registrations (streams and chunks included).
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Translates a span into the line/column form the renderer prints.
    ///
    /// The end coordinate is taken from the span's last byte so a span
    /// ending at a line break reports the line it covers, not the next one;
    /// insertion points resolve to their own position.
    pub fn resolve_span(&self, span: Span) -> ResolvedSpan {
        let file = self.get_file(span.file);
        let (start_line, start_col) = file.line_col(span.start);
        let last_byte = span.end.saturating_sub(1).max(span.start);
        let (end_line, end_col) = file.line_col(last_byte);
        ResolvedSpan {
            file_path: file.path.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// The text a span covers.
    pub fn snippet(&self, span: Span) -> &str {
        self.get_file(span.file).snippet(span.start, span.end)
    }

    /// Resolves a handle back to its native filesystem path.
    ///
    /// The rest of the pipeline treats paths opaquely through [`FileId`];
    /// this is the one escape hatch for output and display.
    pub fn platform_path(&self, id: FileId) -> &Path {
        &self.get_file(id).path
    }
}

impl Default for SourceDb {
    fn default() -> Self {
        Self::new()
    }
}
