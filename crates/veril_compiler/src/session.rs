//! The root session handle.
//!
//! A [`Session`] owns every process-wide resource of a run: the source
//! database, symbol table, diagnostic sink, and configuration. All AST
//! arenas and IR produced by a run hang off the [`Compiler`](crate::Compiler)
//! created from the session; dropping both purges everything together.

use std::sync::{Mutex, RwLock};
use veril_common::SymbolTable;
use veril_config::CompileConfig;
use veril_diagnostics::DiagnosticSink;
use veril_source::{FileId, SourceDb};

/// The root handle carrying shared session state.
pub struct Session {
    /// All loaded source text. Reader-writer locked: parallel parse
    /// workers read concurrently, the rare include-load path writes.
    pub source_db: RwLock<SourceDb>,
    /// The session symbol table (thread-safe).
    pub symbols: SymbolTable,
    /// The diagnostic accumulator (thread-safe).
    pub sink: DiagnosticSink,
    /// The compilation configuration.
    pub config: CompileConfig,
    /// Sources registered in memory, compiled in place of (or in addition
    /// to) `config.project.sources`.
    pub(crate) in_memory: Mutex<Vec<FileId>>,
}

impl Session {
    /// Creates a session from a configuration.
    pub fn new(config: CompileConfig) -> Self {
        Self {
            source_db: RwLock::new(SourceDb::new()),
            symbols: SymbolTable::new(),
            sink: DiagnosticSink::new(),
            config,
            in_memory: Mutex::new(Vec::new()),
        }
    }

    /// Registers an in-memory source file for compilation. Used by tests
    /// and API callers that bypass the filesystem.
    pub fn add_source(&self, name: &str, content: &str) -> FileId {
        let id = self
            .source_db
            .write()
            .unwrap()
            .add_source(name, content.to_string());
        self.in_memory.lock().unwrap().push(id);
        id
    }

    /// Renders all accumulated diagnostics plus the summary line.
    pub fn render_diagnostics(&self) -> String {
        let db = self.source_db.read().unwrap();
        veril_diagnostics::render_all(&self.sink, &db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_from_minimal_config() {
        let config = CompileConfig::from_sources(vec![]);
        let session = Session::new(config);
        assert!(!session.sink.has_errors());
        assert_eq!(session.source_db.read().unwrap().file_count(), 0);
    }

    #[test]
    fn add_source_registers_in_memory() {
        let session = Session::new(CompileConfig::from_sources(vec![]));
        let id = session.add_source("a.sv", "module m; endmodule");
        assert_eq!(session.in_memory.lock().unwrap().as_slice(), &[id]);
        assert_eq!(session.source_db.read().unwrap().file_count(), 1);
    }

    #[test]
    fn render_includes_summary() {
        let session = Session::new(CompileConfig::from_sources(vec![]));
        let out = session.render_diagnostics();
        assert!(out.contains("(errors=0, warnings=0)"));
    }
}
