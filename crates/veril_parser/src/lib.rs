//! Hand-rolled recursive descent parser for SystemVerilog-2017.
//!
//! This crate runs over *preprocessed* text (see `veril_preproc`) and emits
//! the packed [`FileContent`] arena defined in `veril_ast`. The main entry
//! point is [`parse_file`].
//!
//! # Architecture
//!
//! - **Lexer** ([`lexer`]): Converts preprocessed text to tokens, handling
//!   case-sensitive keywords, operators, sized/based literals, comments,
//!   and inline preprocessor markers.
//! - **Parser** ([`parser`]): Recursive descent with Pratt expression
//!   parsing and error recovery via error nodes. Nodes are emitted
//!   bottom-up so the arena is numbered post-order: every `child` and
//!   `sibling` edge points at a strictly lower index and the root design
//!   node holds the highest.
//!
//! # Scope
//!
//! Covers the declaration surface the design compiler consumes: modules
//! (ANSI and non-ANSI ports), interfaces with modports and clocking blocks,
//! packages, programs, classes with `extends`, UDP primitives with tables,
//! typedefs (enum/struct/union/named), tasks and functions, generates,
//! instantiations with parameter overrides, assertions, and the full
//! expression operator set.

#![warn(missing_docs)]

mod decl;
mod expr;
/// Lexical analyzer for preprocessed SystemVerilog-2017 text.
pub mod lexer;
/// Recursive descent parser emitting `VObject` arenas.
pub mod parser;
mod stmt;
/// Token types for the SystemVerilog-2017 lexer.
pub mod token;

pub use token::{SvToken, Token};

use veril_ast::FileContent;
use veril_common::{Symbol, SymbolTable};
use veril_diagnostics::DiagnosticSink;
use veril_source::{FileId, SourceDb};

/// Parses a preprocessed SystemVerilog file into a packed AST.
///
/// Lexes the file's content and parses it into a [`FileContent`] whose root
/// node has kind `Design`. Errors are reported to the diagnostic sink and
/// represented as `Error` nodes for downstream processing.
pub fn parse_file(
    file_id: FileId,
    source_db: &SourceDb,
    library: Symbol,
    symbols: &SymbolTable,
    sink: &DiagnosticSink,
) -> FileContent {
    let file = source_db.get_file(file_id);
    let source = &file.content;
    let tokens = lexer::lex(source, file_id, sink);
    let parser = parser::Parser::new(tokens, source, file_id, library, symbols, sink);
    parser.parse_source_file()
}
