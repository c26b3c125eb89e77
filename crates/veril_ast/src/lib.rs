//! The packed per-file AST for the veril front end.
//!
//! Parsed files are arenas of [`VObject`] nodes connected by indices rather
//! than pointers. The arena is append-only and numbered post-order: a node
//! is allocated after all of its children, so the root carries the highest
//! index and every `child`/`sibling` edge points strictly downward. The
//! arena is immutable after parse, except for the late-bound `definition`
//! field.

#![warn(missing_docs)]

pub mod file_content;
pub mod library;
pub mod node;

pub use file_content::FileContent;
pub use library::Library;
pub use node::{NodeId, NodeKind, VObject};
