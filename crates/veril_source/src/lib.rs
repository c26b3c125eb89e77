//! Source text management for the veril front end.
//!
//! One [`SourceDb`] per session owns every piece of text a run touches:
//! the configured `.sv` sources, headers resolved through the include
//! search ([`locate`]/[`sibling`]), chunk files split off oversized
//! inputs, and the preprocessed stream of each compiled file. Everything
//! downstream refers to text by [`FileId`] and byte-offset [`Span`]s;
//! line/column coordinates exist only at the diagnostic boundary
//! ([`ResolvedSpan`]) and in the origin-map remap, which round-trips
//! between lines and offsets through the per-file line index.

#![warn(missing_docs)]

pub mod file_id;
pub mod locate;
pub mod resolved_span;
pub mod source_db;
pub mod source_file;
pub mod span;

pub use file_id::FileId;
pub use locate::{locate, sibling};
pub use resolved_span::ResolvedSpan;
pub use source_db::SourceDb;
pub use source_file::SourceFile;
pub use span::Span;
