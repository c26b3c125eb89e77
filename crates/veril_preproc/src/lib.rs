//! SystemVerilog preprocessor for the veril front end.
//!
//! Transforms source text into preprocessed text while emitting an *origin
//! map* that translates any location of the preprocessed stream back to the
//! true source: through `include splices and macro expansions. Handles
//! `define/`undef, `ifdef/`ifndef/`elsif/`else/`endif, `include,
//! `timescale, `default_nettype, `unconnected_drive, `resetall and
//! `undefineall.
//!
//! Preprocessing is per-file: a fatal error ([`PreprocError`]) drops the
//! offending file from downstream passes but the job continues. Non-fatal
//! problems (arity mismatches, undefined macros) are reported to the
//! diagnostic sink and preprocessing keeps going.
//!
//! Expanded and included regions are bracketed with inline markers
//! `\u{1}B:<idx>\u{2}` / `\u{1}E:<idx>\u{2}` where `idx` is the index of the
//! opening origin-map record. The marker bytes cannot occur in valid
//! SystemVerilog tokens, and line breaks inside spliced material are
//! preserved so line counts stay attributable.

#![warn(missing_docs)]

pub mod cond;
pub mod errors;
pub mod macros;
pub mod origin;
pub mod preprocessor;
pub mod unit;

pub use cond::{CondKind, CondStack};
pub use errors::PreprocError;
pub use macros::{MacroDef, MacroTable};
pub use origin::{OriginAction, OriginContext, OriginMap, OriginRecord};
pub use preprocessor::{preprocess_file, PreprocOptions, PreprocOutput, MARKER_BEGIN, MARKER_END};
pub use unit::{CompilationUnit, NetType, TimeUnit, Timescale};
