//! Shared foundational types used across the veril SystemVerilog front end.
//!
//! This crate provides core types including interned symbols, content hashing,
//! and common result types used by every pipeline stage.

#![warn(missing_docs)]

pub mod hash;
pub mod result;
pub mod symbol;

pub use hash::ContentHash;
pub use result::{InternalError, VerilResult};
pub use symbol::{Symbol, SymbolTable};
