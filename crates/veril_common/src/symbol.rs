//! Interned symbols for cheap cloning and O(1) equality comparison.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned string handle for any named entity in the design.
///
/// Symbols are interned strings represented as a `u32` index into a
/// session-wide string table. This provides O(1) equality comparison and
/// O(1) cloning. Index 0 is reserved for the bad symbol (the empty string,
/// interned at table construction).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Symbol(u32);

impl Symbol {
    /// The reserved bad symbol, backed by the empty string.
    pub const BAD: Symbol = Symbol(0);

    /// Creates a `Symbol` from a raw `u32` index.
    ///
    /// This is primarily intended for deserialization and testing.
    /// In normal use, symbols should be created through [`SymbolTable::register`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this symbol.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if this is the reserved bad symbol.
    pub fn is_bad(self) -> bool {
        self.0 == 0
    }
}

// SAFETY: `Symbol` wraps a `u32` which is always a valid `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for Symbol {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Symbol)
    }
}

/// Thread-safe session-wide symbol table backed by [`lasso::ThreadedRodeo`].
///
/// All identifiers, component names, macro names, and library names are
/// interned to provide O(1) equality, O(1) cloning, and string deduplication
/// across the compilation session. Registration is idempotent: re-registering
/// the same string returns the same [`Symbol`] regardless of concurrent callers.
pub struct SymbolTable {
    rodeo: ThreadedRodeo<Symbol>,
}

impl SymbolTable {
    /// Creates a new symbol table with the bad symbol pre-registered at index 0.
    pub fn new() -> Self {
        let rodeo = ThreadedRodeo::new();
        let bad = rodeo.get_or_intern("");
        debug_assert_eq!(bad, Symbol::BAD);
        Self { rodeo }
    }

    /// Registers a string, returning its [`Symbol`]. If the string was already
    /// registered, returns the existing symbol without allocating.
    pub fn register(&self, s: &str) -> Symbol {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up a registered string without interning it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.rodeo.get(s)
    }

    /// Resolves a [`Symbol`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Symbol` was not created by this table.
    pub fn lookup(&self, sym: Symbol) -> &str {
        self.rodeo.resolve(&sym)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
