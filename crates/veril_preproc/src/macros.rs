//! Macro definition storage shared across a compilation unit.

use std::collections::HashMap;
use std::sync::Mutex;
use veril_common::Symbol;
use veril_source::Span;

/// A single `define entry.
///
/// Macros are either argumentless (`params` empty) or parametric. Parameter
/// substitution is textual at expansion time; the body is stored exactly as
/// written (minus line continuations, which are replaced by newlines so
/// expanded line counts match the definition).
#[derive(Debug, Clone)]
pub struct MacroDef {
    /// The macro name.
    pub name: Symbol,
    /// Formal parameter names, in declaration order. Empty for object-like macros.
    pub params: Vec<String>,
    /// The replacement text.
    pub body: String,
    /// The span of the definition, used by "defined here" labels.
    pub def_span: Span,
}

impl MacroDef {
    /// Returns `true` if instances of this macro require a parenthesized
    /// argument list.
    pub fn requires_parens(&self) -> bool {
        !self.params.is_empty()
    }
}

/// Thread-safe macro storage.
///
/// In file-unit mode each file gets its own table; otherwise the table is
/// shared across the whole job and definitions accumulate in file order.
/// Redefinition silently replaces the previous entry, matching simulator
/// behavior.
pub struct MacroTable {
    macros: Mutex<HashMap<Symbol, MacroDef>>,
}

impl MacroTable {
    /// Creates an empty macro table.
    pub fn new() -> Self {
        Self {
            macros: Mutex::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) a macro definition.
    pub fn register(&self, def: MacroDef) {
        self.macros.lock().unwrap().insert(def.name, def);
    }

    /// Looks up a macro by name.
    ///
    /// Definition is scope-based, not value-based: `ifdef only asks whether
    /// an entry exists, never evaluates the body.
    pub fn get(&self, name: Symbol) -> Option<MacroDef> {
        self.macros.lock().unwrap().get(&name).cloned()
    }

    /// Returns `true` if a macro with the given name is defined.
    pub fn is_defined(&self, name: Symbol) -> bool {
        self.macros.lock().unwrap().contains_key(&name)
    }

    /// Removes a macro definition (`undef). Unknown names are ignored.
    pub fn undefine(&self, name: Symbol) {
        self.macros.lock().unwrap().remove(&name);
    }

    /// Removes every macro definition (`undefineall).
    pub fn clear(&self) {
        self.macros.lock().unwrap().clear();
    }

    /// Returns the number of defined macros.
    pub fn len(&self) -> usize {
        self.macros.lock().unwrap().len()
    }

    /// Returns `true` if no macros are defined.
    pub fn is_empty(&self) -> bool {
        self.macros.lock().unwrap().is_empty()
    }
}

impl Default for MacroTable {
    fn default() -> Self {
        Self::new()
    }
}
