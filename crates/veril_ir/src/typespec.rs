//! Structural descriptions of SystemVerilog data types.

use crate::ids::{ComponentId, ExprId, TypespecId};
use crate::loc::SourceLoc;
use serde::{Deserialize, Serialize};
use veril_common::Symbol;

/// A packed or unpacked range, kept both as expressions (for re-evaluation
/// under parameter overrides) and as folded bounds when the fold succeeded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Range {
    /// Left (msb) bound expression.
    pub left: ExprId,
    /// Right (lsb) bound expression.
    pub right: ExprId,
    /// Folded `(left, right)` bounds, when constant in the evaluation
    /// context the typespec was built in.
    pub folded: Option<(i64, i64)>,
}

/// The structural kind of a typespec.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TypespecKind {
    /// `logic [ranges]`, 4-state.
    Logic {
        /// Whether declared `signed`.
        signed: bool,
        /// Packed ranges, outermost first.
        ranges: Vec<Range>,
    },
    /// `bit [ranges]`, 2-state.
    BitVec {
        /// Whether declared `signed`.
        signed: bool,
        /// Packed ranges, outermost first.
        ranges: Vec<Range>,
    },
    /// Fixed-width integer variants (`int`, `byte`, `shortint`, `longint`,
    /// `integer`, `time`).
    IntVariant {
        /// The declaring keyword.
        keyword: Symbol,
        /// Whether signed (defaults to the keyword's own signedness).
        signed: bool,
    },
    /// `real` / `shortreal` / `realtime`.
    Real,
    /// `string`.
    StringType,
    /// `chandle`.
    Chandle,
    /// `void`.
    Void,
    /// An enum with optional base type and named members.
    Enum {
        /// Base typespec, when written.
        base: Option<TypespecId>,
        /// `(name, value expression)` pairs, in declaration order.
        members: Vec<(Symbol, Option<ExprId>)>,
    },
    /// A struct with named members.
    Struct {
        /// Whether declared `packed`.
        packed: bool,
        /// `(name, member typespec)` pairs, in declaration order.
        members: Vec<(Symbol, TypespecId)>,
    },
    /// A union with named members.
    Union {
        /// Whether declared `packed`.
        packed: bool,
        /// `(name, member typespec)` pairs, in declaration order.
        members: Vec<(Symbol, TypespecId)>,
    },
    /// An unpacked array of an element type.
    Array {
        /// Element typespec.
        element: TypespecId,
        /// The unpacked range.
        range: Range,
    },
    /// A packed array of an element type.
    PackedArray {
        /// Element typespec.
        element: TypespecId,
        /// The packed range.
        range: Range,
    },
    /// A reference to a class, resolved late.
    ClassRef {
        /// The class name as written.
        name: Symbol,
        /// The resolved class component.
        actual: Option<ComponentId>,
    },
    /// A reference to an interface (with optional modport), resolved late.
    InterfaceRef {
        /// The interface name as written.
        name: Symbol,
        /// The modport name, when written.
        modport: Option<Symbol>,
        /// The resolved interface component.
        actual: Option<ComponentId>,
    },
    /// A reference to a module type, resolved late.
    ModuleRef {
        /// The module name as written.
        name: Symbol,
        /// The resolved module component.
        actual: Option<ComponentId>,
    },
    /// A use of a typedef'd name, resolved late.
    TypedefAlias {
        /// The typedef name as written.
        name: Symbol,
        /// The resolved target typespec.
        target: Option<TypespecId>,
    },
    /// A package-qualified type use (`pkg::name`), resolved late.
    ImportRef {
        /// The package name.
        package: Symbol,
        /// The type name within the package.
        name: Symbol,
        /// The resolved target typespec.
        target: Option<TypespecId>,
    },
    /// A shape the compiler does not model; traversable but opaque.
    Unsupported,
}

/// A structural type description.
///
/// The `instance` pointer names the component the type was *declared* in;
/// for a typedef from package `P` used inside module `M`, `instance` is
/// `P`, not `M`. This is what lets downstream consumers distinguish
/// `pkg_a::T` from `pkg_b::T`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Typespec {
    /// The structural kind.
    pub kind: TypespecKind,
    /// The declaring scope, or `None` for primitive built-ins.
    pub instance: Option<ComponentId>,
    /// Source location of the declaration or use.
    pub loc: SourceLoc,
}

impl Typespec {
    /// Creates a typespec with no declaring scope (a primitive built-in).
    pub fn primitive(kind: TypespecKind) -> Self {
        Self {
            kind,
            instance: None,
            loc: SourceLoc::UNKNOWN,
        }
    }

    /// Returns `true` if this kind never needs an `instance` pointer.
    pub fn is_primitive_kind(&self) -> bool {
        matches!(
            self.kind,
            TypespecKind::Logic { .. }
                | TypespecKind::BitVec { .. }
                | TypespecKind::IntVariant { .. }
                | TypespecKind::Real
                | TypespecKind::StringType
                | TypespecKind::Chandle
                | TypespecKind::Void
                | TypespecKind::Unsupported
        )
    }

    /// The folded packed vector range, when this is a vector type with a
    /// constant range. Used by consumers that only care about bounds.
    pub fn folded_vector_range(&self) -> Option<(i64, i64)> {
        match &self.kind {
            TypespecKind::Logic { ranges, .. } | TypespecKind::BitVec { ranges, .. } => {
                ranges.first().and_then(|r| r.folded)
            }
            TypespecKind::PackedArray { range, .. } => range.folded,
            _ => None,
        }
    }
}
