//! The elaboration-level IR of the veril front end.
//!
//! Declaration-level entities (design components, signals, typespecs,
//! expressions, constant values) are produced by the component compiler;
//! the [`Design`] registry maps qualified names to components; the
//! [`InstanceTree`] holds the elaborated per-instance view. Components may
//! reference each other cyclically, so every cross-reference is an arena ID
//! rather than an owning pointer.

#![warn(missing_docs)]

pub mod arena;
pub mod component;
pub mod design;
pub mod expr;
pub mod ids;
pub mod instance;
pub mod loc;
pub mod signal;
pub mod stmt;
pub mod typespec;
pub mod value;

pub use arena::{Arena, ArenaId};
pub use component::{Component, ComponentKind, Modport, Parameter, Process, ProcessKind, SubInstance, Tf, UdpData};
pub use design::Design;
pub use expr::{ExprKind, ExprNode, OpCode, RefTarget};
pub use ids::{ComponentId, ExprId, InstanceId, TypespecId};
pub use instance::{InstanceKind, InstanceTree, ModuleInstance};
pub use loc::SourceLoc;
pub use signal::{Direction, SignalDecl};
pub use stmt::{CaseItem, StmtId, StmtKind, StmtNode};
pub use typespec::{Range, Typespec, TypespecKind};
pub use value::{Value, ValueKind, ValuePool};
