//! Statement IR.
//!
//! Process and task/function bodies are lowered into these nodes by the
//! component compiler. Shapes the compiler does not model become
//! `Unsupported` so later passes can still traverse.

use crate::expr::OpCode;
use crate::ids::{ExprId, TypespecId};
use crate::loc::SourceLoc;
use serde::{Deserialize, Serialize};
use veril_common::Symbol;

use crate::arena::ArenaId;

/// Opaque, copyable ID for a statement IR node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct StmtId(u32);

impl StmtId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl ArenaId for StmtId {
    fn from_raw(index: u32) -> Self {
        Self(index)
    }

    fn as_raw(self) -> u32 {
        self.0
    }
}

/// One arm of a case statement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseItem {
    /// Match expressions; empty for `default`.
    pub exprs: Vec<ExprId>,
    /// The arm body.
    pub body: StmtId,
    /// Whether this is the `default` arm.
    pub is_default: bool,
}

/// A statement node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StmtKind {
    /// A `begin`/`end` or `fork`/`join` block.
    Block {
        /// The block label, when written.
        label: Option<Symbol>,
        /// Statements in order.
        stmts: Vec<StmtId>,
        /// `true` for fork/join.
        parallel: bool,
    },
    /// An `if` with optional `unique`/`priority` qualifier.
    If {
        /// `unique`/`priority`, when written.
        qualifier: Option<Symbol>,
        /// The condition.
        cond: ExprId,
        /// The then branch.
        then_stmt: StmtId,
        /// The else branch, when written.
        else_stmt: Option<StmtId>,
    },
    /// A `case`/`casex`/`casez`.
    Case {
        /// The case keyword (or qualifier) as written.
        keyword: Symbol,
        /// The scrutinee.
        scrutinee: ExprId,
        /// The arms in order.
        items: Vec<CaseItem>,
    },
    /// A blocking or nonblocking assignment.
    Assign {
        /// The target.
        lhs: ExprId,
        /// The value.
        rhs: ExprId,
        /// `true` for `=`, `false` for `<=`.
        blocking: bool,
        /// Compound-assignment opcode, when written (`+=` etc.).
        op: Option<OpCode>,
    },
    /// `@(...) body`.
    EventControlled {
        /// Sensitivity expressions (edged items are unary posedge/negedge
        /// operations).
        events: Vec<ExprId>,
        /// The controlled statement.
        body: StmtId,
    },
    /// `#delay body`.
    Delayed {
        /// The delay expression.
        delay: ExprId,
        /// The delayed statement.
        body: StmtId,
    },
    /// A `for` loop.
    For {
        /// Loop initialization.
        init: Option<StmtId>,
        /// Loop condition.
        cond: Option<ExprId>,
        /// Loop step.
        step: Option<StmtId>,
        /// Loop body.
        body: StmtId,
    },
    /// A `foreach` loop.
    Foreach {
        /// The iterated array expression (with its loop variables).
        array: ExprId,
        /// Loop body.
        body: StmtId,
    },
    /// A `while` or `do..while` loop.
    While {
        /// Loop condition.
        cond: ExprId,
        /// Loop body.
        body: StmtId,
        /// `true` for `do..while`.
        do_while: bool,
    },
    /// A `repeat` loop.
    Repeat {
        /// Iteration count.
        count: ExprId,
        /// Loop body.
        body: StmtId,
    },
    /// A `forever` loop.
    Forever {
        /// Loop body.
        body: StmtId,
    },
    /// `wait (cond) body`.
    Wait {
        /// The wait condition.
        cond: ExprId,
        /// The continuation.
        body: StmtId,
    },
    /// `return [expr];`
    Return(Option<ExprId>),
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `;`
    Null,
    /// An expression statement (calls, increments).
    ExprStmt(ExprId),
    /// A block-local variable declaration.
    VarDecl {
        /// The variable name.
        name: Symbol,
        /// The declared typespec.
        typespec: Option<TypespecId>,
        /// The initializer, when written.
        init: Option<ExprId>,
    },
    /// A shape the compiler does not model.
    Unsupported,
}

/// A statement with its source location.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StmtNode {
    /// The statement.
    pub kind: StmtKind,
    /// Source location.
    pub loc: SourceLoc,
}

impl StmtNode {
    /// Wraps a kind with a location.
    pub fn new(kind: StmtKind, loc: SourceLoc) -> Self {
        Self { kind, loc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stmt_id_roundtrip() {
        let id = StmtId::from_raw(3);
        assert_eq!(id.as_raw(), 3);
    }

    #[test]
    fn serde_roundtrip() {
        let s = StmtNode::new(StmtKind::Break, SourceLoc::UNKNOWN);
        let json = serde_json::to_string(&s).unwrap();
        let back: StmtNode = serde_json::from_str(&json).unwrap();
        assert!(matches!(back.kind, StmtKind::Break));
    }
}
