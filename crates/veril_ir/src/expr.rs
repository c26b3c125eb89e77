//! Expression IR.
//!
//! Expressions are recursive trees stored in the design's expression arena.
//! References start out unresolved (`actual` empty) and are bound late by
//! the symbol resolver; after elaboration every surviving `Ref` either has
//! an `actual` or a logged diagnostic.

use crate::ids::{ComponentId, ExprId, TypespecId};
use crate::loc::SourceLoc;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use veril_common::Symbol;

/// Operation opcodes, mirroring the SystemVerilog operator set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum OpCode {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Plus,
    Minus,
    // Shifts
    Shl,
    Shr,
    AShl,
    AShr,
    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    CaseEq,
    CaseNe,
    WildEq,
    WildNe,
    // Logical
    LAnd,
    LOr,
    LNot,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitXnor,
    BitNot,
    // Reductions
    RedAnd,
    RedNand,
    RedOr,
    RedNor,
    RedXor,
    RedXnor,
    // Increment / decrement
    Incr,
    Decr,
    // Conditional and membership
    Cond,
    Inside,
    Match,
    // Event-control edges
    Posedge,
    Negedge,
    AnyEdge,
    // Assignment operators
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    AShlAssign,
    AShrAssign,
}

impl OpCode {
    /// Maps an operator's source text to its opcode.
    pub fn from_text(text: &str) -> Option<OpCode> {
        let op = match text {
            "+" => OpCode::Add,
            "-" => OpCode::Sub,
            "*" => OpCode::Mul,
            "/" => OpCode::Div,
            "%" => OpCode::Mod,
            "**" => OpCode::Pow,
            "<<" => OpCode::Shl,
            ">>" => OpCode::Shr,
            "<<<" => OpCode::AShl,
            ">>>" => OpCode::AShr,
            "<" => OpCode::Lt,
            "<=" => OpCode::Le,
            ">" => OpCode::Gt,
            ">=" => OpCode::Ge,
            "==" => OpCode::Eq,
            "!=" => OpCode::Ne,
            "===" => OpCode::CaseEq,
            "!==" => OpCode::CaseNe,
            "==?" => OpCode::WildEq,
            "!=?" => OpCode::WildNe,
            "&&" => OpCode::LAnd,
            "||" => OpCode::LOr,
            "!" => OpCode::LNot,
            "&" => OpCode::BitAnd,
            "|" => OpCode::BitOr,
            "^" => OpCode::BitXor,
            "~^" | "^~" => OpCode::BitXnor,
            "~" => OpCode::BitNot,
            "~&" => OpCode::RedNand,
            "~|" => OpCode::RedNor,
            "++" => OpCode::Incr,
            "--" => OpCode::Decr,
            "+=" => OpCode::AddAssign,
            "-=" => OpCode::SubAssign,
            "*=" => OpCode::MulAssign,
            "/=" => OpCode::DivAssign,
            "%=" => OpCode::ModAssign,
            "&=" => OpCode::AndAssign,
            "|=" => OpCode::OrAssign,
            "^=" => OpCode::XorAssign,
            "<<=" => OpCode::ShlAssign,
            ">>=" => OpCode::ShrAssign,
            "<<<=" => OpCode::AShlAssign,
            ">>>=" => OpCode::AShrAssign,
            _ => return None,
        };
        Some(op)
    }

    /// The unary-context opcode for an operator that is also binary
    /// (`&a` is a reduction, `a & b` is bitwise).
    pub fn unary_from_text(text: &str) -> Option<OpCode> {
        let op = match text {
            "+" => OpCode::Plus,
            "-" => OpCode::Minus,
            "!" => OpCode::LNot,
            "~" => OpCode::BitNot,
            "&" => OpCode::RedAnd,
            "~&" => OpCode::RedNand,
            "|" => OpCode::RedOr,
            "~|" => OpCode::RedNor,
            "^" => OpCode::RedXor,
            "~^" | "^~" => OpCode::RedXnor,
            "++" => OpCode::Incr,
            "--" => OpCode::Decr,
            _ => return None,
        };
        Some(op)
    }

    /// The folding operator text used by [`Value::binop`](crate::Value).
    pub fn fold_text(self) -> Option<&'static str> {
        let s = match self {
            OpCode::Add => "+",
            OpCode::Sub => "-",
            OpCode::Mul => "*",
            OpCode::Div => "/",
            OpCode::Mod => "%",
            OpCode::Pow => "**",
            OpCode::Shl => "<<",
            OpCode::Shr => ">>",
            OpCode::AShl => "<<<",
            OpCode::AShr => ">>>",
            OpCode::Lt => "<",
            OpCode::Le => "<=",
            OpCode::Gt => ">",
            OpCode::Ge => ">=",
            OpCode::Eq => "==",
            OpCode::Ne => "!=",
            OpCode::CaseEq => "===",
            OpCode::CaseNe => "!==",
            OpCode::WildEq => "==?",
            OpCode::WildNe => "!=?",
            OpCode::LAnd => "&&",
            OpCode::LOr => "||",
            OpCode::BitAnd => "&",
            OpCode::BitOr => "|",
            OpCode::BitXor => "^",
            OpCode::BitXnor => "~^",
            _ => return None,
        };
        Some(s)
    }
}

/// What a reference resolved to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum RefTarget {
    /// A design component (module, package, interface, class, ...).
    Component(ComponentId),
    /// Port or net `index` within a component's signal list.
    SignalIn(ComponentId, u32),
    /// Parameter `index` within a component.
    ParamIn(ComponentId, u32),
    /// Task/function `index` within a component.
    TfIn(ComponentId, u32),
    /// A typespec (typedef target, enum, struct).
    Typespec(TypespecId),
    /// Member `index` of an enum typespec.
    EnumMember(TypespecId, u32),
    /// A local of the enclosing task/function/block, identified by name
    /// only (locals are not materialized as IR objects).
    Local(Symbol),
}

/// One expression tree node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ExprKind {
    /// A folded constant.
    Constant(Value),
    /// An unresolved (then late-bound) reference by name.
    Ref {
        /// The name as written.
        name: Symbol,
        /// The resolution, filled by the binder.
        actual: Option<RefTarget>,
    },
    /// A package-qualified reference (`pkg::name`).
    PackageRef {
        /// The package name.
        package: Symbol,
        /// The member name.
        name: Symbol,
        /// The resolution, filled by the binder.
        actual: Option<RefTarget>,
    },
    /// An operation over operand expressions.
    Operation {
        /// The opcode.
        op: OpCode,
        /// Operands, left to right.
        operands: Vec<ExprId>,
    },
    /// A function or method call.
    MethodCall {
        /// Receiver expression for method calls; `None` for plain calls.
        receiver: Option<ExprId>,
        /// The callee name.
        name: Symbol,
        /// Argument expressions.
        args: Vec<ExprId>,
        /// The resolution, filled by the binder.
        actual: Option<RefTarget>,
    },
    /// A `$system` call.
    SysCall {
        /// The system function name (with `$`).
        name: Symbol,
        /// Argument expressions.
        args: Vec<ExprId>,
    },
    /// A bit-select (`a[i]`).
    BitSelect {
        /// The base expression.
        base: ExprId,
        /// The index expression.
        index: ExprId,
    },
    /// A part-select (`a[h:l]`, `a[b +: w]`, `a[b -: w]`).
    PartSelect {
        /// The base expression.
        base: ExprId,
        /// Left/base bound.
        left: ExprId,
        /// Right/width bound.
        right: ExprId,
        /// `+:`/`-:` when indexed, `None` for a constant range.
        indexed: Option<Symbol>,
    },
    /// A hierarchical path (`a.b.c`), resolved segment by segment.
    HierPath {
        /// Path segments, outermost first.
        segments: Vec<ExprId>,
        /// The resolution of the full path, filled by the binder.
        actual: Option<RefTarget>,
    },
    /// A concatenation.
    Concat(Vec<ExprId>),
    /// A replication (`{n{...}}`); the count is the first element.
    Replication(Vec<ExprId>),
    /// An assignment pattern (`'{...}`) with optional member keys.
    AssignmentPattern(Vec<(Option<Symbol>, ExprId)>),
    /// A tagged union pattern.
    TaggedPattern {
        /// The tag name.
        tag: Symbol,
        /// The payload, when present.
        value: Option<ExprId>,
    },
    /// A cast (`type'(expr)`).
    Cast {
        /// The target type name.
        ty: Symbol,
        /// The operand.
        operand: ExprId,
    },
    /// A shape the compiler does not model; traversable but opaque.
    Unsupported,
}

/// An expression node with its source location.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExprNode {
    /// The expression tree node.
    pub kind: ExprKind,
    /// Source location.
    pub loc: SourceLoc,
}

impl ExprNode {
    /// Wraps a kind with a location.
    pub fn new(kind: ExprKind, loc: SourceLoc) -> Self {
        Self { kind, loc }
    }

    /// The `actual` resolution slot, if this node is a reference kind.
    pub fn actual(&self) -> Option<&Option<RefTarget>> {
        match &self.kind {
            ExprKind::Ref { actual, .. }
            | ExprKind::PackageRef { actual, .. }
            | ExprKind::HierPath { actual, .. }
            | ExprKind::MethodCall { actual, .. } => Some(actual),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_from_text_covers_operator_set() {
        assert_eq!(OpCode::from_text("+"), Some(OpCode::Add));
        assert_eq!(OpCode::from_text("**"), Some(OpCode::Pow));
        assert_eq!(OpCode::from_text("<<<"), Some(OpCode::AShl));
        assert_eq!(OpCode::from_text("==?"), Some(OpCode::WildEq));
        assert_eq!(OpCode::from_text("==="), Some(OpCode::CaseEq));
        assert_eq!(OpCode::from_text("+="), Some(OpCode::AddAssign));
        assert_eq!(OpCode::from_text(">>>="), Some(OpCode::AShrAssign));
        assert_eq!(OpCode::from_text("not_an_op"), None);
    }

    #[test]
    fn unary_context_differs_from_binary() {
        assert_eq!(OpCode::unary_from_text("&"), Some(OpCode::RedAnd));
        assert_eq!(OpCode::from_text("&"), Some(OpCode::BitAnd));
        assert_eq!(OpCode::unary_from_text("-"), Some(OpCode::Minus));
        assert_eq!(OpCode::from_text("-"), Some(OpCode::Sub));
    }

    #[test]
    fn fold_text_roundtrip_for_foldable_ops() {
        for op in [OpCode::Add, OpCode::Div, OpCode::WildEq, OpCode::AShr] {
            let text = op.fold_text().unwrap();
            assert_eq!(OpCode::from_text(text), Some(op));
        }
        assert!(OpCode::Cond.fold_text().is_none());
    }

    #[test]
    fn actual_slot_only_on_reference_kinds() {
        let loc = SourceLoc::UNKNOWN;
        let r = ExprNode::new(
            ExprKind::Ref {
                name: Symbol::from_raw(1),
                actual: None,
            },
            loc,
        );
        assert!(r.actual().is_some());

        let c = ExprNode::new(ExprKind::Constant(Value::integer(1)), loc);
        assert!(c.actual().is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let node = ExprNode::new(
            ExprKind::Operation {
                op: OpCode::Add,
                operands: vec![ExprId::from_raw(0), ExprId::from_raw(1)],
            },
            SourceLoc::UNKNOWN,
        );
        let json = serde_json::to_string(&node).unwrap();
        let back: ExprNode = serde_json::from_str(&json).unwrap();
        assert!(matches!(back.kind, ExprKind::Operation { .. }));
    }
}
