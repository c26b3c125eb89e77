//! Expression compilation and constant folding.
//!
//! Translates AST subtrees into expression IR. In [`Reduce::Yes`] mode the
//! compiler folds constant subtrees into [`Value`]s; in [`Reduce::No`] mode
//! the result is purely structural. Shapes the compiler does not model
//! become `Unsupported` nodes rather than hard failures.

use crate::Ctx;
use std::collections::HashMap;
use veril_ast::{NodeId, NodeKind};
use veril_common::Symbol;
use veril_ir::{ExprId, ExprKind, ExprNode, OpCode, SourceLoc, Value, ValueKind};

/// Whether constant folding is performed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reduce {
    /// Fold constant subtrees into values.
    Yes,
    /// Build structural IR only.
    No,
}

/// Parameter/genvar bindings used during folding.
pub type ConstEnv = HashMap<Symbol, Value>;

/// Parses a plain decimal literal.
pub(crate) fn parse_int_literal(text: &str) -> Value {
    let clean = text.replace('_', "");
    match clean.parse::<i64>() {
        Ok(v) => Value::integer(v),
        Err(_) => Value::invalid(),
    }
}

/// Parses a based literal (`4'b1010`, `'hFF`, `8'sb1`).
///
/// The payload is unsigned in the written base with the written size;
/// widths over 64 bits keep their digit string instead of a word.
pub(crate) fn parse_based_literal(text: &str) -> Value {
    let clean = text.replace('_', "");
    let Some(tick) = clean.find('\'') else {
        return parse_int_literal(&clean);
    };
    let size: u16 = if tick == 0 {
        0
    } else {
        clean[..tick].parse().unwrap_or(0)
    };
    let mut rest = &clean[tick + 1..];
    let mut signed = false;
    if rest.starts_with(['s', 'S']) {
        signed = true;
        rest = &rest[1..];
    }
    let Some(base_char) = rest.chars().next() else {
        return Value::invalid();
    };
    let digits = &rest[1..];
    let (radix, make) = match base_char {
        'b' | 'B' => (2, ValueKind::Binary as fn(u64) -> ValueKind),
        'o' | 'O' => (8, ValueKind::Octal as fn(u64) -> ValueKind),
        'd' | 'D' => (10, ValueKind::Unsigned as fn(u64) -> ValueKind),
        'h' | 'H' => (16, ValueKind::Hex as fn(u64) -> ValueKind),
        _ => return Value::invalid(),
    };

    if size > 64 {
        let mut v = Value::string(digits);
        v.size = size;
        v.signed = signed;
        return v;
    }

    // x/z/? fold to zero for constant evaluation.
    let folded: String = digits
        .chars()
        .map(|c| match c {
            'x' | 'X' | 'z' | 'Z' | '?' => '0',
            other => other,
        })
        .collect();
    match u64::from_str_radix(&folded, radix) {
        Ok(v) => {
            let mut value = Value::unsigned(make(v), if size == 0 { 32 } else { size });
            value.signed = signed;
            value
        }
        Err(_) => Value::invalid(),
    }
}

impl Ctx<'_> {
    /// Compiles an AST expression subtree into expression IR.
    pub fn compile_expr(&mut self, node: NodeId, env: &ConstEnv, reduce: Reduce) -> ExprId {
        let v = self.fc.node(node);
        let loc = SourceLoc::of_node(v);

        if reduce == Reduce::Yes {
            let folded = self.eval_const(node, env);
            if folded.valid {
                return self.design.add_expr(ExprNode::new(ExprKind::Constant(folded), loc));
            }
        }

        let kind = match v.kind {
            NodeKind::IntLiteral => {
                ExprKind::Constant(parse_int_literal(self.symbols.lookup(v.symbol)))
            }
            NodeKind::BasedLiteral => {
                ExprKind::Constant(parse_based_literal(self.symbols.lookup(v.symbol)))
            }
            NodeKind::RealLiteral => {
                let text = self.symbols.lookup(v.symbol).replace('_', "");
                match text.parse::<f64>() {
                    Ok(d) => ExprKind::Constant(Value::double(d)),
                    Err(_) => ExprKind::Constant(Value::invalid()),
                }
            }
            NodeKind::StringLiteral => {
                let text = self.symbols.lookup(v.symbol);
                let inner = text.trim_matches('"').to_string();
                ExprKind::Constant(Value::string(inner))
            }
            NodeKind::UnbasedUnsized => {
                let text = self.symbols.lookup(v.symbol);
                match text {
                    "'0" => ExprKind::Constant(Value::scalar(false)),
                    "'1" => ExprKind::Constant(Value::scalar(true)),
                    other => ExprKind::Constant(Value::string(other.trim_start_matches('\''))),
                }
            }
            NodeKind::Identifier => ExprKind::Ref {
                name: v.symbol,
                actual: None,
            },
            NodeKind::PackageScope => {
                let package = v.symbol;
                let children = self.fc.children(node);
                match children.first() {
                    Some(&inner) if self.fc.node(inner).kind == NodeKind::Identifier => {
                        ExprKind::PackageRef {
                            package,
                            name: self.fc.node(inner).symbol,
                            actual: None,
                        }
                    }
                    Some(&inner) => {
                        // Scoped non-identifier (e.g. pkg::f(x)): keep the
                        // inner expression; the scope rides on the name.
                        let inner_id = self.compile_expr(inner, env, reduce);
                        return inner_id;
                    }
                    None => ExprKind::Unsupported,
                }
            }
            NodeKind::HierPath => {
                let segments = self
                    .fc
                    .children(node)
                    .into_iter()
                    .map(|c| self.compile_expr(c, env, Reduce::No))
                    .collect();
                ExprKind::HierPath {
                    segments,
                    actual: None,
                }
            }
            NodeKind::UnaryOp => {
                let text = self.symbols.lookup(v.symbol).to_string();
                let children = self.fc.children(node);
                let op = match text.as_str() {
                    "posedge" => Some(OpCode::Posedge),
                    "negedge" => Some(OpCode::Negedge),
                    "edge" => Some(OpCode::AnyEdge),
                    other => OpCode::unary_from_text(other),
                };
                match op {
                    Some(op) => {
                        let operands = children
                            .into_iter()
                            .map(|c| self.compile_expr(c, env, reduce))
                            .collect();
                        ExprKind::Operation { op, operands }
                    }
                    None => ExprKind::Unsupported,
                }
            }
            NodeKind::BinaryOp => {
                let text = self.symbols.lookup(v.symbol).to_string();
                let children = self.fc.children(node);
                match OpCode::from_text(&text) {
                    Some(op) => {
                        let operands = children
                            .into_iter()
                            .map(|c| self.compile_expr(c, env, reduce))
                            .collect();
                        ExprKind::Operation { op, operands }
                    }
                    None => ExprKind::Unsupported,
                }
            }
            NodeKind::TernaryOp => {
                let operands = self
                    .fc
                    .children(node)
                    .into_iter()
                    .map(|c| self.compile_expr(c, env, reduce))
                    .collect();
                ExprKind::Operation {
                    op: OpCode::Cond,
                    operands,
                }
            }
            NodeKind::Inside => {
                let operands = self
                    .fc
                    .children(node)
                    .into_iter()
                    .map(|c| self.compile_expr(c, env, Reduce::No))
                    .collect();
                ExprKind::Operation {
                    op: OpCode::Inside,
                    operands,
                }
            }
            NodeKind::SystemCall => {
                let args = self
                    .fc
                    .children(node)
                    .into_iter()
                    .map(|c| self.compile_expr(c, env, reduce))
                    .collect();
                ExprKind::SysCall {
                    name: v.symbol,
                    args,
                }
            }
            NodeKind::Call => {
                let children = self.fc.children(node);
                let mut name = v.symbol;
                let mut args = Vec::new();
                for (i, c) in children.iter().enumerate() {
                    if i == 0 {
                        let callee = self.fc.node(*c);
                        if callee.kind == NodeKind::Identifier {
                            name = callee.symbol;
                            continue;
                        }
                    }
                    args.push(self.compile_expr(*c, env, Reduce::No));
                }
                ExprKind::MethodCall {
                    receiver: None,
                    name,
                    args,
                    actual: None,
                }
            }
            NodeKind::MethodCall => {
                let children = self.fc.children(node);
                let receiver = children
                    .first()
                    .map(|&c| self.compile_expr(c, env, Reduce::No));
                let args = children
                    .into_iter()
                    .skip(1)
                    .map(|c| self.compile_expr(c, env, Reduce::No))
                    .collect();
                ExprKind::MethodCall {
                    receiver,
                    name: v.symbol,
                    args,
                    actual: None,
                }
            }
            NodeKind::BitSelect => {
                let children = self.fc.children(node);
                let base = self.compile_expr(children[0], env, Reduce::No);
                let index = self.compile_expr(children[1], env, reduce);
                ExprKind::BitSelect { base, index }
            }
            NodeKind::PartSelect => {
                let children = self.fc.children(node);
                let base = self.compile_expr(children[0], env, Reduce::No);
                let left = self.compile_expr(children[1], env, reduce);
                let right = self.compile_expr(children[2], env, reduce);
                let indexed = if v.symbol.is_bad() { None } else { Some(v.symbol) };
                ExprKind::PartSelect {
                    base,
                    left,
                    right,
                    indexed,
                }
            }
            NodeKind::Concat => {
                let parts = self
                    .fc
                    .children(node)
                    .into_iter()
                    .map(|c| self.compile_expr(c, env, Reduce::No))
                    .collect();
                ExprKind::Concat(parts)
            }
            NodeKind::Replication => {
                let parts = self
                    .fc
                    .children(node)
                    .into_iter()
                    .map(|c| self.compile_expr(c, env, Reduce::No))
                    .collect();
                ExprKind::Replication(parts)
            }
            NodeKind::AssignmentPattern => {
                let entries = self
                    .fc
                    .children(node)
                    .into_iter()
                    .map(|c| {
                        let child = self.fc.node(c);
                        if child.kind == NodeKind::TaggedPattern {
                            let key = child.symbol;
                            let value_node = self.fc.children(c).first().copied();
                            let value = value_node
                                .map(|vn| self.compile_expr(vn, env, Reduce::No))
                                .unwrap_or_else(|| self.unsupported_expr(loc));
                            (Some(key), value)
                        } else {
                            (None, self.compile_expr(c, env, Reduce::No))
                        }
                    })
                    .collect();
                ExprKind::AssignmentPattern(entries)
            }
            NodeKind::TaggedPattern => {
                let value = self
                    .fc
                    .children(node)
                    .first()
                    .map(|&c| self.compile_expr(c, env, Reduce::No));
                ExprKind::TaggedPattern {
                    tag: v.symbol,
                    value,
                }
            }
            NodeKind::Cast => {
                let children = self.fc.children(node);
                let operand = self.compile_expr(children[0], env, reduce);
                ExprKind::Cast {
                    ty: v.symbol,
                    operand,
                }
            }
            NodeKind::MinTypMax => {
                // Use the typical value.
                let children = self.fc.children(node);
                return self.compile_expr(children[1], env, reduce);
            }
            _ => ExprKind::Unsupported,
        };
        self.design.add_expr(ExprNode::new(kind, loc))
    }

    fn unsupported_expr(&mut self, loc: SourceLoc) -> ExprId {
        self.design.add_expr(ExprNode::new(ExprKind::Unsupported, loc))
    }

    /// Evaluates an AST expression to a compile-time constant.
    ///
    /// Returns the invalid value for anything that does not fold: unknown
    /// identifiers, hierarchical references, non-constant calls. Division
    /// and modulo by zero produce invalid values, never a panic.
    pub fn eval_const(&self, node: NodeId, env: &ConstEnv) -> Value {
        let v = self.fc.node(node);
        match v.kind {
            NodeKind::IntLiteral => parse_int_literal(self.symbols.lookup(v.symbol)),
            NodeKind::BasedLiteral => parse_based_literal(self.symbols.lookup(v.symbol)),
            NodeKind::RealLiteral => {
                let text = self.symbols.lookup(v.symbol).replace('_', "");
                text.parse::<f64>().map(Value::double).unwrap_or_else(|_| Value::invalid())
            }
            NodeKind::UnbasedUnsized => match self.symbols.lookup(v.symbol) {
                "'0" => Value::scalar(false),
                "'1" => Value::scalar(true),
                _ => Value::invalid(),
            },
            NodeKind::Identifier => env.get(&v.symbol).cloned().unwrap_or_else(Value::invalid),
            NodeKind::PackageScope => {
                // pkg::PARAM folds through the registered package.
                let children = self.fc.children(node);
                let Some(&inner) = children.first() else {
                    return Value::invalid();
                };
                let inner_node = self.fc.node(inner);
                if inner_node.kind != NodeKind::Identifier {
                    return Value::invalid();
                }
                let Some(pkg_id) = self.design.package(v.symbol) else {
                    return Value::invalid();
                };
                self.design
                    .component(pkg_id)
                    .value_of(inner_node.symbol)
                    .cloned()
                    .unwrap_or_else(Value::invalid)
            }
            NodeKind::UnaryOp => {
                let children = self.fc.children(node);
                let Some(&operand) = children.first() else {
                    return Value::invalid();
                };
                let text = self.symbols.lookup(v.symbol);
                self.eval_const(operand, env).unop(text)
            }
            NodeKind::BinaryOp => {
                let children = self.fc.children(node);
                if children.len() != 2 {
                    return Value::invalid();
                }
                let lhs = self.eval_const(children[0], env);
                let rhs = self.eval_const(children[1], env);
                let text = self.symbols.lookup(v.symbol);
                lhs.binop(text, &rhs)
            }
            NodeKind::TernaryOp => {
                let children = self.fc.children(node);
                if children.len() != 3 {
                    return Value::invalid();
                }
                let cond = self.eval_const(children[0], env);
                match cond.to_i64() {
                    Some(0) => self.eval_const(children[2], env),
                    Some(_) => self.eval_const(children[1], env),
                    None => Value::invalid(),
                }
            }
            NodeKind::SystemCall => {
                let name = self.symbols.lookup(v.symbol);
                let children = self.fc.children(node);
                match (name, children.as_slice()) {
                    ("$clog2", [arg]) => self.eval_const(*arg, env).clog2(),
                    ("$bits", [_arg]) => Value::invalid(),
                    _ => Value::invalid(),
                }
            }
            NodeKind::Cast => {
                let children = self.fc.children(node);
                match children.first() {
                    Some(&operand) => self.eval_const(operand, env),
                    None => Value::invalid(),
                }
            }
            NodeKind::MinTypMax => {
                let children = self.fc.children(node);
                match children.get(1) {
                    Some(&typ) => self.eval_const(typ, env),
                    None => Value::invalid(),
                }
            }
            _ => Value::invalid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literal_parsing() {
        assert_eq!(parse_int_literal("42").to_i64(), Some(42));
        assert_eq!(parse_int_literal("1_000").to_i64(), Some(1000));
        assert!(!parse_int_literal("abc").valid);
    }

    #[test]
    fn based_literal_parsing() {
        let v = parse_based_literal("4'b1010");
        assert_eq!(v.to_i64(), Some(10));
        assert_eq!(v.size, 4);
        assert!(matches!(v.kind, ValueKind::Binary(10)));

        let v = parse_based_literal("16'hFF");
        assert_eq!(v.to_i64(), Some(255));
        assert!(matches!(v.kind, ValueKind::Hex(255)));

        let v = parse_based_literal("8'o77");
        assert_eq!(v.to_i64(), Some(63));

        let v = parse_based_literal("32'd255");
        assert_eq!(v.to_i64(), Some(255));
    }

    #[test]
    fn unsized_based_literal_defaults_to_32_bits() {
        let v = parse_based_literal("'hFF");
        assert_eq!(v.size, 32);
        assert_eq!(v.to_i64(), Some(255));
    }

    #[test]
    fn signed_based_literal() {
        let v = parse_based_literal("8'sb1");
        assert!(v.signed);
        assert_eq!(v.to_i64(), Some(1));
    }

    #[test]
    fn x_and_z_digits_fold_to_zero() {
        let v = parse_based_literal("4'b1x0z");
        assert_eq!(v.to_i64(), Some(0b1000));
    }

    #[test]
    fn wide_literal_carries_digit_string() {
        let v = parse_based_literal("128'hDEADBEEFDEADBEEFDEADBEEFDEADBEEF");
        assert_eq!(v.size, 128);
        assert!(matches!(v.kind, ValueKind::String(_)));
        assert!(v.valid);
    }
}
