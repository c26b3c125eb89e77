//! Statement compilation.
//!
//! Lowers process and task/function bodies into statement IR. Expression
//! operands go through the expression compiler in structural mode; constant
//! folding inside statements is left to consumers.

use crate::expr::{ConstEnv, Reduce};
use crate::Ctx;
use veril_ast::{NodeId, NodeKind};
use veril_common::Symbol;
use veril_ir::{CaseItem, OpCode, SourceLoc, StmtId, StmtKind, StmtNode};

fn is_expr_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Identifier
            | NodeKind::HierPath
            | NodeKind::PackageScope
            | NodeKind::UnaryOp
            | NodeKind::BinaryOp
            | NodeKind::TernaryOp
            | NodeKind::Call
            | NodeKind::SystemCall
            | NodeKind::MethodCall
            | NodeKind::BitSelect
            | NodeKind::PartSelect
            | NodeKind::Concat
            | NodeKind::Cast
    )
}

impl Ctx<'_> {
    /// Compiles a statement subtree into statement IR.
    pub fn compile_stmt(&mut self, node: NodeId, env: &ConstEnv) -> StmtId {
        let v = self.fc.node(node);
        let loc = SourceLoc::of_node(v);
        let children = self.fc.children(node);

        let kind = match v.kind {
            NodeKind::SeqBlock | NodeKind::ParBlock => {
                let stmts = children
                    .into_iter()
                    .map(|c| self.compile_stmt(c, env))
                    .collect();
                StmtKind::Block {
                    label: if v.symbol.is_bad() { None } else { Some(v.symbol) },
                    stmts,
                    parallel: v.kind == NodeKind::ParBlock,
                }
            }
            NodeKind::IfStmt => {
                let cond = self.compile_expr(children[0], env, Reduce::No);
                let then_stmt = self.compile_stmt(children[1], env);
                let else_stmt = children.get(2).map(|&c| self.compile_stmt(c, env));
                StmtKind::If {
                    qualifier: if v.symbol.is_bad() { None } else { Some(v.symbol) },
                    cond,
                    then_stmt,
                    else_stmt,
                }
            }
            NodeKind::CaseStmt => {
                let scrutinee = self.compile_expr(children[0], env, Reduce::No);
                let mut items = Vec::new();
                for &item in &children[1..] {
                    if self.fc.node(item).kind != NodeKind::CaseItem {
                        continue;
                    }
                    let item_children = self.fc.children(item);
                    let (exprs, body) = match item_children.split_last() {
                        Some((&body, exprs)) => (
                            exprs
                                .iter()
                                .map(|&e| self.compile_expr(e, env, Reduce::No))
                                .collect::<Vec<_>>(),
                            self.compile_stmt(body, env),
                        ),
                        None => continue,
                    };
                    let is_default = exprs.is_empty();
                    items.push(CaseItem {
                        exprs,
                        body,
                        is_default,
                    });
                }
                StmtKind::Case {
                    keyword: v.symbol,
                    scrutinee,
                    items,
                }
            }
            NodeKind::BlockingAssign | NodeKind::NonblockingAssign => {
                let blocking = v.kind == NodeKind::BlockingAssign;
                let op = if v.symbol.is_bad() {
                    None
                } else {
                    OpCode::from_text(self.symbols.lookup(v.symbol))
                };
                // Children: lhs, [timing control], rhs.
                let lhs = self.compile_expr(children[0], env, Reduce::No);
                let rhs = self.compile_expr(*children.last().unwrap(), env, Reduce::No);
                StmtKind::Assign {
                    lhs,
                    rhs,
                    blocking,
                    op,
                }
            }
            NodeKind::EventControl => {
                let (body_node, event_nodes) = match children.split_last() {
                    Some((&b, evs)) => (b, evs.to_vec()),
                    None => {
                        return self
                            .design
                            .add_stmt(StmtNode::new(StmtKind::Unsupported, loc))
                    }
                };
                let events = event_nodes
                    .into_iter()
                    .map(|e| self.compile_expr(e, env, Reduce::No))
                    .collect();
                let body = self.compile_stmt(body_node, env);
                StmtKind::EventControlled { events, body }
            }
            NodeKind::DelayControl => {
                // Either `#d stmt` (delay node + body) or a bare delay value.
                match children.as_slice() {
                    [delay, body] => {
                        let d = self.compile_expr_or_delay(*delay, env);
                        let b = self.compile_stmt(*body, env);
                        StmtKind::Delayed { delay: d, body: b }
                    }
                    [only] => {
                        let d = self.compile_expr(*only, env, Reduce::No);
                        StmtKind::ExprStmt(d)
                    }
                    _ => StmtKind::Unsupported,
                }
            }
            NodeKind::ForStmt => {
                let init = Some(self.compile_stmt(children[0], env));
                let cond = Some(self.compile_expr(children[1], env, Reduce::No));
                let step = Some(self.compile_stmt(children[2], env));
                let body = self.compile_stmt(children[3], env);
                StmtKind::For {
                    init,
                    cond,
                    step,
                    body,
                }
            }
            NodeKind::ForeachStmt => {
                let array = self.compile_expr(children[0], env, Reduce::No);
                let body = self.compile_stmt(children[1], env);
                StmtKind::Foreach { array, body }
            }
            NodeKind::WhileStmt => {
                let do_while = self.symbols.lookup(v.symbol) == "do";
                let (cond, body) = if do_while {
                    (
                        self.compile_expr(children[1], env, Reduce::No),
                        self.compile_stmt(children[0], env),
                    )
                } else {
                    (
                        self.compile_expr(children[0], env, Reduce::No),
                        self.compile_stmt(children[1], env),
                    )
                };
                StmtKind::While {
                    cond,
                    body,
                    do_while,
                }
            }
            NodeKind::RepeatStmt => {
                let count = self.compile_expr(children[0], env, Reduce::No);
                let body = self.compile_stmt(children[1], env);
                StmtKind::Repeat { count, body }
            }
            NodeKind::ForeverStmt => {
                let body = self.compile_stmt(children[0], env);
                StmtKind::Forever { body }
            }
            NodeKind::WaitStmt => {
                let cond = self.compile_expr(children[0], env, Reduce::No);
                let body = self.compile_stmt(children[1], env);
                StmtKind::Wait { cond, body }
            }
            NodeKind::ReturnStmt => {
                let value = children
                    .first()
                    .map(|&c| self.compile_expr(c, env, Reduce::No));
                StmtKind::Return(value)
            }
            NodeKind::BreakStmt => StmtKind::Break,
            NodeKind::ContinueStmt => StmtKind::Continue,
            NodeKind::NullStmt => StmtKind::Null,
            NodeKind::ExprStmt => match children.first() {
                Some(&e) => StmtKind::ExprStmt(self.compile_expr(e, env, Reduce::No)),
                None => StmtKind::Null,
            },
            NodeKind::NetDecl | NodeKind::VarDecl => {
                // Block-local declaration: one VarDecl per declarator,
                // wrapped in a block when several names share the type.
                let ty = self
                    .fc
                    .child_of_kind(node, NodeKind::DataType)
                    .map(|t| self.compile_data_type(t, env));
                let mut decls = Vec::new();
                for d in self.fc.children_of_kind(node, NodeKind::Declarator) {
                    let dn = self.fc.node(d);
                    let init = self
                        .fc
                        .children(d)
                        .into_iter()
                        .find(|&c| !matches!(self.fc.node(c).kind, NodeKind::UnpackedDimension))
                        .map(|c| self.compile_expr(c, env, Reduce::No));
                    let dloc = SourceLoc::of_node(dn);
                    decls.push(self.design.add_stmt(StmtNode::new(
                        StmtKind::VarDecl {
                            name: dn.symbol,
                            typespec: ty,
                            init,
                        },
                        dloc,
                    )));
                }
                match decls.len() {
                    1 => return decls[0],
                    _ => StmtKind::Block {
                        label: None,
                        stmts: decls,
                        parallel: false,
                    },
                }
            }
            NodeKind::Typedef | NodeKind::Assertion => StmtKind::Unsupported,
            // A bare expression in statement position (for-steps like
            // `i++`, task calls captured as expressions).
            k if is_expr_kind(k) => {
                StmtKind::ExprStmt(self.compile_expr(node, env, Reduce::No))
            }
            _ => StmtKind::Unsupported,
        };
        self.design.add_stmt(StmtNode::new(kind, loc))
    }

    /// A delay node's payload expression (the delay value).
    fn compile_expr_or_delay(&mut self, node: NodeId, env: &ConstEnv) -> veril_ir::ExprId {
        let v = self.fc.node(node);
        if v.kind == NodeKind::DelayControl {
            if let Some(&inner) = self.fc.children(node).first() {
                return self.compile_expr(inner, env, Reduce::No);
            }
        }
        self.compile_expr(node, env, Reduce::No)
    }
}
