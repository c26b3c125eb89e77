//! Typespec compilation.
//!
//! Turns `DataType` AST subtrees into structural [`Typespec`] IR. Packed
//! dimensions are kept both as expressions and as folded bounds so that
//! elaboration can re-fold them under parameter overrides.

use crate::expr::{ConstEnv, Reduce};
use crate::Ctx;
use veril_ast::{NodeId, NodeKind};
use veril_common::Symbol;
use veril_ir::{Range, SourceLoc, Typespec, TypespecId, TypespecKind};

impl Ctx<'_> {
    /// Compiles a `DataType` node into a typespec.
    ///
    /// `env` supplies parameter values for folding packed ranges. The
    /// resulting typespec's `instance` is the current component for
    /// non-primitive kinds and `None` for built-ins.
    pub fn compile_data_type(&mut self, node: NodeId, env: &ConstEnv) -> TypespecId {
        let v = self.fc.node(node);
        let loc = SourceLoc::of_node(v);
        debug_assert_eq!(v.kind, NodeKind::DataType);

        let signed = self.has_signing(node, "signed");
        let ranges = self.compile_packed_ranges(node, env);

        // Inline enum/struct/union bodies.
        if let Some(enum_node) = self.fc.child_of_kind(node, NodeKind::EnumType) {
            let kind = self.compile_enum(enum_node, env);
            return self.scoped_typespec(kind, loc);
        }
        if let Some(s) = self.fc.child_of_kind(node, NodeKind::StructType) {
            let kind = self.compile_struct_or_union(s, env, false);
            return self.scoped_typespec(kind, loc);
        }
        if let Some(u) = self.fc.child_of_kind(node, NodeKind::UnionType) {
            let kind = self.compile_struct_or_union(u, env, true);
            return self.scoped_typespec(kind, loc);
        }

        // Package-scoped named type. The instance starts as the using
        // scope; the binder rewrites it to the declaring package.
        if let Some(scope) = self.fc.child_of_kind(node, NodeKind::PackageScope) {
            let package = self.fc.node(scope).symbol;
            let kind = TypespecKind::ImportRef {
                package,
                name: v.symbol,
                target: None,
            };
            return self.scoped_typespec(kind, loc);
        }

        let name_text = self.symbols.lookup(v.symbol).to_string();
        let kind = match name_text.as_str() {
            "" => TypespecKind::Logic { signed, ranges },
            "logic" | "reg" | "wire" | "tri" | "tri0" | "tri1" | "wand" | "wor" | "trireg"
            | "uwire" | "supply0" | "supply1" => TypespecKind::Logic { signed, ranges },
            "bit" => TypespecKind::BitVec { signed, ranges },
            "byte" | "shortint" | "int" | "longint" | "integer" => TypespecKind::IntVariant {
                keyword: v.symbol,
                signed: !self.has_signing(node, "unsigned"),
            },
            "time" => TypespecKind::IntVariant {
                keyword: v.symbol,
                signed: false,
            },
            "real" | "shortreal" | "realtime" => TypespecKind::Real,
            "string" => TypespecKind::StringType,
            "chandle" => TypespecKind::Chandle,
            "void" => TypespecKind::Void,
            "event" => TypespecKind::Unsupported,
            _ => TypespecKind::TypedefAlias {
                name: v.symbol,
                target: None,
            },
        };

        // Vector types stay primitive; a typedef alias starts scoped to the
        // using component and is rewritten by the binder to the declaring
        // scope once resolved.
        match &kind {
            TypespecKind::TypedefAlias { .. } => self.scoped_typespec(kind, loc),
            _ => {
                let ts = Typespec {
                    kind,
                    instance: None,
                    loc,
                };
                self.design.add_typespec(ts)
            }
        }
    }

    /// Allocates a typespec whose declaring scope is the current component.
    fn scoped_typespec(&mut self, kind: TypespecKind, loc: SourceLoc) -> TypespecId {
        let comp = self.comp;
        self.scoped_typespec_with(kind, loc, Some(comp))
    }

    fn scoped_typespec_with(
        &mut self,
        kind: TypespecKind,
        loc: SourceLoc,
        instance: Option<veril_ir::ComponentId>,
    ) -> TypespecId {
        self.design.add_typespec(Typespec {
            kind,
            instance,
            loc,
        })
    }

    fn has_signing(&self, node: NodeId, which: &str) -> bool {
        self.fc
            .children_of_kind(node, NodeKind::Signing)
            .into_iter()
            .any(|s| self.symbols.lookup(self.fc.node(s).symbol) == which)
    }

    /// Compiles the `PackedDimension` children of a data type.
    pub(crate) fn compile_packed_ranges(&mut self, node: NodeId, env: &ConstEnv) -> Vec<Range> {
        self.fc
            .children_of_kind(node, NodeKind::PackedDimension)
            .into_iter()
            .map(|d| self.compile_range(d, env))
            .collect()
    }

    /// Compiles one dimension node into a [`Range`].
    ///
    /// `[msb:lsb]` keeps both bounds; a size dimension `[n]` is normalized
    /// to `[n-1:0]` in the folded view.
    pub(crate) fn compile_range(&mut self, dim: NodeId, env: &ConstEnv) -> Range {
        let children = self.fc.children(dim);
        match children.as_slice() {
            [left, right] => {
                let l_val = self.eval_const(*left, env);
                let r_val = self.eval_const(*right, env);
                let folded = match (l_val.to_i64(), r_val.to_i64()) {
                    (Some(l), Some(r)) => Some((l, r)),
                    _ => None,
                };
                let left_id = self.compile_expr(*left, env, Reduce::No);
                let right_id = self.compile_expr(*right, env, Reduce::No);
                Range {
                    left: left_id,
                    right: right_id,
                    folded,
                }
            }
            [size] => {
                let folded = self.eval_const(*size, env).to_i64().map(|n| (n - 1, 0));
                let e = self.compile_expr(*size, env, Reduce::No);
                Range {
                    left: e,
                    right: e,
                    folded,
                }
            }
            _ => {
                let loc = SourceLoc::of_node(self.fc.node(dim));
                let e = self
                    .design
                    .add_expr(veril_ir::ExprNode::new(veril_ir::ExprKind::Unsupported, loc));
                Range {
                    left: e,
                    right: e,
                    folded: None,
                }
            }
        }
    }

    fn compile_enum(&mut self, enum_node: NodeId, env: &ConstEnv) -> TypespecKind {
        let base = self
            .fc
            .child_of_kind(enum_node, NodeKind::DataType)
            .map(|b| self.compile_data_type(b, env));
        let members = self
            .fc
            .children_of_kind(enum_node, NodeKind::EnumMember)
            .into_iter()
            .map(|m| {
                let name = self.fc.node(m).symbol;
                let value = self
                    .fc
                    .children(m)
                    .first()
                    .map(|&e| self.compile_expr(e, env, Reduce::Yes));
                (name, value)
            })
            .collect();
        TypespecKind::Enum { base, members }
    }

    fn compile_struct_or_union(
        &mut self,
        node: NodeId,
        env: &ConstEnv,
        is_union: bool,
    ) -> TypespecKind {
        let packed = self.has_signing(node, "packed");
        let mut members = Vec::new();
        for m in self.fc.children_of_kind(node, NodeKind::StructMember) {
            let Some(ty_node) = self.fc.child_of_kind(m, NodeKind::DataType) else {
                continue;
            };
            let ts = self.compile_data_type(ty_node, env);
            for d in self.fc.children_of_kind(m, NodeKind::Declarator) {
                members.push((self.fc.node(d).symbol, ts));
            }
        }
        if is_union {
            TypespecKind::Union { packed, members }
        } else {
            TypespecKind::Struct { packed, members }
        }
    }

    /// Resolves the vector range a typespec reports, re-folding its range
    /// expressions under `env` when the stored fold is absent or stale.
    pub fn refold_vector_range(&self, ts: TypespecId, env: &ConstEnv) -> Option<(i64, i64)> {
        let spec = self.design.typespecs.get(ts);
        let range = match &spec.kind {
            TypespecKind::Logic { ranges, .. } | TypespecKind::BitVec { ranges, .. } => {
                ranges.first()?
            }
            TypespecKind::PackedArray { range, .. } => range,
            _ => return None,
        };
        let left = self.eval_expr_ir(range.left, env)?;
        let right = self.eval_expr_ir(range.right, env)?;
        Some((left, right))
    }

    /// Folds an already-compiled expression IR node under `env`.
    pub fn eval_expr_ir(&self, expr: veril_ir::ExprId, env: &ConstEnv) -> Option<i64> {
        use veril_ir::ExprKind as EK;
        let node = self.design.exprs.get(expr);
        match &node.kind {
            EK::Constant(v) => v.to_i64(),
            EK::Ref { name, .. } => env.get(name).and_then(|v| v.to_i64()),
            EK::PackageRef { package, name, .. } => {
                let pkg = self.design.package(*package)?;
                self.design.component(pkg).value_of(*name)?.to_i64()
            }
            EK::Operation { op, operands } => {
                let text = op.fold_text()?;
                match operands.as_slice() {
                    [lhs, rhs] => {
                        let l = veril_ir::Value::integer(self.eval_expr_ir(*lhs, env)?);
                        let r = veril_ir::Value::integer(self.eval_expr_ir(*rhs, env)?);
                        l.binop(text, &r).to_i64()
                    }
                    [only] => {
                        let v = veril_ir::Value::integer(self.eval_expr_ir(*only, env)?);
                        v.unop(text).to_i64()
                    }
                    _ => None,
                }
            }
            EK::SysCall { name, args } => {
                let text = self.symbols.lookup(*name);
                if text == "$clog2" {
                    let arg = self.eval_expr_ir(*args.first()?, env)?;
                    veril_ir::Value::integer(arg).clog2().to_i64()
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
