//! The elaboration engine.
//!
//! Instantiates the design from the top modules down: top detection via
//! the component instantiation graph, parameter override propagation on
//! component *clones* (the unelaborated definition keeps its defaults),
//! generate expansion into concrete `GenScope` children, and interface
//! port binding. Elaboration is single-threaded and produces children in
//! deterministic order.

use crate::bind;
use crate::errors;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction as GraphDirection;
use std::collections::HashMap;
use veril_ast::{FileContent, NodeId, NodeKind};
use veril_common::{Symbol, SymbolTable};
use veril_compile::{ConstEnv, Ctx};
use veril_diagnostics::DiagnosticSink;
use veril_ir::{
    Component, ComponentId, ComponentKind, Design, InstanceId, InstanceKind, ModuleInstance,
    SourceLoc, SubInstance, Typespec, TypespecKind, Value, ValuePool,
};
use veril_preproc::CompilationUnit;
use veril_source::{FileId, SourceDb};

/// Upper bound on generate-for iterations, to keep a bad bound from
/// spinning the elaborator.
const MAX_GEN_ITERATIONS: i64 = 1 << 16;

/// Everything elaboration reads besides the design itself.
pub struct ElabInputs<'a> {
    /// Parsed files by file ID, for generate re-compilation.
    pub files: &'a HashMap<FileId, FileContent>,
    /// The session symbol table.
    pub symbols: &'a SymbolTable,
    /// The source database.
    pub source_db: &'a SourceDb,
    /// The compilation unit.
    pub unit: &'a CompilationUnit,
    /// The diagnostic sink.
    pub sink: &'a DiagnosticSink,
    /// Explicit top modules; empty means compute from the instantiation
    /// graph.
    pub tops: &'a [Symbol],
}

/// Elaborates the design in place: fills `design.instances`.
pub fn elaborate(design: &mut Design, inputs: &ElabInputs<'_>) {
    let tops = top_components(design, inputs);
    let mut elab = Elaborator {
        design,
        inputs,
        stack: Vec::new(),
        values: ValuePool::new(),
    };
    for top in tops {
        let def = elab.design.component(top);
        let (name, loc) = (def.name, def.loc);
        let param_values = default_param_values(elab.design, top);
        let inst = elab.design.instances.alloc(ModuleInstance {
            name,
            kind: InstanceKind::Module,
            definition: Some(top),
            parent: None,
            children: Vec::new(),
            param_values,
            typedef_overrides: Vec::new(),
            modport_bindings: Vec::new(),
            loc,
        });
        elab.design.instances.tops.push(inst);
        elab.expand(inst);
    }
}

/// Computes the top set: modules not instantiated by any other component.
///
/// With explicit tops configured, those names are looked up instead. The
/// result is sorted by name for deterministic elaboration order.
fn top_components(design: &Design, inputs: &ElabInputs<'_>) -> Vec<ComponentId> {
    if !inputs.tops.is_empty() {
        let mut out = Vec::new();
        for &name in inputs.tops {
            match design.lookup_any(name) {
                Some(id) => out.push(id),
                None => inputs.sink.emit(errors::error_undefined_type(
                    inputs.symbols.lookup(name),
                    veril_source::Span::DUMMY,
                )),
            }
        }
        return out;
    }

    let mut graph: DiGraph<ComponentId, ()> = DiGraph::new();
    let mut nodes: HashMap<ComponentId, NodeIndex> = HashMap::new();
    for (id, comp) in design.components() {
        if matches!(
            comp.kind,
            ComponentKind::Module
                | ComponentKind::Interface
                | ComponentKind::Program
                | ComponentKind::Udp
        ) {
            nodes.insert(id, graph.add_node(id));
        }
    }
    for (id, comp) in design.components() {
        let Some(&from) = nodes.get(&id) else { continue };
        for sub in &comp.sub_instances {
            if let Some(target) = design.lookup_any(sub.target_name) {
                if let Some(&to) = nodes.get(&target) {
                    graph.add_edge(from, to, ());
                }
            }
        }
    }

    let mut tops: Vec<ComponentId> = graph
        .node_indices()
        .filter(|&n| {
            graph
                .neighbors_directed(n, GraphDirection::Incoming)
                .next()
                .is_none()
        })
        .map(|n| graph[n])
        .filter(|&id| design.component(id).kind == ComponentKind::Module)
        .collect();
    tops.sort_by_key(|&id| inputs.symbols.lookup(design.component(id).name).to_string());
    tops
}

/// The default parameter environment of a definition.
fn default_param_values(design: &Design, comp: ComponentId) -> Vec<(Symbol, Value)> {
    design
        .component(comp)
        .params
        .iter()
        .filter_map(|p| p.value.clone().map(|v| (p.name, v)))
        .collect()
}

struct Elaborator<'a, 'i> {
    design: &'a mut Design,
    inputs: &'a ElabInputs<'i>,
    /// Component names currently being expanded, for cycle detection.
    stack: Vec<Symbol>,
    /// Factory for the short-lived values of generate iteration; slots are
    /// released when an iteration's environment has been built.
    values: ValuePool,
}

impl Elaborator<'_, '_> {
    fn env_of(&self, inst: InstanceId) -> ConstEnv {
        self.design
            .instances
            .get(inst)
            .param_values
            .iter()
            .cloned()
            .collect()
    }

    /// Expands one instance: generates first (they may add sub-instances
    /// through their scopes), then the definition's own sub-instances, then
    /// interface ports.
    fn expand(&mut self, inst: InstanceId) {
        let Some(def) = self.design.instances.get(inst).definition else {
            return;
        };
        let env = self.env_of(inst);

        let gen_constructs = self.design.component(def).gen_constructs.clone();
        let def_file = self.design.component(def).file;
        for node in gen_constructs {
            self.elaborate_generate(inst, def, def_file, node, &env);
        }

        let subs = self.design.component(def).sub_instances.clone();
        for sub in subs {
            self.expand_sub_instance(inst, def, &sub, &env);
        }

        self.bind_interface_ports(inst, def);
    }

    // ========================================================================
    // Sub-instances
    // ========================================================================

    fn expand_sub_instance(
        &mut self,
        parent: InstanceId,
        parent_def: ComponentId,
        sub: &SubInstance,
        env: &ConstEnv,
    ) {
        let span = veril_compile::errors::loc_span(sub.loc, self.inputs.source_db);
        let parent_lib = self.design.component(parent_def).library;
        let target = self
            .design
            .lookup(parent_lib, sub.target_name)
            .or_else(|| self.design.lookup_any(sub.target_name));

        let Some(target) = target else {
            self.inputs.sink.emit(errors::error_undefined_type(
                self.inputs.symbols.lookup(sub.target_name),
                span,
            ));
            self.design.instances.alloc(ModuleInstance {
                name: sub.instance_name,
                kind: InstanceKind::Unknown,
                definition: None,
                parent: Some(parent),
                children: Vec::new(),
                param_values: Vec::new(),
                typedef_overrides: Vec::new(),
                modport_bindings: Vec::new(),
                loc: sub.loc,
            });
            return;
        };

        let target_name = self.design.component(target).name;
        if self.stack.contains(&target_name) {
            self.inputs.sink.emit(errors::error_circular_instantiation(
                self.inputs.symbols.lookup(target_name),
                span,
            ));
            return;
        }

        // Fold overrides in the parent's parameter context.
        let (overrides, typedef_overrides) = self.fold_overrides(parent_def, target, sub, env);

        let kind = match self.design.component(target).kind {
            ComponentKind::Interface => InstanceKind::Interface,
            ComponentKind::Program => InstanceKind::Program,
            ComponentKind::Udp => InstanceKind::Udp,
            _ => InstanceKind::Module,
        };

        // Overrides are applied on a clone; the shared definition keeps
        // its original defaults.
        let definition = if overrides.is_empty() && typedef_overrides.is_empty() {
            target
        } else {
            let clone = self.design.clone_component(target);
            self.apply_overrides(clone, &overrides, &typedef_overrides);
            clone
        };

        let mut param_values = default_param_values(self.design, definition);
        for (name, value) in &overrides {
            match param_values.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = value.clone(),
                None => param_values.push((*name, value.clone())),
            }
        }

        let child = self.design.instances.alloc(ModuleInstance {
            name: sub.instance_name,
            kind,
            definition: Some(definition),
            parent: Some(parent),
            children: Vec::new(),
            param_values,
            typedef_overrides,
            modport_bindings: Vec::new(),
            loc: sub.loc,
        });

        self.stack.push(target_name);
        self.expand(child);
        self.stack.pop();
    }

    /// Folds parameter overrides: positional bindings match declaration
    /// order, named bindings match by identifier. Unknown names are
    /// diagnosed and skipped.
    fn fold_overrides(
        &mut self,
        parent_def: ComponentId,
        target: ComponentId,
        sub: &SubInstance,
        env: &ConstEnv,
    ) -> (Vec<(Symbol, Value)>, Vec<(Symbol, veril_ir::TypespecId)>) {
        let mut values = Vec::new();
        let mut typedefs = Vec::new();
        let span = veril_compile::errors::loc_span(sub.loc, self.inputs.source_db);

        // Non-local parameters, in declaration order, for positional binds.
        let positional: Vec<Symbol> = self
            .design
            .component(target)
            .params
            .iter()
            .filter(|p| !p.local)
            .map(|p| p.name)
            .collect();

        for (pos, (name, expr)) in sub.param_overrides.iter().enumerate() {
            let param_name = if name.is_bad() {
                match positional.get(pos) {
                    Some(&n) => n,
                    None => {
                        self.inputs.sink.emit(errors::error_unknown_param_binding(
                            &format!("positional binding #{}", pos + 1),
                            self.inputs.symbols.lookup(self.design.component(target).name),
                            span,
                        ));
                        continue;
                    }
                }
            } else {
                *name
            };

            let Some(param) = self.design.component(target).param(param_name).cloned() else {
                self.inputs.sink.emit(errors::error_unknown_param_binding(
                    self.inputs.symbols.lookup(param_name),
                    self.inputs.symbols.lookup(self.design.component(target).name),
                    span,
                ));
                continue;
            };

            if param.is_type {
                // Type parameters override typedef entries as well.
                if let Some(ts) = self.resolve_type_override(parent_def, *expr) {
                    typedefs.push((param_name, ts));
                }
                continue;
            }

            let folded = {
                let ctx = self.reader_ctx(parent_def);
                ctx.eval_expr_ir(*expr, env)
            };
            match folded {
                Some(v) => values.push((param_name, Value::integer(v))),
                None => {
                    self.inputs.sink.emit(errors::error_not_reducible(
                        &format!(
                            "override of parameter `{}`",
                            self.inputs.symbols.lookup(param_name)
                        ),
                        span,
                    ));
                }
            }
        }
        (values, typedefs)
    }

    /// Resolves a type-parameter override expression to a typespec.
    fn resolve_type_override(
        &mut self,
        parent_def: ComponentId,
        expr: veril_ir::ExprId,
    ) -> Option<veril_ir::TypespecId> {
        let name = match &self.design.exprs.get(expr).kind {
            veril_ir::ExprKind::Ref { name, .. } => *name,
            _ => return None,
        };
        // A typedef visible from the parent, or a builtin type name.
        if let Some(veril_ir::RefTarget::Typespec(ts)) =
            bind::resolve_for(self.design, parent_def, name)
        {
            return Some(ts);
        }
        let text = self.inputs.symbols.lookup(name).to_string();
        let kind = match text.as_str() {
            "int" | "byte" | "shortint" | "longint" | "integer" | "time" => {
                TypespecKind::IntVariant {
                    keyword: name,
                    signed: text != "time",
                }
            }
            "logic" | "reg" => TypespecKind::Logic {
                signed: false,
                ranges: Vec::new(),
            },
            "bit" => TypespecKind::BitVec {
                signed: false,
                ranges: Vec::new(),
            },
            "real" => TypespecKind::Real,
            "string" => TypespecKind::StringType,
            _ => return None,
        };
        Some(self.design.add_typespec(Typespec::primitive(kind)))
    }

    /// Applies folded overrides to a clone: parameter values and typedef
    /// entries, then re-folds the clone's port/signal vector ranges under
    /// the new environment.
    fn apply_overrides(
        &mut self,
        clone: ComponentId,
        values: &[(Symbol, Value)],
        typedefs: &[(Symbol, veril_ir::TypespecId)],
    ) {
        {
            let comp = self.design.component_mut(clone);
            for (name, value) in values {
                if let Some(p) = comp.params.iter_mut().find(|p| p.name == *name) {
                    p.value = Some(value.clone());
                }
            }
            for (name, ts) in typedefs {
                comp.typedefs.insert(*name, *ts);
            }
        }

        let env: ConstEnv = default_param_values(self.design, clone).into_iter().collect();
        let port_count = self.design.component(clone).ports.len();
        let signal_count = self.design.component(clone).signals.len();

        for i in 0..port_count + signal_count {
            let ts = {
                let comp = self.design.component(clone);
                let sig = if i < port_count {
                    &comp.ports[i]
                } else {
                    &comp.signals[i - port_count]
                };
                sig.typespec
            };
            let Some(ts) = ts else { continue };
            let Some(new_ts) = self.refold_typespec(clone, ts, &env) else {
                continue;
            };
            let comp = self.design.component_mut(clone);
            if i < port_count {
                comp.ports[i].typespec = Some(new_ts);
            } else {
                comp.signals[i - port_count].typespec = Some(new_ts);
            }
        }
    }

    /// Copies a typespec with its vector ranges re-folded under `env`.
    /// Returns `None` when nothing changes.
    fn refold_typespec(
        &mut self,
        scope: ComponentId,
        ts: veril_ir::TypespecId,
        env: &ConstEnv,
    ) -> Option<veril_ir::TypespecId> {
        let refolded = {
            let ctx = self.reader_ctx(scope);
            ctx.refold_vector_range(ts, env)
        }?;
        let old = self.design.typespecs.get(ts).clone();
        if old.folded_vector_range() == Some(refolded) {
            return None;
        }
        let mut new = old;
        match &mut new.kind {
            TypespecKind::Logic { ranges, .. } | TypespecKind::BitVec { ranges, .. } => {
                if let Some(r) = ranges.first_mut() {
                    r.folded = Some(refolded);
                }
            }
            TypespecKind::PackedArray { range, .. } => {
                range.folded = Some(refolded);
            }
            _ => return None,
        }
        Some(self.design.add_typespec(new))
    }

    /// A read-only compile context over the defining file of `scope`, used
    /// for expression folding helpers.
    fn reader_ctx(&mut self, scope: ComponentId) -> Ctx<'_> {
        let file = self.design.component(scope).file;
        let fc = self
            .inputs
            .files
            .get(&file)
            .unwrap_or_else(|| self.inputs.files.values().next().expect("no parsed files"));
        Ctx {
            design: &mut *self.design,
            fc,
            symbols: self.inputs.symbols,
            sink: self.inputs.sink,
            source_db: self.inputs.source_db,
            unit: self.inputs.unit,
            comp: scope,
        }
    }

    // ========================================================================
    // Generates
    // ========================================================================

    fn elaborate_generate(
        &mut self,
        inst: InstanceId,
        def: ComponentId,
        def_file: FileId,
        node: NodeId,
        env: &ConstEnv,
    ) {
        let inputs = self.inputs;
        let Some(fc) = inputs.files.get(&def_file) else {
            return;
        };
        match fc.node(node).kind {
            NodeKind::GenerateRegion => {
                for c in fc.children(node) {
                    self.elaborate_generate(inst, def, def_file, c, env);
                }
            }
            NodeKind::GenFor => self.elaborate_gen_for(inst, def, def_file, node, env),
            NodeKind::GenIf => self.elaborate_gen_if(inst, def, def_file, node, env),
            NodeKind::GenCase => self.elaborate_gen_case(inst, def, def_file, node, env),
            NodeKind::GenBlock => {
                let label = fc.node(node).symbol;
                let items = fc.children(node);
                self.materialize_scope(inst, def, def_file, label, None, &items, env);
            }
            _ => {}
        }
    }

    fn elaborate_gen_for(
        &mut self,
        inst: InstanceId,
        def: ComponentId,
        def_file: FileId,
        node: NodeId,
        env: &ConstEnv,
    ) {
        let inputs = self.inputs;
        let fc = &inputs.files[&def_file];
        let children = fc.children(node);
        if children.len() < 4 {
            return;
        }
        let (init, cond, step) = (children[0], children[1], children[2]);
        let body: Vec<NodeId> = children[3..].to_vec();
        let genvar = fc.node(node).symbol;
        let loc = SourceLoc::of_node(fc.node(node));
        let span = veril_compile::errors::loc_span(loc, self.inputs.source_db);

        // Loop bounds must fold to integer literals in this instance's
        // parameter context.
        let init_expr = fc.children(init).get(1).copied();
        let mut value = match init_expr.map(|e| {
            let ctx = self.reader_ctx_for(def, def_file);
            ctx.eval_const(e, env)
        }) {
            Some(v) if v.valid => v.to_i64().unwrap_or(0),
            _ => {
                self.inputs
                    .sink
                    .emit(errors::error_not_reducible("generate loop bound", span));
                return;
            }
        };

        // The scope base name: the body block's label when present,
        // otherwise the defining construct's name.
        let label = body
            .iter()
            .find(|&&b| fc.node(b).kind == NodeKind::GenBlock)
            .map(|&b| fc.node(b).symbol)
            .filter(|s| !s.is_bad())
            .unwrap_or_else(|| self.design.component(def).name);

        let mut iterations = 0i64;
        loop {
            let mut env2 = env.clone();
            let slot = self.values.alloc(Value::integer(value));
            env2.insert(genvar, self.values.get(slot).clone());
            self.values.release(slot);

            let cond_val = {
                let ctx = self.reader_ctx_for(def, def_file);
                ctx.eval_const(cond, &env2)
            };
            let Some(c) = cond_val.to_i64() else {
                self.inputs
                    .sink
                    .emit(errors::error_not_reducible("generate loop condition", span));
                return;
            };
            if c == 0 {
                break;
            }

            let scope_name = format!(
                "{}[{}]",
                self.inputs.symbols.lookup(label),
                value
            );
            let scope_sym = self.inputs.symbols.register(&scope_name);
            self.materialize_scope(
                inst,
                def,
                def_file,
                scope_sym,
                Some((genvar, value)),
                &body,
                &env2,
            );

            // Step: `i = expr`, `i++`, `i--`, or a bare expression.
            let step_node = fc.node(step);
            let next = match step_node.kind {
                NodeKind::BlockingAssign => {
                    let rhs = fc.children(step).last().copied();
                    rhs.map(|r| {
                        let ctx = self.reader_ctx_for(def, def_file);
                        ctx.eval_const(r, &env2)
                    })
                    .and_then(|v| v.to_i64())
                }
                NodeKind::UnaryOp => {
                    let op = self.inputs.symbols.lookup(step_node.symbol).to_string();
                    match op.as_str() {
                        "++" => Some(value + 1),
                        "--" => Some(value - 1),
                        _ => None,
                    }
                }
                _ => {
                    let ctx = self.reader_ctx_for(def, def_file);
                    ctx.eval_const(step, &env2).to_i64()
                }
            };
            let Some(next) = next else {
                self.inputs
                    .sink
                    .emit(errors::error_not_reducible("generate loop step", span));
                return;
            };
            value = next;

            iterations += 1;
            if iterations > MAX_GEN_ITERATIONS {
                self.inputs
                    .sink
                    .emit(errors::error_not_reducible("generate loop bound", span));
                return;
            }
        }
    }

    fn elaborate_gen_if(
        &mut self,
        inst: InstanceId,
        def: ComponentId,
        def_file: FileId,
        node: NodeId,
        env: &ConstEnv,
    ) {
        let inputs = self.inputs;
        let fc = &inputs.files[&def_file];
        let children = fc.children(node);
        if children.is_empty() {
            return;
        }
        let cond = {
            let ctx = self.reader_ctx_for(def, def_file);
            ctx.eval_const(children[0], env)
        };
        let taken = match cond.to_i64() {
            Some(0) => children.get(2).copied(),
            Some(_) => children.get(1).copied(),
            None => {
                let loc = SourceLoc::of_node(fc.node(node));
                let span = veril_compile::errors::loc_span(loc, self.inputs.source_db);
                self.inputs
                    .sink
                    .emit(errors::error_not_reducible("generate condition", span));
                None
            }
        };
        if let Some(branch) = taken {
            self.elaborate_gen_branch(inst, def, def_file, branch, env);
        }
    }

    fn elaborate_gen_case(
        &mut self,
        inst: InstanceId,
        def: ComponentId,
        def_file: FileId,
        node: NodeId,
        env: &ConstEnv,
    ) {
        let inputs = self.inputs;
        let fc = &inputs.files[&def_file];
        let children = fc.children(node);
        let Some(&scrutinee) = children.first() else {
            return;
        };
        let value = {
            let ctx = self.reader_ctx_for(def, def_file);
            ctx.eval_const(scrutinee, env)
        };
        let Some(v) = value.to_i64() else {
            let loc = SourceLoc::of_node(fc.node(node));
            let span = veril_compile::errors::loc_span(loc, self.inputs.source_db);
            self.inputs
                .sink
                .emit(errors::error_not_reducible("generate case selector", span));
            return;
        };

        let mut default_body = None;
        for &item in &children[1..] {
            if fc.node(item).kind != NodeKind::CaseItem {
                continue;
            }
            let item_children = fc.children(item);
            let Some((&body, exprs)) = item_children.split_last() else {
                continue;
            };
            if exprs.is_empty() {
                default_body = Some(body);
                continue;
            }
            let matched = exprs.iter().any(|&e| {
                let ctx = self.reader_ctx_for(def, def_file);
                ctx.eval_const(e, env).to_i64() == Some(v)
            });
            if matched {
                self.elaborate_gen_branch(inst, def, def_file, body, env);
                return;
            }
        }
        if let Some(body) = default_body {
            self.elaborate_gen_branch(inst, def, def_file, body, env);
        }
    }

    /// A taken generate branch: a block becomes a named scope, a nested
    /// construct recurses, a plain item materializes into an anonymous
    /// scope.
    fn elaborate_gen_branch(
        &mut self,
        inst: InstanceId,
        def: ComponentId,
        def_file: FileId,
        branch: NodeId,
        env: &ConstEnv,
    ) {
        let inputs = self.inputs;
        let fc = &inputs.files[&def_file];
        match fc.node(branch).kind {
            NodeKind::GenBlock => {
                let label = fc.node(branch).symbol;
                let items = fc.children(branch);
                let label = if label.is_bad() {
                    let n = self.inputs.unit.next_design_elem_id();
                    self.inputs.symbols.register(&format!("genblk{n}"))
                } else {
                    label
                };
                self.materialize_scope(inst, def, def_file, label, None, &items, env);
            }
            NodeKind::GenFor | NodeKind::GenIf | NodeKind::GenCase | NodeKind::GenerateRegion => {
                self.elaborate_generate(inst, def, def_file, branch, env);
            }
            _ => {
                let n = self.inputs.unit.next_design_elem_id();
                let label = self.inputs.symbols.register(&format!("genblk{n}"));
                self.materialize_scope(inst, def, def_file, label, None, &[branch], env);
            }
        }
    }

    /// Creates one concrete `GenScope`: an anonymous component holding the
    /// scope's declarations compiled under the concrete environment, and a
    /// child instance pointing at it.
    #[allow(clippy::too_many_arguments)]
    fn materialize_scope(
        &mut self,
        inst: InstanceId,
        def: ComponentId,
        def_file: FileId,
        name: Symbol,
        genvar: Option<(Symbol, i64)>,
        items: &[NodeId],
        env: &ConstEnv,
    ) {
        let (library, loc) = {
            let d = self.design.component(def);
            (d.library, d.loc)
        };
        let scope_comp = self.design.add_unregistered(Component::shell(
            ComponentKind::Module,
            name,
            library,
            def_file,
            loc,
        ));

        // Compile the scope's items under the concrete environment.
        let inputs = self.inputs;
        let fc = &inputs.files[&def_file];
        let mut signals = Vec::new();
        let mut subs = Vec::new();
        let mut assigns = Vec::new();
        let mut nested: Vec<NodeId> = Vec::new();
        for &item in items {
            match fc.node(item).kind {
                NodeKind::NetDecl | NodeKind::VarDecl => {
                    let mut ctx = self.scope_ctx(scope_comp, def_file);
                    signals.extend(ctx.compile_decl_item(item, env));
                }
                NodeKind::Instantiation => {
                    let mut ctx = self.scope_ctx(scope_comp, def_file);
                    subs.extend(ctx.compile_instantiation_item(item, env));
                }
                NodeKind::ContAssign => {
                    let children = fc.children(item);
                    if children.len() >= 2 {
                        let mut ctx = self.scope_ctx(scope_comp, def_file);
                        let lhs = ctx.compile_expr(children[0], env, veril_compile::Reduce::No);
                        let rhs = ctx.compile_expr(children[1], env, veril_compile::Reduce::No);
                        assigns.push((lhs, rhs));
                    }
                }
                NodeKind::GenFor
                | NodeKind::GenIf
                | NodeKind::GenCase
                | NodeKind::GenBlock
                | NodeKind::GenerateRegion => nested.push(item),
                _ => {}
            }
        }
        {
            let comp = self.design.component_mut(scope_comp);
            comp.signals = signals;
            comp.sub_instances = subs.clone();
            comp.cont_assigns = assigns.clone();
        }

        // Scope expressions are compiled after the main binding pass ran;
        // resolve their references here, falling back to the enclosing
        // definition's scope.
        for (lhs, rhs) in assigns {
            self.bind_scope_expr(scope_comp, def, lhs);
            self.bind_scope_expr(scope_comp, def, rhs);
        }

        let default_exprs: Vec<veril_ir::ExprId> = self
            .design
            .component(scope_comp)
            .signals
            .iter()
            .filter_map(|s| s.default_value)
            .collect();
        for e in default_exprs {
            self.bind_scope_expr(scope_comp, def, e);
        }

        let mut param_values: Vec<(Symbol, Value)> =
            env.iter().map(|(k, v)| (*k, v.clone())).collect();
        param_values.sort_by_key(|(k, _)| k.as_raw());
        if let Some((gv, val)) = genvar {
            if !param_values.iter().any(|(k, _)| *k == gv) {
                param_values.push((gv, Value::integer(val)));
            }
        }

        let scope_inst = self.design.instances.alloc(ModuleInstance {
            name,
            kind: InstanceKind::GenScope,
            definition: Some(scope_comp),
            parent: Some(inst),
            children: Vec::new(),
            param_values,
            typedef_overrides: Vec::new(),
            modport_bindings: Vec::new(),
            loc,
        });

        for sub in subs {
            self.expand_sub_instance(scope_inst, scope_comp, &sub, env);
        }
        for n in nested {
            self.elaborate_generate(scope_inst, scope_comp, def_file, n, env);
        }
    }

    /// Resolves unresolved references in a generate-scope expression:
    /// first against the scope itself, then the enclosing definition.
    fn bind_scope_expr(&mut self, scope: ComponentId, outer: ComponentId, root: veril_ir::ExprId) {
        use veril_ir::ExprKind as EK;
        let mut stack = vec![root];
        let mut fixes: Vec<(veril_ir::ExprId, veril_ir::RefTarget)> = Vec::new();
        while let Some(e) = stack.pop() {
            match &self.design.exprs.get(e).kind {
                EK::Ref { name, actual: None } => {
                    let target = bind::resolve_for(self.design, scope, *name)
                        .or_else(|| bind::resolve_for(self.design, outer, *name));
                    if let Some(t) = target {
                        fixes.push((e, t));
                    }
                }
                EK::Operation { operands, .. } => stack.extend(operands),
                EK::BitSelect { base, index } => {
                    stack.push(*base);
                    stack.push(*index);
                }
                EK::PartSelect {
                    base, left, right, ..
                } => {
                    stack.push(*base);
                    stack.push(*left);
                    stack.push(*right);
                }
                EK::Concat(parts) | EK::Replication(parts) => stack.extend(parts),
                EK::SysCall { args, .. } => stack.extend(args),
                EK::MethodCall { receiver, args, .. } => {
                    stack.extend(receiver.iter());
                    stack.extend(args);
                }
                _ => {}
            }
        }
        for (e, t) in fixes {
            if let EK::Ref { actual, .. } = &mut self.design.exprs.get_mut(e).kind {
                *actual = Some(t);
            }
        }
    }

    fn scope_ctx(&mut self, scope: ComponentId, file: FileId) -> Ctx<'_> {
        let fc = &self.inputs.files[&file];
        Ctx {
            design: &mut *self.design,
            fc,
            symbols: self.inputs.symbols,
            sink: self.inputs.sink,
            source_db: self.inputs.source_db,
            unit: self.inputs.unit,
            comp: scope,
        }
    }

    fn reader_ctx_for(&mut self, scope: ComponentId, file: FileId) -> Ctx<'_> {
        self.scope_ctx(scope, file)
    }

    // ========================================================================
    // Interface ports
    // ========================================================================

    /// Binds interface ports: the port resolves its target interface
    /// definition (and modport); the low connection is an interface
    /// instance: an existing sibling when the connection names one, or a
    /// fresh anonymous instance otherwise.
    fn bind_interface_ports(&mut self, inst: InstanceId, def: ComponentId) {
        let ports: Vec<(Symbol, Option<ComponentId>, Option<Symbol>)> = self
            .design
            .component(def)
            .ports
            .iter()
            .filter(|p| p.is_interface_port())
            .map(|p| (p.name, p.interface_def, p.modport))
            .collect();

        for (port_name, iface_def, _modport) in ports {
            let Some(iface) = iface_def else {
                continue;
            };

            // An existing sibling interface instance of the right type.
            let parent = self.design.instances.get(inst).parent;
            let existing = parent.and_then(|p| {
                self.design
                    .instances
                    .get(p)
                    .children
                    .iter()
                    .copied()
                    .find(|&c| {
                        let ci = self.design.instances.get(c);
                        ci.kind == InstanceKind::Interface && ci.definition == Some(iface)
                    })
            });

            let iface_inst = match existing {
                Some(i) => i,
                None => {
                    let param_values = default_param_values(self.design, iface);
                    let loc = self.design.component(iface).loc;
                    let created = self.design.instances.alloc(ModuleInstance {
                        name: port_name,
                        kind: InstanceKind::Interface,
                        definition: Some(iface),
                        parent: Some(inst),
                        children: Vec::new(),
                        param_values,
                        typedef_overrides: Vec::new(),
                        modport_bindings: Vec::new(),
                        loc,
                    });
                    self.expand(created);
                    created
                }
            };
            self.design
                .instances
                .get_mut(inst)
                .modport_bindings
                .push((port_name, iface_inst));
        }
    }
}
