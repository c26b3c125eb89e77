//! The symbol resolver: late binding of cross-component references.
//!
//! Runs once all declarations are registered. For each reference (class
//! `extends`, typedef uses, identifier uses, hierarchical paths) the name
//! is looked up through a fixed cascade:
//!
//! 1. enclosing task/function/block locals,
//! 2. the component's own symbol table (ports, nets, parameters, nested
//!    classes, typedefs, enum members),
//! 3. the base-class chain,
//! 4. imported packages in import order,
//! 5. the design registry (modules/interfaces by name, packages by name).
//!
//! Unresolved references are logged and left nullable; the integrity
//! checker decides whether nullness is fatal.

use crate::errors;
use std::collections::HashMap;
use veril_common::{Symbol, SymbolTable};
use veril_diagnostics::DiagnosticSink;
use veril_ir::{
    Component, ComponentId, ComponentKind, Design, ExprId, ExprKind, RefTarget, SourceLoc,
    StmtId, StmtKind, TypespecId, TypespecKind,
};
use veril_source::SourceDb;

/// Class names provided by the built-in library; `extends` of one of these
/// always resolves.
pub const BUILTIN_CLASSES: &[&str] = &[
    "array",
    "queue",
    "string",
    "system",
    "mailbox",
    "semaphore",
    "process",
];

/// Registers the built-in base classes in the `builtin` library.
pub fn seed_builtin_classes(design: &mut Design, symbols: &SymbolTable) {
    let lib = symbols.register("builtin");
    for name in BUILTIN_CLASSES {
        let shell = Component::shell(
            ComponentKind::Class,
            symbols.register(name),
            lib,
            veril_source::FileId::DUMMY,
            SourceLoc::UNKNOWN,
        );
        // Already present when bind runs twice.
        let _ = design.register(shell);
    }
}

/// Runs the full late-binding pass over the design.
pub fn bind_design(
    design: &mut Design,
    symbols: &SymbolTable,
    source_db: &SourceDb,
    sink: &DiagnosticSink,
) {
    seed_builtin_classes(design, symbols);
    let parent_of = build_parent_map(design);

    resolve_base_classes(design, &parent_of, symbols, source_db, sink);
    resolve_typespecs(design, symbols, source_db, sink);
    resolve_interface_ports(design, symbols, source_db, sink);
    resolve_expressions(design, symbols, source_db, sink);
}

fn build_parent_map(design: &Design) -> HashMap<ComponentId, ComponentId> {
    let mut map = HashMap::new();
    for (id, comp) in design.components() {
        for &sub in &comp.sub_components {
            map.insert(sub, id);
        }
    }
    map
}

// ============================================================================
// Base classes
// ============================================================================

fn resolve_base_classes(
    design: &mut Design,
    parent_of: &HashMap<ComponentId, ComponentId>,
    symbols: &SymbolTable,
    source_db: &SourceDb,
    sink: &DiagnosticSink,
) {
    let ids: Vec<ComponentId> = design.components().map(|(id, _)| id).collect();
    for id in ids {
        let Some((base_name, None)) = design.component(id).base_class else {
            continue;
        };
        let resolved = lookup_class(design, parent_of, id, base_name);
        match resolved {
            Some(base_id) => {
                design.component_mut(id).base_class = Some((base_name, Some(base_id)));
            }
            None => {
                let comp = design.component(id);
                let span = veril_compile::errors::loc_span(comp.loc, source_db);
                sink.emit(errors::error_no_base_class(
                    symbols.lookup(base_name),
                    symbols.lookup(comp.name),
                    span,
                ));
            }
        }
    }
}

/// Class lookup: siblings in the enclosing component, the enclosing chain,
/// imported packages, then the registry (builtins included).
fn lookup_class(
    design: &Design,
    parent_of: &HashMap<ComponentId, ComponentId>,
    from: ComponentId,
    name: Symbol,
) -> Option<ComponentId> {
    let mut scope = Some(from);
    while let Some(s) = scope {
        let comp = design.component(s);
        for &sub in &comp.sub_components {
            if design.component(sub).name == name {
                return Some(sub);
            }
        }
        for &pkg_name in &comp.imports {
            if let Some(pkg) = design.package(pkg_name) {
                for &sub in &design.component(pkg).sub_components {
                    if design.component(sub).name == name {
                        return Some(sub);
                    }
                }
            }
        }
        scope = parent_of.get(&s).copied();
    }
    design
        .lookup_any(name)
        .filter(|&c| design.component(c).kind == ComponentKind::Class)
}

// ============================================================================
// Typespecs
// ============================================================================

fn resolve_typespecs(
    design: &mut Design,
    symbols: &SymbolTable,
    source_db: &SourceDb,
    sink: &DiagnosticSink,
) {
    let count = design.typespecs.len() as u32;
    for i in 0..count {
        let ts_id = TypespecId::from_raw(i);
        let (kind, instance, loc) = {
            let ts = design.typespecs.get(ts_id);
            (ts.kind.clone(), ts.instance, ts.loc)
        };
        match kind {
            TypespecKind::TypedefAlias { name, target: None } => {
                let Some(user) = instance else { continue };
                match lookup_typedef(design, user, name) {
                    Some((target, owner)) => {
                        let ts = design.typespecs.get_mut(ts_id);
                        ts.kind = TypespecKind::TypedefAlias {
                            name,
                            target: Some(target),
                        };
                        ts.instance = Some(owner);
                    }
                    None => {
                        // An interface or class name used as a type is
                        // legitimate; rewrite instead of diagnosing.
                        if let Some(c) = design.lookup_any(name) {
                            let comp_kind = design.component(c).kind;
                            let new_kind = match comp_kind {
                                ComponentKind::Interface => TypespecKind::InterfaceRef {
                                    name,
                                    modport: None,
                                    actual: Some(c),
                                },
                                ComponentKind::Class => TypespecKind::ClassRef {
                                    name,
                                    actual: Some(c),
                                },
                                ComponentKind::Module => TypespecKind::ModuleRef {
                                    name,
                                    actual: Some(c),
                                },
                                _ => continue,
                            };
                            let ts = design.typespecs.get_mut(ts_id);
                            ts.kind = new_kind;
                            ts.instance = Some(c);
                        } else {
                            let span = veril_compile::errors::loc_span(loc, source_db);
                            sink.emit(errors::error_undefined_type(
                                symbols.lookup(name),
                                span,
                            ));
                        }
                    }
                }
            }
            TypespecKind::ImportRef {
                package,
                name,
                target: None,
            } => match design.package(package) {
                Some(pkg) => match design.component(pkg).typedefs.get(&name).copied() {
                    Some(target) => {
                        let ts = design.typespecs.get_mut(ts_id);
                        ts.kind = TypespecKind::ImportRef {
                            package,
                            name,
                            target: Some(target),
                        };
                        // The declaring scope is the package, not the user.
                        ts.instance = Some(pkg);
                    }
                    None => {
                        let span = veril_compile::errors::loc_span(loc, source_db);
                        sink.emit(errors::error_undefined_type(symbols.lookup(name), span));
                    }
                },
                None => {
                    let span = veril_compile::errors::loc_span(loc, source_db);
                    sink.emit(errors::error_undefined_type(symbols.lookup(package), span));
                }
            },
            TypespecKind::ClassRef { name, actual: None } => {
                if let Some(c) = design.lookup_any(name) {
                    let ts = design.typespecs.get_mut(ts_id);
                    ts.kind = TypespecKind::ClassRef {
                        name,
                        actual: Some(c),
                    };
                    ts.instance = Some(c);
                }
            }
            TypespecKind::InterfaceRef {
                name,
                modport,
                actual: None,
            } => {
                if let Some(c) = design.lookup_any(name) {
                    let ts = design.typespecs.get_mut(ts_id);
                    ts.kind = TypespecKind::InterfaceRef {
                        name,
                        modport,
                        actual: Some(c),
                    };
                    ts.instance = Some(c);
                }
            }
            TypespecKind::ModuleRef { name, actual: None } => {
                if let Some(c) = design.lookup_any(name) {
                    let ts = design.typespecs.get_mut(ts_id);
                    ts.kind = TypespecKind::ModuleRef {
                        name,
                        actual: Some(c),
                    };
                    ts.instance = Some(c);
                }
            }
            _ => {}
        }
    }
}

/// Finds a typedef by name from a using component: own typedefs, base
/// classes, then imported packages. Returns the target and the declaring
/// component.
fn lookup_typedef(
    design: &Design,
    from: ComponentId,
    name: Symbol,
) -> Option<(TypespecId, ComponentId)> {
    let mut scope = Some(from);
    let mut hops = 0;
    while let Some(s) = scope {
        let comp = design.component(s);
        if let Some(&ts) = comp.typedefs.get(&name) {
            return Some((ts, s));
        }
        scope = comp.base_class.and_then(|(_, base)| base);
        hops += 1;
        if hops > 64 {
            break;
        }
    }
    let comp = design.component(from);
    for &pkg_name in &comp.imports {
        let pkg = design.package(pkg_name)?;
        if let Some(&ts) = design.component(pkg).typedefs.get(&name) {
            return Some((ts, pkg));
        }
    }
    None
}

// ============================================================================
// Interface ports
// ============================================================================

fn resolve_interface_ports(
    design: &mut Design,
    symbols: &SymbolTable,
    source_db: &SourceDb,
    sink: &DiagnosticSink,
) {
    let ids: Vec<ComponentId> = design.components().map(|(id, _)| id).collect();
    for id in ids {
        let mut updates: Vec<(usize, Option<ComponentId>)> = Vec::new();
        {
            let comp = design.component(id);
            for (i, port) in comp.ports.iter().enumerate() {
                let Some(name) = port.interface_name else {
                    continue;
                };
                if port.interface_def.is_some() {
                    continue;
                }
                let target = design
                    .lookup_any(name)
                    .filter(|&c| design.component(c).kind == ComponentKind::Interface);
                if target.is_none() {
                    let span = veril_compile::errors::loc_span(port.loc, source_db);
                    sink.emit(veril_compile::errors::error_undefined_interface(
                        symbols.lookup(name),
                        span,
                    ));
                }
                updates.push((i, target));
            }
        }
        for (i, target) in updates {
            design.component_mut(id).ports[i].interface_def = target;
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

fn resolve_expressions(
    design: &mut Design,
    symbols: &SymbolTable,
    source_db: &SourceDb,
    sink: &DiagnosticSink,
) {
    let ids: Vec<ComponentId> = design.components().map(|(id, _)| id).collect();
    let mut resolutions: Vec<(ExprId, RefTarget)> = Vec::new();
    let mut unresolved: Vec<(ExprId, Symbol)> = Vec::new();

    // Names that resolve implicitly in any scope.
    let implicit: Vec<Symbol> = ["this", "super", "null", "$", "new"]
        .iter()
        .map(|s| symbols.register(s))
        .collect();

    for id in ids {
        let comp = design.component(id);
        let mut locals: Vec<Symbol> = implicit.clone();

        // Expression roots at component level.
        let mut expr_roots: Vec<ExprId> = Vec::new();
        for p in &comp.params {
            expr_roots.extend(p.default);
        }
        for s in comp.ports.iter().chain(comp.signals.iter()) {
            expr_roots.extend(s.default_value);
        }
        for (lhs, rhs) in &comp.cont_assigns {
            expr_roots.push(*lhs);
            expr_roots.push(*rhs);
        }
        for si in &comp.sub_instances {
            expr_roots.extend(si.param_overrides.iter().map(|(_, e)| *e));
            expr_roots.extend(si.connections.iter().filter_map(|(_, e)| *e));
        }
        if let Some(udp) = &comp.udp {
            expr_roots.extend(udp.initial);
        }
        for e in expr_roots {
            walk_expr(design, id, &locals, e, &mut resolutions, &mut unresolved);
        }

        // Statement roots: processes and task/function bodies.
        let mut stmt_roots: Vec<(StmtId, Vec<Symbol>)> = Vec::new();
        for p in &comp.processes {
            if let Some(s) = p.compiled {
                stmt_roots.push((s, Vec::new()));
            }
        }
        for tf in comp.functions.iter().chain(comp.tasks.iter()) {
            if let Some(s) = tf.compiled {
                // Formals and the implicit return variable are locals.
                let mut tf_locals: Vec<Symbol> =
                    tf.ports.iter().map(|(n, _, _)| *n).collect();
                tf_locals.push(tf.name);
                stmt_roots.push((s, tf_locals));
            }
        }
        for (s, extra) in stmt_roots {
            locals.clear();
            locals.extend(implicit.iter().copied());
            locals.extend(extra);
            walk_stmt(design, id, &mut locals, s, &mut resolutions, &mut unresolved);
        }
    }

    for (e, target) in resolutions {
        set_actual(design, e, target);
    }
    for (e, name) in unresolved {
        let loc = design.exprs.get(e).loc;
        let span = veril_compile::errors::loc_span(loc, source_db);
        sink.emit(errors::error_undefined_variable(symbols.lookup(name), span));
    }
}

fn set_actual(design: &mut Design, e: ExprId, target: RefTarget) {
    match &mut design.exprs.get_mut(e).kind {
        ExprKind::Ref { actual, .. }
        | ExprKind::PackageRef { actual, .. }
        | ExprKind::HierPath { actual, .. }
        | ExprKind::MethodCall { actual, .. } => *actual = Some(target),
        _ => {}
    }
}

fn walk_stmt(
    design: &Design,
    comp: ComponentId,
    locals: &mut Vec<Symbol>,
    stmt: StmtId,
    resolutions: &mut Vec<(ExprId, RefTarget)>,
    unresolved: &mut Vec<(ExprId, Symbol)>,
) {
    let node = design.stmts.get(stmt);
    match &node.kind {
        StmtKind::Block { stmts, .. } => {
            let mark = locals.len();
            for &s in stmts {
                walk_stmt(design, comp, locals, s, resolutions, unresolved);
            }
            locals.truncate(mark);
        }
        StmtKind::If {
            cond,
            then_stmt,
            else_stmt,
            ..
        } => {
            walk_expr(design, comp, locals, *cond, resolutions, unresolved);
            walk_stmt(design, comp, locals, *then_stmt, resolutions, unresolved);
            if let Some(e) = else_stmt {
                walk_stmt(design, comp, locals, *e, resolutions, unresolved);
            }
        }
        StmtKind::Case {
            scrutinee, items, ..
        } => {
            walk_expr(design, comp, locals, *scrutinee, resolutions, unresolved);
            for item in items {
                for &e in &item.exprs {
                    walk_expr(design, comp, locals, e, resolutions, unresolved);
                }
                walk_stmt(design, comp, locals, item.body, resolutions, unresolved);
            }
        }
        StmtKind::Assign { lhs, rhs, .. } => {
            walk_expr(design, comp, locals, *lhs, resolutions, unresolved);
            walk_expr(design, comp, locals, *rhs, resolutions, unresolved);
        }
        StmtKind::EventControlled { events, body } => {
            for &e in events {
                walk_expr(design, comp, locals, e, resolutions, unresolved);
            }
            walk_stmt(design, comp, locals, *body, resolutions, unresolved);
        }
        StmtKind::Delayed { delay, body } => {
            walk_expr(design, comp, locals, *delay, resolutions, unresolved);
            walk_stmt(design, comp, locals, *body, resolutions, unresolved);
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            let mark = locals.len();
            if let Some(i) = init {
                walk_stmt(design, comp, locals, *i, resolutions, unresolved);
            }
            if let Some(c) = cond {
                walk_expr(design, comp, locals, *c, resolutions, unresolved);
            }
            if let Some(s) = step {
                walk_stmt(design, comp, locals, *s, resolutions, unresolved);
            }
            walk_stmt(design, comp, locals, *body, resolutions, unresolved);
            locals.truncate(mark);
        }
        StmtKind::Foreach { array, body } => {
            let mark = locals.len();
            collect_select_names(design, *array, locals);
            walk_expr(design, comp, locals, *array, resolutions, unresolved);
            walk_stmt(design, comp, locals, *body, resolutions, unresolved);
            locals.truncate(mark);
        }
        StmtKind::While { cond, body, .. } => {
            walk_expr(design, comp, locals, *cond, resolutions, unresolved);
            walk_stmt(design, comp, locals, *body, resolutions, unresolved);
        }
        StmtKind::Repeat { count, body } => {
            walk_expr(design, comp, locals, *count, resolutions, unresolved);
            walk_stmt(design, comp, locals, *body, resolutions, unresolved);
        }
        StmtKind::Forever { body } => {
            walk_stmt(design, comp, locals, *body, resolutions, unresolved);
        }
        StmtKind::Wait { cond, body } => {
            walk_expr(design, comp, locals, *cond, resolutions, unresolved);
            walk_stmt(design, comp, locals, *body, resolutions, unresolved);
        }
        StmtKind::Return(value) => {
            if let Some(v) = value {
                walk_expr(design, comp, locals, *v, resolutions, unresolved);
            }
        }
        StmtKind::ExprStmt(e) => {
            walk_expr(design, comp, locals, *e, resolutions, unresolved);
        }
        StmtKind::VarDecl { name, init, .. } => {
            if let Some(i) = init {
                walk_expr(design, comp, locals, *i, resolutions, unresolved);
            }
            locals.push(*name);
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Null | StmtKind::Unsupported => {}
    }
}

/// Loop variables of a foreach live in its select indices.
fn collect_select_names(design: &Design, expr: ExprId, locals: &mut Vec<Symbol>) {
    match &design.exprs.get(expr).kind {
        ExprKind::BitSelect { base, index } => {
            collect_select_names(design, *base, locals);
            if let ExprKind::Ref { name, .. } = &design.exprs.get(*index).kind {
                locals.push(*name);
            }
        }
        ExprKind::PartSelect { base, .. } => collect_select_names(design, *base, locals),
        _ => {}
    }
}

fn walk_expr(
    design: &Design,
    comp: ComponentId,
    locals: &[Symbol],
    expr: ExprId,
    resolutions: &mut Vec<(ExprId, RefTarget)>,
    unresolved: &mut Vec<(ExprId, Symbol)>,
) {
    let node = design.exprs.get(expr);
    match &node.kind {
        ExprKind::Ref { name, actual } => {
            if actual.is_some() {
                return;
            }
            match resolve_name(design, comp, *name, locals) {
                Some(target) => resolutions.push((expr, target)),
                None => unresolved.push((expr, *name)),
            }
        }
        ExprKind::PackageRef {
            package,
            name,
            actual,
        } => {
            if actual.is_some() {
                return;
            }
            if let Some(target) = resolve_in_package(design, *package, *name) {
                resolutions.push((expr, target));
            } else {
                unresolved.push((expr, *name));
            }
        }
        ExprKind::HierPath { segments, .. } => {
            if let Some(target) = resolve_hier_path(design, comp, segments, locals) {
                resolutions.push((expr, target));
            }
            // Unresolved paths stay nullable without a diagnostic here;
            // the integrity checker reports them post-elaboration.
        }
        ExprKind::MethodCall {
            receiver,
            name,
            args,
            actual,
        } => {
            if let Some(r) = receiver {
                walk_expr(design, comp, locals, *r, resolutions, unresolved);
            }
            for &a in args {
                walk_expr(design, comp, locals, a, resolutions, unresolved);
            }
            if actual.is_none() {
                if let Some(target) = resolve_tf(design, comp, *name) {
                    resolutions.push((expr, target));
                }
            }
        }
        ExprKind::Operation { operands, .. } => {
            for &o in operands {
                walk_expr(design, comp, locals, o, resolutions, unresolved);
            }
        }
        ExprKind::SysCall { args, .. } => {
            for &a in args {
                walk_expr(design, comp, locals, a, resolutions, unresolved);
            }
        }
        ExprKind::BitSelect { base, index } => {
            walk_expr(design, comp, locals, *base, resolutions, unresolved);
            walk_expr(design, comp, locals, *index, resolutions, unresolved);
        }
        ExprKind::PartSelect {
            base, left, right, ..
        } => {
            walk_expr(design, comp, locals, *base, resolutions, unresolved);
            walk_expr(design, comp, locals, *left, resolutions, unresolved);
            walk_expr(design, comp, locals, *right, resolutions, unresolved);
        }
        ExprKind::Concat(parts) | ExprKind::Replication(parts) => {
            for &p in parts {
                walk_expr(design, comp, locals, p, resolutions, unresolved);
            }
        }
        ExprKind::AssignmentPattern(entries) => {
            for (_, e) in entries {
                walk_expr(design, comp, locals, *e, resolutions, unresolved);
            }
        }
        ExprKind::TaggedPattern { value, .. } => {
            if let Some(v) = value {
                walk_expr(design, comp, locals, *v, resolutions, unresolved);
            }
        }
        ExprKind::Cast { operand, .. } => {
            walk_expr(design, comp, locals, *operand, resolutions, unresolved);
        }
        ExprKind::Constant(_) | ExprKind::Unsupported => {}
    }
}

/// The lookup cascade for a plain identifier: locals, own scope with base
/// chain, imports in order, then the registry.
pub fn resolve_name(
    design: &Design,
    comp: ComponentId,
    name: Symbol,
    locals: &[Symbol],
) -> Option<RefTarget> {
    // 1. Enclosing locals.
    if locals.contains(&name) {
        return Some(RefTarget::Local(name));
    }

    // 2. The component's own symbol table, walking base classes (3).
    let mut scope = Some(comp);
    let mut hops = 0;
    while let Some(s) = scope {
        if let Some(target) = resolve_in_component(design, s, name) {
            return Some(target);
        }
        scope = design.component(s).base_class.and_then(|(_, b)| b);
        hops += 1;
        if hops > 64 {
            break;
        }
    }

    // 4. Imported packages, in import order.
    for &pkg_name in &design.component(comp).imports {
        if let Some(target) = resolve_in_package(design, pkg_name, name) {
            return Some(target);
        }
    }

    // 5. The design registry.
    if let Some(pkg) = design.package(name) {
        return Some(RefTarget::Component(pkg));
    }
    if let Some(c) = design.lookup_any(name) {
        return Some(RefTarget::Component(c));
    }
    None
}

fn resolve_in_component(design: &Design, comp: ComponentId, name: Symbol) -> Option<RefTarget> {
    let c = design.component(comp);
    if let Some(i) = c.signal_index(name) {
        return Some(RefTarget::SignalIn(comp, i));
    }
    if let Some(i) = c.param_index(name) {
        return Some(RefTarget::ParamIn(comp, i));
    }
    if let Some(i) = c.tf_index(name) {
        return Some(RefTarget::TfIn(comp, i));
    }
    if let Some(&ts) = c.typedefs.get(&name) {
        return Some(RefTarget::Typespec(ts));
    }
    // Enum members of locally declared enum types.
    for &ts in c.typedefs.values().chain(c.data_types.values()) {
        if let TypespecKind::Enum { members, .. } = &design.typespecs.get(ts).kind {
            if let Some(i) = members.iter().position(|(n, _)| *n == name) {
                return Some(RefTarget::EnumMember(ts, i as u32));
            }
        }
    }
    for &sub in &c.sub_components {
        if design.component(sub).name == name {
            return Some(RefTarget::Component(sub));
        }
    }
    None
}

fn resolve_in_package(design: &Design, pkg_name: Symbol, name: Symbol) -> Option<RefTarget> {
    let pkg = design.package(pkg_name)?;
    resolve_in_component(design, pkg, name)
}

fn resolve_tf(design: &Design, comp: ComponentId, name: Symbol) -> Option<RefTarget> {
    let mut scope = Some(comp);
    let mut hops = 0;
    while let Some(s) = scope {
        if let Some(i) = design.component(s).tf_index(name) {
            return Some(RefTarget::TfIn(s, i));
        }
        scope = design.component(s).base_class.and_then(|(_, b)| b);
        hops += 1;
        if hops > 64 {
            break;
        }
    }
    for &pkg_name in &design.component(comp).imports {
        if let Some(pkg) = design.package(pkg_name) {
            if let Some(i) = design.component(pkg).tf_index(name) {
                return Some(RefTarget::TfIn(pkg, i));
            }
        }
    }
    None
}

/// Resolves a hierarchical path segment by segment; each resolved segment
/// narrows the scope used for the next.
fn resolve_hier_path(
    design: &Design,
    comp: ComponentId,
    segments: &[ExprId],
    locals: &[Symbol],
) -> Option<RefTarget> {
    let mut scope = comp;
    let mut last: Option<RefTarget> = None;

    for (i, &seg) in segments.iter().enumerate() {
        let name = match &design.exprs.get(seg).kind {
            ExprKind::Ref { name, .. } => *name,
            ExprKind::BitSelect { base, .. } => match &design.exprs.get(*base).kind {
                ExprKind::Ref { name, .. } => *name,
                _ => return last,
            },
            _ => return last,
        };
        let target = if i == 0 {
            resolve_name(design, scope, name, locals)?
        } else {
            resolve_in_component(design, scope, name)?
        };
        // Narrow the scope for the next segment.
        match target {
            RefTarget::SignalIn(c, idx) => {
                let sig = design.component(c).signal_at(idx)?;
                if let Some(iface) = sig.interface_def {
                    scope = iface;
                }
            }
            RefTarget::Component(c) => scope = c,
            _ => {}
        }
        last = Some(target);
    }
    last
}

/// Resolves a plain identifier for callers outside the binder (the
/// elaborator's interface-connection lookup).
pub fn resolve_for(design: &Design, comp: ComponentId, name: Symbol) -> Option<RefTarget> {
    resolve_name(design, comp, name, &[])
}
