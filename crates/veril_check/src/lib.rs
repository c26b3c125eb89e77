//! Post-elaboration integrity checking.
//!
//! A read-only visitor over the elaborated IR that verifies internal
//! invariants: required name/location/parent fields, ordered and enclosed
//! source ranges, resolved references, typespec instance pointers, and
//! duplicate-free collections. Violations produce diagnostics; the IR is
//! never mutated. Disjoint top subtrees can be checked in parallel; every
//! entry point takes the design immutably.

#![warn(missing_docs)]

pub mod errors;

use std::collections::HashSet;
use veril_common::SymbolTable;
use veril_diagnostics::DiagnosticSink;
use veril_ir::{
    ComponentId, Design, ExprId, ExprKind, InstanceId, StmtId, StmtKind, TypespecKind,
};
use veril_source::SourceDb;

/// Checks the whole design: every top subtree plus registry-level rules.
pub fn check_design(
    design: &Design,
    symbols: &SymbolTable,
    source_db: &SourceDb,
    sink: &DiagnosticSink,
) {
    let tops: Vec<InstanceId> = design.instances.tops.clone();
    for top in tops {
        check_subtree(design, top, symbols, source_db, sink);
    }
}

/// Checks one top-level subtree. Safe to call in parallel for disjoint
/// tops: all inputs are shared references.
pub fn check_subtree(
    design: &Design,
    top: InstanceId,
    symbols: &SymbolTable,
    source_db: &SourceDb,
    sink: &DiagnosticSink,
) {
    let checker = Checker {
        design,
        symbols,
        source_db,
        sink,
    };
    for inst in design.instances.descendants(top) {
        checker.check_instance(inst);
        if let Some(def) = design.instances.get(inst).definition {
            checker.check_component(def);
        }
    }
}

struct Checker<'a> {
    design: &'a Design,
    symbols: &'a SymbolTable,
    source_db: &'a SourceDb,
    sink: &'a DiagnosticSink,
}

impl Checker<'_> {
    fn span_of(&self, loc: veril_ir::SourceLoc) -> veril_source::Span {
        veril_compile::errors::loc_span(loc, self.source_db)
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    fn check_instance(&self, inst: InstanceId) {
        let i = self.design.instances.get(inst);

        if i.name.is_bad() {
            self.sink
                .emit(errors::error_missing_name("instance", self.span_of(i.loc)));
        }
        let is_top = self.design.instances.tops.contains(&inst);
        if i.parent.is_none() && !is_top {
            self.sink.emit(errors::error_missing_parent(
                self.symbols.lookup(i.name),
                self.span_of(i.loc),
            ));
        }

        // Duplicate children in the parent's collection.
        let mut seen = HashSet::new();
        for &c in &i.children {
            if !seen.insert(c) {
                self.sink.emit(errors::error_duplicate_in_collection(
                    "instance children",
                    self.span_of(i.loc),
                ));
            }
        }
        // Duplicate parameter bindings.
        let mut names = HashSet::new();
        for (n, _) in &i.param_values {
            if !names.insert(*n) {
                self.sink.emit(errors::error_duplicate_in_collection(
                    "parameter bindings",
                    self.span_of(i.loc),
                ));
            }
        }
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    fn check_component(&self, id: ComponentId) {
        let comp = self.design.component(id);
        let comp_span = self.span_of(comp.loc);

        if comp.name.is_bad() {
            self.sink.emit(errors::error_missing_name("component", comp_span));
        }
        if comp.loc.is_unknown() {
            self.sink.emit(errors::error_missing_location(
                self.symbols.lookup(comp.name),
                comp_span,
            ));
        } else if !comp.loc.is_ordered() {
            self.sink.emit(errors::error_invalid_location(
                self.symbols.lookup(comp.name),
                comp_span,
            ));
        }
        if comp.file == veril_source::FileId::DUMMY && !comp.loc.is_unknown() {
            self.sink.emit(errors::error_missing_file(
                self.symbols.lookup(comp.name),
                comp_span,
            ));
        }

        // Signals: ordered locations inside the component's range, and
        // typespec integrity.
        for sig in comp.ports.iter().chain(comp.signals.iter()) {
            if sig.loc.is_unknown() {
                self.sink.emit(errors::error_missing_location(
                    self.symbols.lookup(sig.name),
                    comp_span,
                ));
                continue;
            }
            if !sig.loc.is_ordered() || !comp.loc.encloses(&sig.loc) {
                self.sink.emit(errors::error_invalid_location(
                    self.symbols.lookup(sig.name),
                    self.span_of(sig.loc),
                ));
            }
            if let Some(ts) = sig.typespec {
                self.check_typespec(ts, sig.name);
            } else if sig.is_interface_port() && sig.interface_def.is_none() {
                self.sink.emit(errors::error_null_typespec(
                    self.symbols.lookup(sig.name),
                    self.span_of(sig.loc),
                ));
            }
        }

        // Expressions reachable from the component.
        for (lhs, rhs) in &comp.cont_assigns {
            self.check_expr(*lhs);
            self.check_expr(*rhs);
        }
        for p in &comp.params {
            if let Some(e) = p.default {
                self.check_expr(e);
            }
        }
        for proc in &comp.processes {
            if let Some(s) = proc.compiled {
                self.check_stmt(s);
            }
        }
        for tf in comp.functions.iter().chain(comp.tasks.iter()) {
            if let Some(s) = tf.compiled {
                self.check_stmt(s);
            }
        }

        // Duplicate entries in declaration collections.
        let mut port_names = HashSet::new();
        for p in &comp.ports {
            if !p.name.is_bad() && !port_names.insert(p.name) {
                self.sink.emit(errors::error_duplicate_in_collection(
                    "ports",
                    self.span_of(p.loc),
                ));
            }
        }
    }

    // ------------------------------------------------------------------
    // Typespecs
    // ------------------------------------------------------------------

    fn check_typespec(&self, ts: veril_ir::TypespecId, owner: veril_common::Symbol) {
        let spec = self.design.typespecs.get(ts);
        let span = self.span_of(spec.loc);
        match &spec.kind {
            TypespecKind::Unsupported => {
                self.sink
                    .emit(errors::error_unsupported_typespec(self.symbols.lookup(owner), span));
            }
            TypespecKind::TypedefAlias { target: None, .. }
            | TypespecKind::ImportRef { target: None, .. } => {
                self.sink
                    .emit(errors::error_null_typespec(self.symbols.lookup(owner), span));
            }
            _ => {
                if spec.instance.is_none() && !spec.is_primitive_kind() {
                    self.sink.emit(errors::error_null_typespec(
                        self.symbols.lookup(owner),
                        span,
                    ));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions and statements
    // ------------------------------------------------------------------

    fn check_expr(&self, e: ExprId) {
        let node = self.design.exprs.get(e);
        match &node.kind {
            ExprKind::Ref { name, actual } => {
                if actual.is_none() {
                    self.sink.emit(errors::error_null_actual(
                        self.symbols.lookup(*name),
                        self.span_of(node.loc),
                    ));
                }
            }
            ExprKind::PackageRef { name, actual, .. } => {
                if actual.is_none() {
                    self.sink.emit(errors::error_null_actual(
                        self.symbols.lookup(*name),
                        self.span_of(node.loc),
                    ));
                }
            }
            // Hierarchical paths and method calls permit late resolution
            // failure; their nullness is not an integrity violation.
            ExprKind::HierPath { segments, .. } => {
                for &s in segments {
                    if let ExprKind::BitSelect { index, .. } = &self.design.exprs.get(s).kind {
                        self.check_expr(*index);
                    }
                }
            }
            ExprKind::MethodCall { receiver, args, .. } => {
                if let Some(r) = receiver {
                    self.check_expr(*r);
                }
                for &a in args {
                    self.check_expr(a);
                }
            }
            ExprKind::Operation { operands, .. } => {
                for &o in operands {
                    self.check_expr(o);
                }
            }
            ExprKind::SysCall { args, .. } => {
                for &a in args {
                    self.check_expr(a);
                }
            }
            ExprKind::BitSelect { base, index } => {
                self.check_expr(*base);
                self.check_expr(*index);
            }
            ExprKind::PartSelect {
                base, left, right, ..
            } => {
                self.check_expr(*base);
                self.check_expr(*left);
                self.check_expr(*right);
            }
            ExprKind::Concat(parts) | ExprKind::Replication(parts) => {
                for &p in parts {
                    self.check_expr(p);
                }
            }
            ExprKind::AssignmentPattern(entries) => {
                for (_, v) in entries {
                    self.check_expr(*v);
                }
            }
            ExprKind::TaggedPattern { value, .. } => {
                if let Some(v) = value {
                    self.check_expr(*v);
                }
            }
            ExprKind::Cast { operand, .. } => self.check_expr(*operand),
            ExprKind::Constant(_) | ExprKind::Unsupported => {}
        }
    }

    fn check_stmt(&self, s: StmtId) {
        let node = self.design.stmts.get(s);
        match &node.kind {
            StmtKind::Block { stmts, .. } => {
                let mut seen = HashSet::new();
                for &st in stmts {
                    if !seen.insert(st) {
                        self.sink.emit(errors::error_duplicate_in_collection(
                            "block statements",
                            self.span_of(node.loc),
                        ));
                    }
                    self.check_stmt(st);
                }
            }
            StmtKind::If {
                cond,
                then_stmt,
                else_stmt,
                ..
            } => {
                self.check_expr(*cond);
                self.check_stmt(*then_stmt);
                if let Some(e) = else_stmt {
                    self.check_stmt(*e);
                }
            }
            StmtKind::Case {
                scrutinee, items, ..
            } => {
                self.check_expr(*scrutinee);
                for item in items {
                    for &e in &item.exprs {
                        self.check_expr(e);
                    }
                    self.check_stmt(item.body);
                }
            }
            StmtKind::Assign { lhs, rhs, .. } => {
                self.check_expr(*lhs);
                self.check_expr(*rhs);
            }
            StmtKind::EventControlled { events, body } => {
                for &e in events {
                    self.check_expr(e);
                }
                self.check_stmt(*body);
            }
            StmtKind::Delayed { delay, body } => {
                self.check_expr(*delay);
                self.check_stmt(*body);
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(i) = init {
                    self.check_stmt(*i);
                }
                if let Some(c) = cond {
                    self.check_expr(*c);
                }
                if let Some(st) = step {
                    self.check_stmt(*st);
                }
                self.check_stmt(*body);
            }
            StmtKind::Foreach { array, body } => {
                // The iterated expression must carry loop variables in its
                // selects; a bare reference is an invalid foreach.
                if !has_select(self.design, *array) {
                    self.sink.emit(errors::error_invalid_foreach(
                        self.span_of(node.loc),
                    ));
                }
                self.check_stmt(*body);
            }
            StmtKind::While { cond, body, .. } => {
                self.check_expr(*cond);
                self.check_stmt(*body);
            }
            StmtKind::Repeat { count, body } => {
                self.check_expr(*count);
                self.check_stmt(*body);
            }
            StmtKind::Forever { body } => self.check_stmt(*body),
            StmtKind::Wait { cond, body } => {
                self.check_expr(*cond);
                self.check_stmt(*body);
            }
            StmtKind::Return(value) => {
                if let Some(v) = value {
                    self.check_expr(*v);
                }
            }
            StmtKind::ExprStmt(e) => self.check_expr(*e),
            StmtKind::VarDecl { init, .. } => {
                if let Some(i) = init {
                    self.check_expr(*i);
                }
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Null | StmtKind::Unsupported => {}
        }
    }
}

fn has_select(design: &Design, e: ExprId) -> bool {
    matches!(
        design.exprs.get(e).kind,
        ExprKind::BitSelect { .. } | ExprKind::PartSelect { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use veril_ast::FileContent;
    use veril_preproc::CompilationUnit;
    use veril_source::FileId;

    struct Checked {
        sink: DiagnosticSink,
    }

    fn run_all(source: &str) -> Checked {
        let mut db = SourceDb::new();
        let file = db.add_source("test.sv", source.to_string());
        let symbols = SymbolTable::new();
        let sink = DiagnosticSink::new();
        let library = symbols.register("work");
        let fc = veril_parser::parse_file(file, &db, library, &symbols, &sink);
        let unit = CompilationUnit::new(false);
        let mut design = Design::new();
        veril_compile::compile_file(&fc, &mut design, &unit, &symbols, &db, &sink);
        veril_elaborate::bind_design(&mut design, &symbols, &db, &sink);

        let mut files: HashMap<FileId, FileContent> = HashMap::new();
        files.insert(file, fc);
        let inputs = veril_elaborate::ElabInputs {
            files: &files,
            symbols: &symbols,
            source_db: &db,
            unit: &unit,
            sink: &sink,
            tops: &[],
        };
        veril_elaborate::elaborate(&mut design, &inputs);

        // Take pre-check diagnostics out so tests see only integrity output.
        let _ = sink.take_all();
        check_design(&design, &symbols, &db, &sink);
        Checked { sink }
    }

    #[test]
    fn clean_design_passes() {
        let c = run_all(
            "module leaf(input logic a, output logic y);
                assign y = ~a;
             endmodule
             module top;
                logic a, y;
                leaf u(.a(a), .y(y));
             endmodule",
        );
        assert!(
            c.sink.diagnostics().is_empty(),
            "unexpected: {:?}",
            c.sink.diagnostics().iter().map(|d| &d.message).collect::<Vec<_>>()
        );
    }

    #[test]
    fn unresolved_reference_surfaces_null_actual() {
        let c = run_all(
            "module m(output logic y);
                assign y = phantom;
             endmodule",
        );
        let diags = c.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("unresolved reference")));
    }

    #[test]
    fn unresolved_typedef_surfaces_null_typespec() {
        let c = run_all(
            "module m;
                ghost_t x;
             endmodule",
        );
        let diags = c.sink.diagnostics();
        assert!(diags
            .iter()
            .any(|d| d.message.contains("no resolved typespec")));
    }

    #[test]
    fn checker_does_not_mutate() {
        // Running the checker twice yields the same diagnostics.
        let mut db = SourceDb::new();
        let file = db.add_source(
            "t.sv",
            "module m(output logic y); assign y = phantom; endmodule".to_string(),
        );
        let symbols = SymbolTable::new();
        let sink = DiagnosticSink::new();
        let library = symbols.register("work");
        let fc = veril_parser::parse_file(file, &db, library, &symbols, &sink);
        let unit = CompilationUnit::new(false);
        let mut design = Design::new();
        veril_compile::compile_file(&fc, &mut design, &unit, &symbols, &db, &sink);
        veril_elaborate::bind_design(&mut design, &symbols, &db, &sink);
        let mut files = HashMap::new();
        files.insert(file, fc);
        let inputs = veril_elaborate::ElabInputs {
            files: &files,
            symbols: &symbols,
            source_db: &db,
            unit: &unit,
            sink: &sink,
            tops: &[],
        };
        veril_elaborate::elaborate(&mut design, &inputs);

        let _ = sink.take_all();
        check_design(&design, &symbols, &db, &sink);
        let first = sink.take_all().len();
        check_design(&design, &symbols, &db, &sink);
        let second = sink.take_all().len();
        assert_eq!(first, second);
    }

    #[test]
    fn generate_scopes_pass_integrity() {
        let c = run_all(
            "module g #(parameter int N=2)();
                for (genvar i=0; i<N; i++) wire [i:0] w;
             endmodule",
        );
        assert!(
            c.sink.diagnostics().is_empty(),
            "unexpected: {:?}",
            c.sink.diagnostics().iter().map(|d| &d.message).collect::<Vec<_>>()
        );
    }
}
