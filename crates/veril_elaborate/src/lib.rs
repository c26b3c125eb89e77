//! Late binding and elaboration for the veril front end.
//!
//! [`bind_design`] resolves every cross-component reference (typedefs,
//! class extends, identifier uses, hierarchical paths) once all
//! declarations are registered. [`elaborate`] then instantiates the design
//! from the top modules down, propagating parameter and typedef overrides
//! on component clones and expanding generates into concrete scopes.

#![warn(missing_docs)]

pub mod bind;
pub mod elaborator;
pub mod errors;

pub use bind::{bind_design, seed_builtin_classes};
pub use elaborator::{elaborate, ElabInputs};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use veril_ast::FileContent;
    use veril_common::{Symbol, SymbolTable};
    use veril_diagnostics::DiagnosticSink;
    use veril_ir::{
        ComponentKind, Design, Direction, InstanceId, InstanceKind, TypespecKind,
    };
    use veril_preproc::CompilationUnit;
    use veril_source::{FileId, SourceDb};

    struct Elaborated {
        design: Design,
        symbols: SymbolTable,
        sink: DiagnosticSink,
    }

    fn run_pipeline(source: &str) -> Elaborated {
        let mut db = SourceDb::new();
        let file = db.add_source("test.sv", source.to_string());
        let symbols = SymbolTable::new();
        let sink = DiagnosticSink::new();
        let library = symbols.register("work");
        let fc = veril_parser::parse_file(file, &db, library, &symbols, &sink);
        let unit = CompilationUnit::new(false);
        let mut design = Design::new();
        veril_compile::compile_file(&fc, &mut design, &unit, &symbols, &db, &sink);

        bind_design(&mut design, &symbols, &db, &sink);

        let mut files: HashMap<FileId, FileContent> = HashMap::new();
        files.insert(file, fc);
        let inputs = ElabInputs {
            files: &files,
            symbols: &symbols,
            source_db: &db,
            unit: &unit,
            sink: &sink,
            tops: &[],
        };
        elaborate(&mut design, &inputs);

        Elaborated {
            design,
            symbols,
            sink,
        }
    }

    fn top_named(e: &Elaborated, name: &str) -> InstanceId {
        let sym = e.symbols.register(name);
        e.design
            .instances
            .tops
            .iter()
            .copied()
            .find(|&t| e.design.instances.get(t).name == sym)
            .unwrap_or_else(|| panic!("no top named {name}"))
    }

    fn child_named(e: &Elaborated, parent: InstanceId, name: &str) -> InstanceId {
        let sym = e.symbols.register(name);
        e.design
            .instances
            .get(parent)
            .children
            .iter()
            .copied()
            .find(|&c| e.design.instances.get(c).name == sym)
            .unwrap_or_else(|| panic!("no child named {name}"))
    }

    #[test]
    fn top_detection_excludes_instantiated_modules() {
        let e = run_pipeline(
            "module leaf; endmodule
             module top; leaf u(); endmodule",
        );
        assert_eq!(e.design.instances.tops.len(), 1);
        let top = e.design.instances.tops[0];
        assert_eq!(e.symbols.lookup(e.design.instances.get(top).name), "top");
    }

    #[test]
    fn instance_tree_paths() {
        let e = run_pipeline(
            "module leaf; endmodule
             module mid; leaf u2(); endmodule
             module top; mid u1(); endmodule",
        );
        let top = top_named(&e, "top");
        let u1 = child_named(&e, top, "u1");
        let u2 = child_named(&e, u1, "u2");
        assert_eq!(e.design.instances.full_path_name(u2, &e.symbols), "top.u1.u2");
    }

    #[test]
    fn parameter_override_applies_to_clone_only() {
        // Scenario S3: the elaborated instance sees [7:0]; the
        // unelaborated definition still reports [3:0].
        let e = run_pipeline(
            "module m #(parameter int W=4) (input logic [W-1:0] a); endmodule
             module top; m #(.W(8)) u(); endmodule",
        );
        let top = top_named(&e, "top");
        let u = child_named(&e, top, "u");
        let u_inst = e.design.instances.get(u);

        let w = e.symbols.register("W");
        assert_eq!(u_inst.value_of(w).unwrap().to_i64(), Some(8));

        // The instance's definition is a clone with the refolded range.
        let clone = u_inst.definition.unwrap();
        let port = &e.design.component(clone).ports[0];
        let ts = e.design.typespecs.get(port.typespec.unwrap());
        assert_eq!(ts.folded_vector_range(), Some((7, 0)));

        // The registered (unelaborated) definition keeps its defaults.
        let lib = e.symbols.register("work");
        let m = e.design.lookup(lib, e.symbols.register("m")).unwrap();
        assert_ne!(m, clone, "override applied on a clone");
        assert_eq!(e.design.component(m).value_of(w).unwrap().to_i64(), Some(4));
        let orig_port = &e.design.component(m).ports[0];
        let orig_ts = e.design.typespecs.get(orig_port.typespec.unwrap());
        assert_eq!(orig_ts.folded_vector_range(), Some((3, 0)));
    }

    #[test]
    fn positional_parameter_override() {
        let e = run_pipeline(
            "module m #(parameter int A=1, parameter int B=2)(); endmodule
             module top; m #(10, 20) u(); endmodule",
        );
        let top = top_named(&e, "top");
        let u = child_named(&e, top, "u");
        let inst = e.design.instances.get(u);
        assert_eq!(inst.value_of(e.symbols.register("A")).unwrap().to_i64(), Some(10));
        assert_eq!(inst.value_of(e.symbols.register("B")).unwrap().to_i64(), Some(20));
    }

    #[test]
    fn unknown_parameter_binding_diagnosed() {
        let e = run_pipeline(
            "module m #(parameter int W=4)(); endmodule
             module top; m #(.NOPE(8)) u(); endmodule",
        );
        let diags = e.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("NOPE")));
    }

    #[test]
    fn identical_parameterizations_share_no_extra_clone() {
        let e = run_pipeline(
            "module m #(parameter int W=4)(); endmodule
             module top; m u1(); m u2(); endmodule",
        );
        let top = top_named(&e, "top");
        let u1 = child_named(&e, top, "u1");
        let u2 = child_named(&e, top, "u2");
        // No overrides: both share the registered definition.
        assert_eq!(
            e.design.instances.get(u1).definition,
            e.design.instances.get(u2).definition
        );
    }

    #[test]
    fn package_typedef_instance_points_at_package() {
        // Scenario S4.
        let e = run_pipeline(
            "package p; typedef logic [7:0] byte_t; endpackage
             module m; p::byte_t x; endmodule",
        );
        let lib = e.symbols.register("work");
        let m = e.design.lookup(lib, e.symbols.register("m")).unwrap();
        let p = e.design.lookup(lib, e.symbols.register("p")).unwrap();

        let x = e.symbols.register("x");
        let sig = e.design.component(m).signal(x).expect("signal x");
        let ts = e.design.typespecs.get(sig.typespec.unwrap());
        assert_eq!(ts.instance, Some(p), "instance is the package, not the module");
        match &ts.kind {
            TypespecKind::ImportRef { target, .. } => {
                let target = target.expect("resolved");
                let resolved = e.design.typespecs.get(target);
                assert_eq!(resolved.folded_vector_range(), Some((7, 0)));
            }
            other => panic!("expected import ref, got {other:?}"),
        }
    }

    #[test]
    fn modport_direction_propagates() {
        // Scenario S5.
        let e = run_pipeline(
            "interface bus(input clk); logic [7:0] data;
             modport slave (input clk, input data);
             endinterface
             module s(bus.slave b); endmodule",
        );
        let top = top_named(&e, "s");
        let s_inst = e.design.instances.get(top);
        assert_eq!(s_inst.modport_bindings.len(), 1);
        let (port_name, iface_inst) = s_inst.modport_bindings[0];
        assert_eq!(e.symbols.lookup(port_name), "b");

        // The interface link points at the unique bus definition.
        let lib = e.symbols.register("work");
        let bus = e.design.lookup(lib, e.symbols.register("bus")).unwrap();
        assert_eq!(
            e.design.instances.get(iface_inst).definition,
            Some(bus)
        );

        // Direction of `data` through the slave modport is Input.
        let slave = e.symbols.register("slave");
        let data = e.symbols.register("data");
        let mp = e.design.component(bus).modports.get(&slave).unwrap();
        let (_, dir) = mp.ports.iter().find(|(n, _)| *n == data).unwrap();
        assert_eq!(*dir, Direction::Input);
    }

    #[test]
    fn generate_for_produces_concrete_scopes() {
        // Scenario S6: three GenScope children named g[0], g[1], g[2],
        // each with w's msb equal to i.
        let e = run_pipeline(
            "module g #(parameter int N=3)();
                for (genvar i=0; i<N; i++) wire [i:0] w;
             endmodule",
        );
        let top = top_named(&e, "g");
        let children = &e.design.instances.get(top).children;
        assert_eq!(children.len(), 3);

        for (k, &scope) in children.iter().enumerate() {
            let inst = e.design.instances.get(scope);
            assert_eq!(inst.kind, InstanceKind::GenScope);
            assert_eq!(
                e.symbols.lookup(inst.name),
                format!("g[{k}]"),
                "scope names follow the defining name"
            );
            let i_sym = e.symbols.register("i");
            assert_eq!(inst.value_of(i_sym).unwrap().to_i64(), Some(k as i64));

            // The materialized w has msb == i.
            let def = inst.definition.unwrap();
            let w = e.symbols.register("w");
            let sig = e.design.component(def).signal(w).expect("w materialized");
            let ts = e.design.typespecs.get(sig.typespec.unwrap());
            assert_eq!(ts.folded_vector_range(), Some((k as i64, 0)));
        }
    }

    #[test]
    fn labeled_generate_uses_label() {
        let e = run_pipeline(
            "module m #(parameter int N=2)();
                for (genvar i=0; i<N; i++) begin : blk
                    wire q;
                end
             endmodule",
        );
        let top = top_named(&e, "m");
        let children = &e.design.instances.get(top).children;
        assert_eq!(children.len(), 2);
        assert_eq!(
            e.symbols.lookup(e.design.instances.get(children[0]).name),
            "blk[0]"
        );
    }

    #[test]
    fn generate_if_takes_constant_branch() {
        let e = run_pipeline(
            "module m #(parameter bit FAST=1)();
                if (FAST) begin : fast_path
                    wire f;
                end else begin : slow_path
                    wire s;
                end
             endmodule",
        );
        let top = top_named(&e, "m");
        let children = &e.design.instances.get(top).children;
        assert_eq!(children.len(), 1);
        assert_eq!(
            e.symbols.lookup(e.design.instances.get(children[0]).name),
            "fast_path"
        );
    }

    #[test]
    fn generate_with_unreducible_bound_diagnosed() {
        let e = run_pipeline(
            "module m;
                logic x;
                for (genvar i=0; i<x; i++) wire w;
             endmodule",
        );
        let diags = e.sink.diagnostics();
        assert!(diags
            .iter()
            .any(|d| d.message.contains("does not reduce")));
    }

    #[test]
    fn unknown_instantiation_target_diagnosed() {
        let e = run_pipeline("module top; ghost u(); endmodule");
        let diags = e.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("ghost")));
        let top = top_named(&e, "top");
        let u = child_named(&e, top, "u");
        assert_eq!(e.design.instances.get(u).kind, InstanceKind::Unknown);
        assert!(e.design.instances.get(u).definition.is_none());
    }

    #[test]
    fn circular_instantiation_diagnosed_without_hang() {
        let e = run_pipeline(
            "module top; a u(); endmodule
             module a; b u(); endmodule
             module b; a u(); endmodule",
        );
        let diags = e.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("circular")));
    }

    #[test]
    fn base_class_resolved_through_registry() {
        let e = run_pipeline(
            "class base; endclass
             class derived extends base; endclass",
        );
        let lib = e.symbols.register("work");
        let derived = e.design.lookup(lib, e.symbols.register("derived")).unwrap();
        let (_, resolved) = e.design.component(derived).base_class.unwrap();
        let base = e.design.lookup(lib, e.symbols.register("base")).unwrap();
        assert_eq!(resolved, Some(base));
        assert!(!e.sink.has_errors());
    }

    #[test]
    fn builtin_base_class_never_errors() {
        let e = run_pipeline("class q extends queue; endclass");
        assert!(!e.sink.has_errors());
        let lib = e.symbols.register("work");
        let q = e.design.lookup(lib, e.symbols.register("q")).unwrap();
        let (_, resolved) = e.design.component(q).base_class.unwrap();
        let builtin = resolved.expect("resolved to builtin");
        assert_eq!(e.design.component(builtin).kind, ComponentKind::Class);
    }

    #[test]
    fn unknown_base_class_diagnosed() {
        let e = run_pipeline("class c extends phantom; endclass");
        let diags = e.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("phantom")));
    }

    #[test]
    fn identifier_uses_resolved_or_logged() {
        // Property P6: every reference is resolved or diagnosed.
        let e = run_pipeline(
            "module m(input logic a, output logic y);
                assign y = a & phantom_net;
             endmodule",
        );
        let diags = e.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("phantom_net")));

        // The resolved reference carries its target.
        let lib = e.symbols.register("work");
        let m = e.design.lookup(lib, e.symbols.register("m")).unwrap();
        let (_, rhs) = e.design.component(m).cont_assigns[0];
        let mut found_resolved = false;
        let mut stack = vec![rhs];
        while let Some(id) = stack.pop() {
            match &e.design.exprs.get(id).kind {
                veril_ir::ExprKind::Ref { name, actual } => {
                    if e.symbols.lookup(*name) == "a" {
                        assert!(actual.is_some(), "resolved reference has actual");
                        found_resolved = true;
                    }
                }
                veril_ir::ExprKind::Operation { operands, .. } => stack.extend(operands),
                _ => {}
            }
        }
        assert!(found_resolved);
    }

    #[test]
    fn function_locals_do_not_false_positive() {
        let e = run_pipeline(
            "module m;
                function int add(input int a, input int b);
                    int tmp;
                    tmp = a + b;
                    return tmp;
                endfunction
             endmodule",
        );
        assert!(
            !e.sink.has_errors(),
            "unexpected: {:?}",
            e.sink.diagnostics().iter().map(|d| &d.message).collect::<Vec<_>>()
        );
    }

    #[test]
    fn enum_members_resolve_as_constants() {
        let e = run_pipeline(
            "module m;
                typedef enum logic [1:0] {IDLE, RUN} state_t;
                state_t s;
                always_comb s = IDLE;
             endmodule",
        );
        assert!(
            !e.sink.has_errors(),
            "unexpected: {:?}",
            e.sink.diagnostics().iter().map(|d| &d.message).collect::<Vec<_>>()
        );
    }

    #[test]
    fn elaboration_order_is_deterministic() {
        let src = "module z_top; endmodule
                   module a_top; endmodule";
        let e1 = run_pipeline(src);
        let e2 = run_pipeline(src);
        let names1: Vec<String> = e1
            .design
            .instances
            .tops
            .iter()
            .map(|&t| e1.symbols.lookup(e1.design.instances.get(t).name).to_string())
            .collect();
        let names2: Vec<String> = e2
            .design
            .instances
            .tops
            .iter()
            .map(|&t| e2.symbols.lookup(e2.design.instances.get(t).name).to_string())
            .collect();
        assert_eq!(names1, names2);
        assert_eq!(names1, vec!["a_top", "z_top"], "tops sorted by name");
    }

    #[test]
    fn explicit_tops_override_detection() {
        let mut db = SourceDb::new();
        let file = db.add_source(
            "t.sv",
            "module a; endmodule\nmodule b; a u(); endmodule".to_string(),
        );
        let symbols = SymbolTable::new();
        let sink = DiagnosticSink::new();
        let library = symbols.register("work");
        let fc = veril_parser::parse_file(file, &db, library, &symbols, &sink);
        let unit = CompilationUnit::new(false);
        let mut design = Design::new();
        veril_compile::compile_file(&fc, &mut design, &unit, &symbols, &db, &sink);
        bind_design(&mut design, &symbols, &db, &sink);

        let mut files = HashMap::new();
        files.insert(file, fc);
        let tops = vec![symbols.register("a")];
        let inputs = ElabInputs {
            files: &files,
            symbols: &symbols,
            source_db: &db,
            unit: &unit,
            sink: &sink,
            tops: &tops,
        };
        elaborate(&mut design, &inputs);
        assert_eq!(design.instances.tops.len(), 1);
        let t = design.instances.tops[0];
        assert_eq!(symbols.lookup(design.instances.get(t).name), "a");
    }
}
