//! The component compiler of the veril front end.
//!
//! Walks each parsed file's design-element subtrees and materializes
//! declaration-level IR: components with their ports, nets, parameters,
//! typespecs, task/function signatures and bodies, modports, UDP tables,
//! processes, and instantiation records. Expression and typespec subtrees
//! are translated by the embedded type/expression compiler, with constant
//! folding in [`Reduce::Yes`] mode.
//!
//! Compilation is per-component and feeds the shared [`Design`] registry;
//! the driver serializes registry access when components compile in
//! parallel.

#![warn(missing_docs)]

pub mod component;
pub mod errors;
pub mod expr;
pub mod stmt;
pub mod types;

pub use expr::{ConstEnv, Reduce};

use veril_ast::{FileContent, NodeKind};
use veril_common::SymbolTable;
use veril_diagnostics::DiagnosticSink;
use veril_ir::{Component, ComponentId, ComponentKind, Design, SourceLoc};
use veril_preproc::CompilationUnit;
use veril_source::SourceDb;

/// Shared state for one component's compile.
pub struct Ctx<'a> {
    /// The design registry under construction.
    pub design: &'a mut Design,
    /// The file being compiled.
    pub fc: &'a FileContent,
    /// The session symbol table.
    pub symbols: &'a SymbolTable,
    /// The diagnostic sink.
    pub sink: &'a DiagnosticSink,
    /// The source database, for span reconstruction.
    pub source_db: &'a SourceDb,
    /// The compilation unit (default_nettype lookups).
    pub unit: &'a CompilationUnit,
    /// The component currently being filled.
    pub comp: ComponentId,
}

/// Compiles every design element of a parsed file into the design.
///
/// Returns the IDs of the components registered by this file, in source
/// order. Duplicate qualified names are diagnosed and skipped.
pub fn compile_file(
    fc: &FileContent,
    design: &mut Design,
    unit: &CompilationUnit,
    symbols: &SymbolTable,
    source_db: &SourceDb,
    sink: &DiagnosticSink,
) -> Vec<ComponentId> {
    let Some(root) = fc.root() else {
        return Vec::new();
    };
    let mut compiled = Vec::new();

    for child in fc.children(root) {
        let v = fc.node(child);
        let kind = match v.kind {
            NodeKind::Module => ComponentKind::Module,
            NodeKind::Interface => ComponentKind::Interface,
            NodeKind::Package => ComponentKind::Package,
            NodeKind::Program => ComponentKind::Program,
            NodeKind::Class => ComponentKind::Class,
            NodeKind::Udp => ComponentKind::Udp,
            _ => continue,
        };
        let loc = SourceLoc::of_node(v);
        let mut shell = Component::shell(kind, v.symbol, fc.library, fc.file, loc);
        shell.node = Some(child);

        match design.register(shell) {
            Ok(id) => {
                let mut ctx = Ctx {
                    design,
                    fc,
                    symbols,
                    sink,
                    source_db,
                    unit,
                    comp: id,
                };
                ctx.compile_component(child);
                compiled.push(id);
            }
            Err(_existing) => {
                sink.emit(errors::error_duplicate_design_element(
                    symbols.lookup(v.symbol),
                    errors::loc_span(loc, source_db),
                ));
            }
        }
    }
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;
    use veril_ir::{Direction, TypespecKind};
    use veril_source::SourceDb;

    struct Compiled {
        design: Design,
        symbols: SymbolTable,
        sink: DiagnosticSink,
        ids: Vec<ComponentId>,
    }

    fn compile_source(source: &str) -> Compiled {
        let mut db = SourceDb::new();
        let file = db.add_source("test.sv", source.to_string());
        let symbols = SymbolTable::new();
        let sink = DiagnosticSink::new();
        let library = symbols.register("work");
        let fc = veril_parser::parse_file(file, &db, library, &symbols, &sink);
        let unit = CompilationUnit::new(false);
        let mut design = Design::new();
        let ids = compile_file(&fc, &mut design, &unit, &symbols, &db, &sink);
        Compiled {
            design,
            symbols,
            sink,
            ids,
        }
    }

    fn find<'a>(c: &'a Compiled, name: &str) -> &'a Component {
        let sym = c.symbols.register(name);
        let lib = c.symbols.register("work");
        let id = c.design.lookup(lib, sym).expect("component registered");
        c.design.component(id)
    }

    #[test]
    fn compile_module_ports_in_declaration_order() {
        let c = compile_source(
            "module m(input logic clk, input logic rst, output logic [7:0] q);
             endmodule",
        );
        let m = find(&c, "m");
        assert_eq!(m.ports.len(), 3);
        assert_eq!(c.symbols.lookup(m.ports[0].name), "clk");
        assert_eq!(c.symbols.lookup(m.ports[2].name), "q");
        assert_eq!(m.ports[0].direction, Direction::Input);
        assert_eq!(m.ports[2].direction, Direction::Output);
    }

    #[test]
    fn port_vector_range_folds_under_defaults() {
        let c = compile_source(
            "module m #(parameter int W=4) (input logic [W-1:0] a); endmodule",
        );
        let m = find(&c, "m");
        let a = &m.ports[0];
        let ts = a.typespec.expect("typespec compiled");
        let spec = c.design.typespecs.get(ts);
        assert_eq!(spec.folded_vector_range(), Some((3, 0)));
    }

    #[test]
    fn parameters_fold_and_register() {
        let c = compile_source(
            "module m #(parameter int W = 4, localparam int W2 = W * 2)();
             endmodule",
        );
        let m = find(&c, "m");
        assert_eq!(m.params.len(), 2);
        let w = c.symbols.register("W");
        let w2 = c.symbols.register("W2");
        assert_eq!(m.value_of(w).unwrap().to_i64(), Some(4));
        assert_eq!(m.value_of(w2).unwrap().to_i64(), Some(8));
        assert!(m.params[1].local);
    }

    #[test]
    fn function_signatures_allow_forward_reference() {
        let c = compile_source(
            "module m;
                function int caller();
                    return callee() + 1;
                endfunction
                function int callee();
                    return 41;
                endfunction
             endmodule",
        );
        let m = find(&c, "m");
        assert_eq!(m.functions.len(), 2);
        assert!(m.functions.iter().all(|f| f.compiled.is_some()));
        assert!(c.sink.diagnostics().is_empty());
    }

    #[test]
    fn duplicate_function_diagnosed() {
        let c = compile_source(
            "module m;
                function int f(); return 1; endfunction
                function int f(); return 2; endfunction
             endmodule",
        );
        assert!(c.sink.has_errors());
        let m = find(&c, "m");
        assert_eq!(m.functions.len(), 1, "second definition dropped");
    }

    #[test]
    fn duplicate_task_diagnosed() {
        let c = compile_source(
            "module m;
                task t(); endtask
                task t(); endtask
             endmodule",
        );
        let diags = c.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("task `t`")));
    }

    #[test]
    fn package_typedef_compiled() {
        let c = compile_source(
            "package p;
                typedef logic [7:0] byte_t;
             endpackage",
        );
        let p = find(&c, "p");
        let byte_t = c.symbols.register("byte_t");
        let ts = *p.typedefs.get(&byte_t).expect("typedef registered");
        let spec = c.design.typespecs.get(ts);
        assert!(matches!(spec.kind, TypespecKind::Logic { .. }));
        assert_eq!(spec.folded_vector_range(), Some((7, 0)));
    }

    #[test]
    fn enum_typedef_instance_is_declaring_scope() {
        let c = compile_source(
            "package p;
                typedef enum logic [1:0] {IDLE, RUN} state_t;
             endpackage",
        );
        let p = find(&c, "p");
        let state_t = c.symbols.register("state_t");
        let ts = *p.typedefs.get(&state_t).unwrap();
        let spec = c.design.typespecs.get(ts);
        let lib = c.symbols.register("p");
        let pkg_id = c.design.lookup(c.symbols.register("work"), lib).unwrap();
        assert_eq!(spec.instance, Some(pkg_id));
        match &spec.kind {
            TypespecKind::Enum { members, .. } => assert_eq!(members.len(), 2),
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn modport_directions_recorded() {
        let c = compile_source(
            "interface bus(input clk);
                logic [7:0] data;
                modport slave (input clk, input data);
             endinterface",
        );
        let bus = find(&c, "bus");
        let slave = c.symbols.register("slave");
        let mp = bus.modports.get(&slave).expect("modport");
        assert_eq!(mp.ports.len(), 2);
        assert!(mp.ports.iter().all(|(_, d)| *d == Direction::Input));
        assert!(c.sink.diagnostics().is_empty());
    }

    #[test]
    fn modport_undefined_port_diagnosed() {
        let c = compile_source(
            "interface bus;
                logic a;
                modport m (input a, input ghost);
             endinterface",
        );
        let diags = c.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("ghost")));
    }

    #[test]
    fn modport_clocking_reference_checked() {
        let c = compile_source(
            "interface bus;
                logic clk;
                clocking cb @(posedge clk); endclocking
                modport m (clocking cb, clocking nope);
             endinterface",
        );
        let diags = c.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("nope")));
        let bus = find(&c, "bus");
        let m = bus.modports.get(&c.symbols.register("m")).unwrap();
        assert_eq!(m.clocking.len(), 1);
    }

    #[test]
    fn udp_table_rows_as_symbols() {
        let c = compile_source(
            "primitive inv(out, in);
                output out;
                input in;
                initial out = 1'b0;
                table
                    0 : 1 ;
                    1 : 0 ;
                endtable
             endprimitive",
        );
        let inv = find(&c, "inv");
        let udp = inv.udp.as_ref().expect("udp data");
        assert_eq!(udp.ports.len(), 2);
        assert_eq!(udp.rows.len(), 2);
        assert_eq!(c.symbols.lookup(udp.rows[0]), "0 : 1");
        assert!(udp.initial.is_some());
    }

    #[test]
    fn processes_and_cont_assigns_compiled() {
        let c = compile_source(
            "module m(input logic clk, input logic d, output logic q, output logic n);
                assign n = ~d;
                always_ff @(posedge clk) q <= d;
             endmodule",
        );
        let m = find(&c, "m");
        assert_eq!(m.cont_assigns.len(), 1);
        assert_eq!(m.processes.len(), 1);
        assert!(m.processes[0].compiled.is_some());
    }

    #[test]
    fn generate_scaffolding_attached_unelaborated() {
        let c = compile_source(
            "module g #(parameter int N=3)();
                for (genvar i=0; i<N; i++) wire [i:0] w;
             endmodule",
        );
        let g = find(&c, "g");
        assert_eq!(g.gen_constructs.len(), 1);
        // Not expanded at compile time: no signals materialized from it.
        assert!(g.signals.is_empty());
    }

    #[test]
    fn instantiations_recorded_with_overrides() {
        let c = compile_source(
            "module sub #(parameter int W=4)(input logic [W-1:0] a); endmodule
             module top;
                logic [7:0] x;
                sub #(.W(8)) u1(.a(x));
             endmodule",
        );
        let top = find(&c, "top");
        assert_eq!(top.sub_instances.len(), 1);
        let si = &top.sub_instances[0];
        assert_eq!(c.symbols.lookup(si.target_name), "sub");
        assert_eq!(c.symbols.lookup(si.instance_name), "u1");
        assert_eq!(si.param_overrides.len(), 1);
        assert_eq!(si.connections.len(), 1);
    }

    #[test]
    fn duplicate_design_element_diagnosed() {
        let c = compile_source(
            "module m; endmodule
             module m; endmodule",
        );
        assert!(c.sink.has_errors());
        assert_eq!(c.ids.len(), 1);
    }

    #[test]
    fn imports_recorded_in_order() {
        let c = compile_source(
            "package a; endpackage
             package b; endpackage
             module m;
                import a::*;
                import b::*;
             endmodule",
        );
        let m = find(&c, "m");
        assert_eq!(m.imports.len(), 2);
        assert_eq!(c.symbols.lookup(m.imports[0]), "a");
        assert_eq!(c.symbols.lookup(m.imports[1]), "b");
    }

    #[test]
    fn nested_class_compiled_as_sub_component() {
        let c = compile_source(
            "package p;
                class inner;
                    int x;
                endclass
             endpackage",
        );
        let p = find(&c, "p");
        assert_eq!(p.sub_components.len(), 1);
        let inner = c.design.component(p.sub_components[0]);
        assert_eq!(inner.kind, ComponentKind::Class);
        assert_eq!(inner.signals.len(), 1);
    }

    #[test]
    fn class_extends_recorded() {
        let c = compile_source(
            "class base; endclass
             class derived extends base; endclass",
        );
        let derived = find(&c, "derived");
        let (name, resolved) = derived.base_class.expect("extends recorded");
        assert_eq!(c.symbols.lookup(name), "base");
        assert!(resolved.is_none(), "resolution happens in the binder");
    }

    #[test]
    fn builtin_method_redefinition_diagnosed() {
        let c = compile_source(
            "class c;
                function int randomize(); return 0; endfunction
             endclass",
        );
        let diags = c.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("randomize")));
    }

    #[test]
    fn unspecified_non_ansi_port_diagnosed() {
        let c = compile_source(
            "module m(a, b);
                input logic a;
             endmodule",
        );
        let diags = c.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("`b`")));
        let m = find(&c, "m");
        assert_eq!(m.ports.len(), 2, "both header ports materialized");
    }

    #[test]
    fn interface_port_header_recorded() {
        let c = compile_source(
            "interface bus; logic d; modport slave(input d); endinterface
             module s(bus.slave b); endmodule",
        );
        let s = find(&c, "s");
        assert_eq!(s.ports.len(), 1);
        let b = &s.ports[0];
        assert!(b.is_interface_port());
        assert_eq!(c.symbols.lookup(b.interface_name.unwrap()), "bus");
        assert_eq!(c.symbols.lookup(b.modport.unwrap()), "slave");
    }
}
