//! The compilation driver for the veril SystemVerilog front end.
//!
//! Public surface: create a [`Session`] from a [`CompileConfig`]
//! (`veril_config`), run [`start_compiler`] to produce a [`Compiler`]
//! holding the elaborated design database, then [`walk`] it with a
//! [`Listener`], compare parsed trees with [`compare_trees`], and release
//! everything with [`shutdown_compiler`].

#![warn(missing_docs)]

pub mod compare;
pub mod pipeline;
pub mod session;
pub mod walk;

pub use compare::{compare_compilations, compare_trees};
pub use pipeline::{shutdown_compiler, start_compiler, Compiler};
pub use session::Session;
pub use walk::{walk, Listener};

#[cfg(test)]
mod tests {
    use super::*;
    use veril_config::CompileConfig;
    use veril_ir::ComponentKind;

    fn session_with(sources: &[(&str, &str)]) -> Session {
        let session = Session::new(CompileConfig::from_sources(vec![]));
        for (name, content) in sources {
            session.add_source(name, content);
        }
        session
    }

    #[test]
    fn e2e_ifdef_selects_single_component() {
        // Scenario S1: `ifdef FOO selects module m; no work@n exists.
        let session = session_with(&[(
            "a.sv",
            "`define FOO\n`ifdef FOO\nmodule m; endmodule\n`else\nmodule n; endmodule\n`endif\n",
        )]);
        let compiler = start_compiler(&session).unwrap();

        let work = session.symbols.register("work");
        let m = session.symbols.register("m");
        let n = session.symbols.register("n");
        assert!(compiler.design.lookup(work, m).is_some(), "work@m exists");
        assert!(compiler.design.lookup(work, n).is_none(), "no work@n");
        shutdown_compiler(compiler);
    }

    #[test]
    fn e2e_recursive_include_single_diagnostic() {
        // Scenario S2: two files including each other yields exactly one
        // recursive-include diagnostic naming the second include.
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("x.svh"), "`include \"y.svh\"\n").unwrap();
        std::fs::write(tmp.path().join("y.svh"), "`include \"x.svh\"\n").unwrap();
        let main = tmp.path().join("top.sv");
        std::fs::write(&main, "`include \"x.svh\"\nmodule m; endmodule\n").unwrap();

        let session = Session::new(CompileConfig::from_sources(vec![main]));
        let compiler = start_compiler(&session).unwrap();

        let diags = session.sink.diagnostics();
        let recursive: Vec<_> = diags
            .iter()
            .filter(|d| d.message.contains("recursive include"))
            .collect();
        assert_eq!(recursive.len(), 1);
        assert!(recursive[0].message.contains("x.svh"));
        // The offending file was dropped, not crashed on.
        assert_eq!(compiler.files.len(), 0);
    }

    #[test]
    fn e2e_elaborates_hierarchy() {
        let session = session_with(&[(
            "design.sv",
            "module leaf(input logic a, output logic y);
                assign y = ~a;
             endmodule
             module top;
                logic a, y;
                leaf u(.a(a), .y(y));
             endmodule",
        )]);
        let compiler = start_compiler(&session).unwrap();
        assert_eq!(compiler.instance_tree().tops.len(), 1);
        let top = compiler.instance_tree().tops[0];
        let tree = compiler.instance_tree();
        assert_eq!(tree.get(top).children.len(), 1);
        let u = tree.get(top).children[0];
        assert_eq!(tree.full_path_name(u, &session.symbols), "top.u");
        assert!(!session.sink.has_errors());
        assert_eq!(compiler.library.files.len(), 1);
        assert_eq!(
            session.symbols.lookup(compiler.library.name),
            "work"
        );
    }

    #[test]
    fn e2e_parameter_override_through_driver() {
        let session = session_with(&[(
            "design.sv",
            "module m #(parameter int W=4) (input logic [W-1:0] a); endmodule
             module top; m #(.W(8)) u(); endmodule",
        )]);
        let compiler = start_compiler(&session).unwrap();
        let tree = compiler.instance_tree();
        let top = tree.tops[0];
        let u = tree.get(top).children[0];
        let w = session.symbols.register("W");
        assert_eq!(tree.get(u).value_of(w).unwrap().to_i64(), Some(8));
    }

    #[test]
    fn e2e_diagnostics_fixed_format() {
        let session = session_with(&[("bad.sv", "module m;\nwire ;\nendmodule\n")]);
        let _ = start_compiler(&session).unwrap();
        let rendered = session.render_diagnostics();
        // FILE:LINE:COL: kind: msg, then the summary.
        assert!(rendered.contains("bad.sv:2:"), "rendered: {rendered}");
        assert!(rendered.contains("error["));
        assert!(rendered.contains("(errors="));
    }

    #[test]
    fn e2e_diagnostics_sorted_by_position() {
        let session = session_with(&[(
            "multi.sv",
            "module m;\nassign a1 = ghost1;\nassign a2 = ghost2;\nendmodule\n",
        )]);
        let _ = start_compiler(&session).unwrap();
        let rendered = session.render_diagnostics();
        let p1 = rendered.find("ghost1");
        let p2 = rendered.find("ghost2");
        match (p1, p2) {
            (Some(a), Some(b)) => assert!(a < b, "sorted by position: {rendered}"),
            _ => panic!("expected both diagnostics: {rendered}"),
        }
    }

    #[test]
    fn e2e_predefined_macros() {
        let mut config = CompileConfig::from_sources(vec![]);
        config.defines.insert("SYNTHESIS".to_string(), "1".to_string());
        let session = Session::new(config);
        session.add_source(
            "a.sv",
            "`ifdef SYNTHESIS\nmodule synth; endmodule\n`else\nmodule sim; endmodule\n`endif\n",
        );
        let compiler = start_compiler(&session).unwrap();
        let work = session.symbols.register("work");
        assert!(compiler
            .design
            .lookup(work, session.symbols.register("synth"))
            .is_some());
        assert!(compiler
            .design
            .lookup(work, session.symbols.register("sim"))
            .is_none());
    }

    #[test]
    fn e2e_walk_visits_hierarchy() {
        struct Counter {
            instances: usize,
            components: usize,
            signals: usize,
        }
        impl Listener for Counter {
            fn enter_instance(&mut self, _: &veril_ir::Design, _: veril_ir::InstanceId) {
                self.instances += 1;
            }
            fn enter_component(&mut self, _: &veril_ir::Design, _: veril_ir::ComponentId) {
                self.components += 1;
            }
            fn on_signal(
                &mut self,
                _: &veril_ir::Design,
                _: veril_ir::ComponentId,
                _: &veril_ir::SignalDecl,
            ) {
                self.signals += 1;
            }
        }

        let session = session_with(&[(
            "design.sv",
            "module leaf(input logic a); endmodule
             module top; leaf u1(); leaf u2(); endmodule",
        )]);
        let compiler = start_compiler(&session).unwrap();
        let mut counter = Counter {
            instances: 0,
            components: 0,
            signals: 0,
        };
        walk(&compiler, &mut counter);
        assert_eq!(counter.instances, 3, "top + two leaves");
        assert_eq!(counter.components, 2, "leaf definition visited once");
        assert_eq!(counter.signals, 1, "leaf port a");
    }

    #[test]
    fn e2e_chunked_file_still_compiles() {
        let mut config = CompileConfig::from_sources(vec![]);
        config.options.chunk_threshold = 16;
        let session = Session::new(config);
        session.add_source(
            "big.sv",
            "module a;\nendmodule\nmodule b;\nendmodule\nmodule c; a u1(); b u2(); endmodule\n",
        );
        let compiler = start_compiler(&session).unwrap();
        let work = session.symbols.register("work");
        for name in ["a", "b", "c"] {
            assert!(
                compiler
                    .design
                    .lookup(work, session.symbols.register(name))
                    .is_some(),
                "{name} registered from its chunk"
            );
        }
        // Chunk contents carry their parent file.
        assert!(compiler
            .files
            .values()
            .any(|fc| fc.parent_file.is_some()));
    }

    #[test]
    fn e2e_component_kinds_registered() {
        let session = session_with(&[(
            "all.sv",
            "package p; endpackage
             interface i; endinterface
             program pr; endprogram
             class c; endclass
             primitive u(o, a); output o; input a; table 0 : 1 ; endtable endprimitive
             module m; endmodule",
        )]);
        let compiler = start_compiler(&session).unwrap();
        let work = session.symbols.register("work");
        let kinds: Vec<ComponentKind> = ["p", "i", "pr", "c", "u", "m"]
            .iter()
            .map(|n| {
                let id = compiler
                    .design
                    .lookup(work, session.symbols.register(n))
                    .unwrap_or_else(|| panic!("{n} registered"));
                compiler.design.component(id).kind
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ComponentKind::Package,
                ComponentKind::Interface,
                ComponentKind::Program,
                ComponentKind::Class,
                ComponentKind::Udp,
                ComponentKind::Module,
            ]
        );
    }

    #[test]
    fn e2e_reformatted_runs_compare_equal() {
        let a = session_with(&[("x.sv", "module m(input logic a); endmodule")]);
        let b = session_with(&[(
            "x.sv",
            "module m (\n    input logic a\n);\nendmodule\n",
        )]);
        let ca = start_compiler(&a).unwrap();
        let cb = start_compiler(&b).unwrap();
        assert!(compare_compilations(&ca, &cb));

        let c = session_with(&[("x.sv", "module n(input logic a); endmodule")]);
        let cc = start_compiler(&c).unwrap();
        assert!(!compare_compilations(&ca, &cc));
    }

    #[test]
    fn e2e_file_unit_mode_isolates_macros() {
        let mut config = CompileConfig::from_sources(vec![]);
        config.options.file_unit = true;
        let session = Session::new(config);
        session.add_source("a.sv", "`define ONLY_A\nmodule a; endmodule\n");
        session.add_source(
            "b.sv",
            "`ifdef ONLY_A\nmodule leaked; endmodule\n`endif\nmodule b; endmodule\n",
        );
        let compiler = start_compiler(&session).unwrap();
        let work = session.symbols.register("work");
        assert!(compiler
            .design
            .lookup(work, session.symbols.register("leaked"))
            .is_none());
        assert!(compiler
            .design
            .lookup(work, session.symbols.register("b"))
            .is_some());
    }
}
