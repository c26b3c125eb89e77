//! The per-component compiler.
//!
//! Walks a component's AST subtree and fills its declaration-level IR in
//! three phases:
//!
//! 1. **FUNCTION**: package imports and task/function *signatures*, so
//!    bodies can forward-reference any task or function of the component.
//! 2. **DEFINITION**: parameters, ports, nets, typedefs, modports, UDP
//!    tables, nested component headers.
//! 3. **OTHER**: processes, continuous assigns, generate scaffolding,
//!    instantiations, assertions, and the deferred task/function bodies.
//!
//! Nested classes are not descended into inline; each is compiled as its
//! own component and linked through `sub_components`.

use crate::errors;
use crate::expr::{ConstEnv, Reduce};
use crate::Ctx;
use std::collections::HashMap;
use veril_ast::{NodeId, NodeKind};
use veril_common::Symbol;
use veril_ir::{
    Component, ComponentKind, Direction, Modport, Parameter, Process, ProcessKind, SignalDecl,
    SourceLoc, StmtKind, StmtNode, SubInstance, Tf, TypespecKind, UdpData,
};
use veril_preproc::NetType;

/// Method names reserved by the built-in class machinery.
const BUILTIN_METHODS: &[&str] = &["randomize", "pre_randomize", "post_randomize", "srandom"];

impl Ctx<'_> {
    /// Runs the three-phase compile for the component rooted at `node`.
    pub fn compile_component(&mut self, node: NodeId) {
        // Phase FUNCTION
        self.collect_imports(node);
        self.collect_tf_signatures(node);

        // Phase DEFINITION
        let mut env = ConstEnv::new();
        self.compile_parameters(node, &mut env);
        self.compile_ports(node, &env);
        self.compile_declarations(node, &env);
        if self.design.component(self.comp).kind == ComponentKind::Interface {
            self.compile_interface_details(node, &env);
        }
        if self.design.component(self.comp).kind == ComponentKind::Udp {
            self.compile_udp_details(node, &env);
        }
        self.compile_extends(node);
        self.compile_nested_components(node);

        // Phase OTHER
        self.compile_processes(node, &env);
        self.compile_cont_assigns(node, &env);
        self.collect_generates(node);
        self.compile_instantiations(node, &env);
        self.compile_tf_bodies(&env);
        self.check_duplicate_declarations(node);
    }

    // ========================================================================
    // Phase FUNCTION
    // ========================================================================

    fn collect_imports(&mut self, node: NodeId) {
        let mut imports = Vec::new();
        for imp in self.fc.children_of_kind(node, NodeKind::Import) {
            for scope in self.fc.children_of_kind(imp, NodeKind::PackageScope) {
                imports.push(self.fc.node(scope).symbol);
            }
        }
        self.design.component_mut(self.comp).imports = imports;
    }

    fn collect_tf_signatures(&mut self, node: NodeId) {
        let is_class = self.design.component(self.comp).kind == ComponentKind::Class;
        let empty = ConstEnv::new();
        for tf_node in self.fc.children(node) {
            let v = self.fc.node(tf_node);
            let is_task = match v.kind {
                NodeKind::FunctionDecl => false,
                NodeKind::TaskDecl => true,
                _ => continue,
            };
            let name = v.symbol;
            let loc = SourceLoc::of_node(v);

            if is_class && BUILTIN_METHODS.contains(&self.symbols.lookup(name)) {
                let span = errors::loc_span(loc, self.source_db);
                self.sink
                    .emit(errors::error_redefine_builtin(self.symbols.lookup(name), span));
                continue;
            }

            let prev_loc = {
                let comp = self.design.component(self.comp);
                if is_task {
                    comp.task(name).map(|t| t.loc)
                } else {
                    comp.function(name).map(|f| f.loc)
                }
            };
            if let Some(prev) = prev_loc {
                let code = if is_task { errors::E305 } else { errors::E306 };
                let what = if is_task { "task" } else { "function" };
                self.sink.emit(errors::error_multiply_defined(
                    code,
                    what,
                    self.symbols.lookup(name),
                    errors::loc_span(loc, self.source_db),
                    errors::loc_span(prev, self.source_db),
                ));
                continue;
            }

            let return_type = if is_task {
                None
            } else {
                self.fc
                    .child_of_kind(tf_node, NodeKind::DataType)
                    .map(|t| self.compile_data_type(t, &empty))
            };
            let mut ports = Vec::new();
            for p in self.fc.children_of_kind(tf_node, NodeKind::TfPort) {
                let dir = self
                    .fc
                    .child_of_kind(p, NodeKind::Direction)
                    .map(|d| self.fc.node(d).symbol)
                    .unwrap_or_else(|| self.symbols.register("input"));
                let ts = self
                    .fc
                    .child_of_kind(p, NodeKind::DataType)
                    .map(|t| self.compile_data_type(t, &empty));
                let pname = self
                    .fc
                    .child_of_kind(p, NodeKind::Declarator)
                    .map(|d| self.fc.node(d).symbol)
                    .unwrap_or(Symbol::BAD);
                ports.push((pname, dir, ts));
            }

            let tf = Tf {
                name,
                is_task,
                return_type,
                ports,
                body: Some(tf_node),
                compiled: None,
                loc,
            };
            let comp = self.design.component_mut(self.comp);
            if is_task {
                comp.tasks.push(tf);
            } else {
                comp.functions.push(tf);
            }
        }
    }

    // ========================================================================
    // Phase DEFINITION
    // ========================================================================

    fn compile_parameters(&mut self, node: NodeId, env: &mut ConstEnv) {
        let mut param_nodes = Vec::new();
        if let Some(list) = self.fc.child_of_kind(node, NodeKind::ParamPortList) {
            param_nodes.extend(self.fc.children(list));
        }
        for c in self.fc.children(node) {
            if matches!(
                self.fc.node(c).kind,
                NodeKind::Parameter | NodeKind::Localparam | NodeKind::TypeParameter
            ) {
                param_nodes.push(c);
            }
        }

        let mut params = Vec::new();
        for p in param_nodes {
            let v = self.fc.node(p);
            let loc = SourceLoc::of_node(v);
            match v.kind {
                NodeKind::Parameter | NodeKind::Localparam => {
                    let typespec = self
                        .fc
                        .child_of_kind(p, NodeKind::DataType)
                        .map(|t| self.compile_data_type(t, env));
                    let default_node = self.fc.children(p).into_iter().find(|&c| {
                        !matches!(
                            self.fc.node(c).kind,
                            NodeKind::DataType | NodeKind::UnpackedDimension
                        )
                    });
                    let value = default_node.map(|d| self.eval_const(d, env));
                    let default = default_node.map(|d| self.compile_expr(d, env, Reduce::No));
                    if let Some(val) = &value {
                        if val.valid {
                            env.insert(v.symbol, val.clone());
                        }
                    }
                    params.push(Parameter {
                        name: v.symbol,
                        local: v.kind == NodeKind::Localparam,
                        is_type: false,
                        typespec,
                        default,
                        value: value.filter(|x| x.valid),
                        type_default: None,
                        loc,
                    });
                }
                NodeKind::TypeParameter => {
                    let type_default = self
                        .fc
                        .child_of_kind(p, NodeKind::DataType)
                        .map(|t| self.compile_data_type(t, env));
                    params.push(Parameter {
                        name: v.symbol,
                        local: false,
                        is_type: true,
                        typespec: None,
                        default: None,
                        value: None,
                        type_default,
                        loc,
                    });
                }
                _ => {}
            }
        }
        self.design.component_mut(self.comp).params = params;
    }

    fn nettype_symbol(&self, nt: NetType) -> Symbol {
        let text = match nt {
            NetType::Wire | NetType::None => "wire",
            NetType::Tri => "tri",
            NetType::Tri0 => "tri0",
            NetType::Tri1 => "tri1",
            NetType::Wand => "wand",
            NetType::Wor => "wor",
            NetType::Trireg => "trireg",
            NetType::Uwire => "uwire",
        };
        self.symbols.register(text)
    }

    fn compile_ports(&mut self, node: NodeId, env: &ConstEnv) {
        let comp_kind = self.design.component(self.comp).kind;
        let header = if comp_kind == ComponentKind::Udp {
            self.fc.child_of_kind(node, NodeKind::UdpPortList)
        } else {
            self.fc.child_of_kind(node, NodeKind::PortList)
        };
        let Some(header) = header else {
            return;
        };

        let refs = self.fc.children_of_kind(header, NodeKind::PortRef);
        if !refs.is_empty() {
            self.compile_non_ansi_ports(node, header, env);
            return;
        }

        let mut ports = Vec::new();
        let mut carry_dir = Direction::Unspecified;
        let mut missing_type: Vec<Symbol> = Vec::new();

        for group in self.fc.children_of_kind(header, NodeKind::Port) {
            let gv = self.fc.node(group);
            let dir = match self.fc.child_of_kind(group, NodeKind::Direction) {
                Some(d) => {
                    let parsed =
                        Direction::parse(self.symbols.lookup(self.fc.node(d).symbol))
                            .unwrap_or(Direction::Unspecified);
                    carry_dir = parsed;
                    parsed
                }
                None => carry_dir,
            };

            let iface_hdr = self.fc.child_of_kind(group, NodeKind::InterfacePortHeader);
            let dt = self.fc.child_of_kind(group, NodeKind::DataType);

            if iface_hdr.is_none() && dt.is_none() && dir == Direction::Unspecified {
                if let Some(d) = self.fc.child_of_kind(group, NodeKind::Declarator) {
                    let span =
                        errors::loc_span(SourceLoc::of_node(self.fc.node(d)), self.source_db);
                    self.sink.emit(errors::error_port_missing_direction(
                        self.symbols.lookup(self.fc.node(d).symbol),
                        span,
                    ));
                }
            }

            let default_nt = self
                .unit
                .default_nettype_at(self.fc.node(node).file, gv.line);
            let (net_type, typespec, implicit) = match dt {
                Some(t) => {
                    let sym = self.fc.node(t).symbol;
                    let ts = self.compile_data_type(t, env);
                    let nt = if sym.is_bad() {
                        self.nettype_symbol(default_nt)
                    } else {
                        sym
                    };
                    (nt, Some(ts), false)
                }
                None => (self.nettype_symbol(default_nt), None, true),
            };

            let (iface_name, modport) = match iface_hdr {
                Some(h) => {
                    let mp = self
                        .fc
                        .child_of_kind(h, NodeKind::Identifier)
                        .map(|m| self.fc.node(m).symbol);
                    (Some(self.fc.node(h).symbol), mp)
                }
                None => (None, None),
            };

            for d in self.fc.children_of_kind(group, NodeKind::Declarator) {
                let dn = self.fc.node(d);
                let mut sig = SignalDecl::new(dn.symbol, dir, net_type, SourceLoc::of_node(dn));
                sig.node = Some(d);
                sig.typespec = typespec;
                sig.interface_name = iface_name;
                sig.modport = modport;
                sig.unpacked_dims = self.fc.children_of_kind(d, NodeKind::UnpackedDimension);
                if let Some(t) = dt {
                    sig.packed_dims = self.fc.children_of_kind(t, NodeKind::PackedDimension);
                }
                let init = self
                    .fc
                    .children(d)
                    .into_iter()
                    .find(|&c| !matches!(self.fc.node(c).kind, NodeKind::UnpackedDimension));
                if let Some(i) = init {
                    sig.default_value = Some(self.compile_expr(i, env, Reduce::No));
                }
                if implicit
                    && default_nt == NetType::None
                    && matches!(dir, Direction::Output | Direction::Inout)
                {
                    missing_type.push(dn.symbol);
                }
                ports.push(sig);
            }
        }

        if let Some(first) = missing_type.first() {
            let loc = self.design.component(self.comp).loc;
            self.sink.emit(errors::error_port_missing_type(
                missing_type.len(),
                self.symbols.lookup(*first),
                errors::loc_span(loc, self.source_db),
            ));
        }
        self.design.component_mut(self.comp).ports = ports;
    }

    /// Non-ANSI ports: header names plus body declarations, stitched in
    /// header order.
    fn compile_non_ansi_ports(&mut self, node: NodeId, header: NodeId, env: &ConstEnv) {
        struct DeclInfo {
            dir: Direction,
            net_type: Symbol,
            typespec: Option<veril_ir::TypespecId>,
            packed_dims: Vec<NodeId>,
            node: NodeId,
        }
        let mut decls: HashMap<Symbol, DeclInfo> = HashMap::new();

        for decl in self.fc.children_of_kind(node, NodeKind::NonAnsiPortDecl) {
            let dir = self
                .fc
                .child_of_kind(decl, NodeKind::Direction)
                .and_then(|d| Direction::parse(self.symbols.lookup(self.fc.node(d).symbol)))
                .unwrap_or(Direction::Unspecified);
            let dt = self.fc.child_of_kind(decl, NodeKind::DataType);
            let default_nt = self
                .unit
                .default_nettype_at(self.fc.node(decl).file, self.fc.node(decl).line);
            let (net_type, typespec, packed_dims) = match dt {
                Some(t) => {
                    let sym = self.fc.node(t).symbol;
                    let ts = self.compile_data_type(t, env);
                    let nt = if sym.is_bad() {
                        self.nettype_symbol(default_nt)
                    } else {
                        sym
                    };
                    (nt, Some(ts), self.fc.children_of_kind(t, NodeKind::PackedDimension))
                }
                None => (self.nettype_symbol(default_nt), None, Vec::new()),
            };
            for d in self.fc.children_of_kind(decl, NodeKind::Declarator) {
                decls.insert(
                    self.fc.node(d).symbol,
                    DeclInfo {
                        dir,
                        net_type,
                        typespec,
                        packed_dims: packed_dims.clone(),
                        node: d,
                    },
                );
            }
        }

        let mut ports = Vec::new();
        for r in self.fc.children_of_kind(header, NodeKind::PortRef) {
            let rv = self.fc.node(r);
            match decls.remove(&rv.symbol) {
                Some(info) => {
                    let dn = self.fc.node(info.node);
                    let mut sig =
                        SignalDecl::new(rv.symbol, info.dir, info.net_type, SourceLoc::of_node(dn));
                    sig.node = Some(info.node);
                    sig.typespec = info.typespec;
                    sig.packed_dims = info.packed_dims;
                    sig.unpacked_dims =
                        self.fc.children_of_kind(info.node, NodeKind::UnpackedDimension);
                    ports.push(sig);
                }
                None => {
                    let span = errors::loc_span(SourceLoc::of_node(rv), self.source_db);
                    self.sink.emit(errors::error_unspecified_port(
                        self.symbols.lookup(rv.symbol),
                        span,
                    ));
                    let wire = self.symbols.register("wire");
                    ports.push(SignalDecl::new(
                        rv.symbol,
                        Direction::Unspecified,
                        wire,
                        SourceLoc::of_node(rv),
                    ));
                }
            }
        }
        self.design.component_mut(self.comp).ports = ports;
    }

    /// Compiles one net/variable declaration item into signals.
    ///
    /// Also used by the elaborator when materializing generate-scope
    /// declarations under a concrete parameter environment.
    pub fn compile_decl_item(&mut self, c: NodeId, env: &ConstEnv) -> Vec<SignalDecl> {
        let dt = self.fc.child_of_kind(c, NodeKind::DataType);
        let (net_type, ts, packed) = match dt {
            Some(t) => {
                let sym = self.fc.node(t).symbol;
                let ts = self.compile_data_type(t, env);
                let nt = if sym.is_bad() {
                    self.symbols.register("wire")
                } else {
                    sym
                };
                (nt, Some(ts), self.fc.children_of_kind(t, NodeKind::PackedDimension))
            }
            None => (self.symbols.register("wire"), None, Vec::new()),
        };
        let mut signals = Vec::new();
        for d in self.fc.children_of_kind(c, NodeKind::Declarator) {
            let dn = self.fc.node(d);
            let mut sig = SignalDecl::new(
                dn.symbol,
                Direction::Unspecified,
                net_type,
                SourceLoc::of_node(dn),
            );
            sig.node = Some(d);
            sig.typespec = ts;
            sig.packed_dims = packed.clone();
            sig.unpacked_dims = self.fc.children_of_kind(d, NodeKind::UnpackedDimension);
            let init = self
                .fc
                .children(d)
                .into_iter()
                .find(|&cc| !matches!(self.fc.node(cc).kind, NodeKind::UnpackedDimension));
            if let Some(i) = init {
                sig.default_value = Some(self.compile_expr(i, env, Reduce::No));
            }
            signals.push(sig);
        }
        signals
    }

    fn compile_declarations(&mut self, node: NodeId, env: &ConstEnv) {
        let mut signals = Vec::new();
        let mut typedefs: Vec<(Symbol, veril_ir::TypespecId, bool)> = Vec::new();

        for c in self.fc.children(node) {
            let v = self.fc.node(c);
            match v.kind {
                NodeKind::NetDecl | NodeKind::VarDecl => {
                    signals.extend(self.compile_decl_item(c, env));
                }
                NodeKind::GenvarDecl => {
                    let genvar = self.symbols.register("genvar");
                    for d in self.fc.children_of_kind(c, NodeKind::Declarator) {
                        let dn = self.fc.node(d);
                        signals.push(SignalDecl::new(
                            dn.symbol,
                            Direction::Unspecified,
                            genvar,
                            SourceLoc::of_node(dn),
                        ));
                    }
                }
                NodeKind::Typedef => {
                    if let Some(t) = self.fc.child_of_kind(c, NodeKind::DataType) {
                        let ts = self.compile_data_type(t, env);
                        let named_type = matches!(
                            self.design.typespecs.get(ts).kind,
                            TypespecKind::Enum { .. }
                                | TypespecKind::Struct { .. }
                                | TypespecKind::Union { .. }
                        );
                        typedefs.push((v.symbol, ts, named_type));
                    }
                }
                _ => {}
            }
        }

        let comp = self.design.component_mut(self.comp);
        comp.signals.extend(signals);
        for (name, ts, named) in typedefs {
            comp.typedefs.insert(name, ts);
            if named {
                comp.data_types.insert(name, ts);
            }
        }
    }

    fn compile_interface_details(&mut self, node: NodeId, _env: &ConstEnv) {
        let clocking_names: Vec<Symbol> = self
            .fc
            .children_of_kind(node, NodeKind::ClockingBlock)
            .into_iter()
            .map(|cb| self.fc.node(cb).symbol)
            .collect();

        let mut modports = Vec::new();
        for mp in self.fc.children_of_kind(node, NodeKind::Modport) {
            let mv = self.fc.node(mp);
            let mut modport = Modport {
                name: mv.symbol,
                ports: Vec::new(),
                clocking: Vec::new(),
                loc: SourceLoc::of_node(mv),
            };
            for port in self.fc.children_of_kind(mp, NodeKind::ModportPort) {
                let pv = self.fc.node(port);
                let is_clocking = self
                    .fc
                    .child_of_kind(port, NodeKind::ClockingItem)
                    .is_some();
                if is_clocking {
                    if clocking_names.contains(&pv.symbol) {
                        modport.clocking.push(pv.symbol);
                    } else {
                        let span =
                            errors::loc_span(SourceLoc::of_node(pv), self.source_db);
                        self.sink.emit(errors::error_modport_undefined_clocking(
                            self.symbols.lookup(pv.symbol),
                            self.symbols.lookup(mv.symbol),
                            span,
                        ));
                    }
                    continue;
                }
                let dir = self
                    .fc
                    .child_of_kind(port, NodeKind::Direction)
                    .and_then(|d| Direction::parse(self.symbols.lookup(self.fc.node(d).symbol)))
                    .unwrap_or(Direction::Inout);
                let known = self.design.component(self.comp).signal(pv.symbol).is_some();
                if !known {
                    let span = errors::loc_span(SourceLoc::of_node(pv), self.source_db);
                    self.sink.emit(errors::error_modport_undefined_port(
                        self.symbols.lookup(pv.symbol),
                        self.symbols.lookup(mv.symbol),
                        span,
                    ));
                }
                modport.ports.push((pv.symbol, dir));
            }
            modports.push(modport);
        }

        let comp = self.design.component_mut(self.comp);
        for m in modports {
            comp.modports.insert(m.name, m);
        }
    }

    fn compile_udp_details(&mut self, node: NodeId, env: &ConstEnv) {
        let ports = self
            .fc
            .child_of_kind(node, NodeKind::UdpPortList)
            .map(|l| {
                self.fc
                    .children_of_kind(l, NodeKind::PortRef)
                    .into_iter()
                    .map(|p| self.fc.node(p).symbol)
                    .collect()
            })
            .unwrap_or_default();

        let initial = self
            .fc
            .child_of_kind(node, NodeKind::UdpInitial)
            .and_then(|i| self.fc.children(i).last().copied())
            .map(|value| self.compile_expr(value, env, Reduce::Yes));

        let rows = self
            .fc
            .child_of_kind(node, NodeKind::UdpTable)
            .map(|t| {
                self.fc
                    .children_of_kind(t, NodeKind::UdpTableEntry)
                    .into_iter()
                    .map(|e| self.fc.node(e).symbol)
                    .collect()
            })
            .unwrap_or_default();

        self.design.component_mut(self.comp).udp = Some(UdpData {
            initial,
            ports,
            rows,
        });
    }

    fn compile_extends(&mut self, node: NodeId) {
        if let Some(ext) = self.fc.child_of_kind(node, NodeKind::Extends) {
            let base = self.fc.node(ext).symbol;
            self.design.component_mut(self.comp).base_class = Some((base, None));
        }
    }

    fn compile_nested_components(&mut self, node: NodeId) {
        let mut seen: HashMap<Symbol, SourceLoc> = HashMap::new();
        for c in self.fc.children_of_kind(node, NodeKind::Class) {
            let v = self.fc.node(c);
            let loc = SourceLoc::of_node(v);
            if let Some(prev) = seen.get(&v.symbol) {
                self.sink.emit(errors::error_multiply_defined(
                    errors::E309,
                    "inner class",
                    self.symbols.lookup(v.symbol),
                    errors::loc_span(loc, self.source_db),
                    errors::loc_span(*prev, self.source_db),
                ));
                continue;
            }
            seen.insert(v.symbol, loc);

            let (library, file) = {
                let comp = self.design.component(self.comp);
                (comp.library, comp.file)
            };
            let mut shell = Component::shell(ComponentKind::Class, v.symbol, library, file, loc);
            shell.node = Some(c);
            let sub_id = self.design.add_unregistered(shell);
            self.design.component_mut(self.comp).sub_components.push(sub_id);

            let outer = self.comp;
            self.comp = sub_id;
            self.compile_component(c);
            self.comp = outer;
        }
    }

    // ========================================================================
    // Phase OTHER
    // ========================================================================

    fn compile_processes(&mut self, node: NodeId, env: &ConstEnv) {
        let mut processes = Vec::new();
        for c in self.fc.children(node) {
            let v = self.fc.node(c);
            let kind = match v.kind {
                NodeKind::AlwaysBlock => ProcessKind::Always,
                NodeKind::AlwaysComb => ProcessKind::AlwaysComb,
                NodeKind::AlwaysFf => ProcessKind::AlwaysFf,
                NodeKind::AlwaysLatch => ProcessKind::AlwaysLatch,
                NodeKind::InitialBlock => ProcessKind::Initial,
                NodeKind::FinalBlock => ProcessKind::Final,
                _ => continue,
            };
            let Some(&body) = self.fc.children(c).first() else {
                continue;
            };
            let compiled = Some(self.compile_stmt(body, env));
            processes.push(Process {
                kind,
                body,
                compiled,
                loc: SourceLoc::of_node(v),
            });
        }
        self.design.component_mut(self.comp).processes = processes;
    }

    fn compile_cont_assigns(&mut self, node: NodeId, env: &ConstEnv) {
        let mut assigns = Vec::new();
        for c in self.fc.children_of_kind(node, NodeKind::ContAssign) {
            let children = self.fc.children(c);
            if children.len() < 2 {
                continue;
            }
            let lhs = self.compile_expr(children[0], env, Reduce::No);
            let rhs = self.compile_expr(children[1], env, Reduce::No);
            assigns.push((lhs, rhs));
        }
        self.design.component_mut(self.comp).cont_assigns = assigns;
    }

    fn collect_generates(&mut self, node: NodeId) {
        let mut constructs = Vec::new();
        for c in self.fc.children(node) {
            let v = self.fc.node(c);
            if matches!(
                v.kind,
                NodeKind::GenerateRegion
                    | NodeKind::GenFor
                    | NodeKind::GenIf
                    | NodeKind::GenCase
                    | NodeKind::GenBlock
            ) {
                self.check_no_modport_in_generate(c);
                constructs.push(c);
            }
        }
        self.design.component_mut(self.comp).gen_constructs = constructs;
    }

    fn check_no_modport_in_generate(&self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            for c in self.fc.children(n) {
                let v = self.fc.node(c);
                if v.kind == NodeKind::Modport {
                    let span = errors::loc_span(SourceLoc::of_node(v), self.source_db);
                    self.sink.emit(errors::error_modport_in_generate(span));
                }
                stack.push(c);
            }
        }
    }

    /// Compiles one instantiation statement into sub-instance records.
    ///
    /// Also used by the elaborator for instantiations inside generate
    /// scopes.
    pub fn compile_instantiation_item(
        &mut self,
        inst: NodeId,
        env: &ConstEnv,
    ) -> Vec<SubInstance> {
        let iv = self.fc.node(inst);
        let mut overrides = Vec::new();
        for pa in self.fc.children_of_kind(inst, NodeKind::ParamAssignment) {
            let pv = self.fc.node(pa);
            if let Some(&e) = self.fc.children(pa).first() {
                overrides.push((pv.symbol, self.compile_expr(e, env, Reduce::No)));
            }
        }
        let mut subs = Vec::new();
        for hier in self.fc.children_of_kind(inst, NodeKind::HierInstance) {
            let hv = self.fc.node(hier);
            let mut connections = Vec::new();
            for conn in self.fc.children_of_kind(hier, NodeKind::PortConnection) {
                let cv = self.fc.node(conn);
                let expr = self
                    .fc
                    .children(conn)
                    .first()
                    .map(|&e| self.compile_expr(e, env, Reduce::No));
                connections.push((cv.symbol, expr));
            }
            subs.push(SubInstance {
                target_name: iv.symbol,
                instance_name: hv.symbol,
                param_overrides: overrides.clone(),
                connections,
                node: inst,
                loc: SourceLoc::of_node(hv),
            });
        }
        subs
    }

    fn compile_instantiations(&mut self, node: NodeId, env: &ConstEnv) {
        let mut subs = Vec::new();
        let mut inst_nodes = self.fc.children_of_kind(node, NodeKind::Instantiation);
        // `bind target mod inst(...);` contributes its instantiation too.
        for b in self.fc.children_of_kind(node, NodeKind::Bind) {
            if let Some(inner) = self.fc.child_of_kind(b, NodeKind::Instantiation) {
                inst_nodes.push(inner);
            }
        }
        for inst in inst_nodes {
            subs.extend(self.compile_instantiation_item(inst, env));
        }
        self.design.component_mut(self.comp).sub_instances = subs;
    }

    fn compile_tf_bodies(&mut self, env: &ConstEnv) {
        let tf_nodes: Vec<(bool, usize, NodeId)> = {
            let comp = self.design.component(self.comp);
            comp.functions
                .iter()
                .enumerate()
                .filter_map(|(i, f)| f.body.map(|b| (false, i, b)))
                .chain(
                    comp.tasks
                        .iter()
                        .enumerate()
                        .filter_map(|(i, t)| t.body.map(|b| (true, i, b))),
                )
                .collect()
        };

        for (is_task, idx, body_node) in tf_nodes {
            let stmt_children: Vec<NodeId> = self
                .fc
                .children(body_node)
                .into_iter()
                .filter(|&c| {
                    !matches!(
                        self.fc.node(c).kind,
                        NodeKind::DataType | NodeKind::TfPort
                    )
                })
                .collect();
            let stmts: Vec<_> = stmt_children
                .into_iter()
                .map(|s| self.compile_stmt(s, env))
                .collect();
            let loc = SourceLoc::of_node(self.fc.node(body_node));
            let block = self.design.add_stmt(StmtNode::new(
                StmtKind::Block {
                    label: None,
                    stmts,
                    parallel: false,
                },
                loc,
            ));
            let comp = self.design.component_mut(self.comp);
            if is_task {
                comp.tasks[idx].compiled = Some(block);
            } else {
                comp.functions[idx].compiled = Some(block);
            }
        }
    }

    fn check_duplicate_declarations(&mut self, node: NodeId) {
        let mut properties: HashMap<Symbol, SourceLoc> = HashMap::new();
        let mut constraints: HashMap<Symbol, SourceLoc> = HashMap::new();
        let mut covergroups: HashMap<Symbol, SourceLoc> = HashMap::new();

        for c in self.fc.children(node) {
            let v = self.fc.node(c);
            let loc = SourceLoc::of_node(v);
            let (map, code, what): (&mut HashMap<_, _>, _, _) = match v.kind {
                NodeKind::PropertyDecl | NodeKind::SequenceDecl => {
                    (&mut properties, errors::E304, "property")
                }
                NodeKind::Constraint => (&mut constraints, errors::E307, "constraint"),
                NodeKind::Covergroup => (&mut covergroups, errors::E308, "covergroup"),
                _ => continue,
            };
            if let Some(prev) = map.get(&v.symbol) {
                self.sink.emit(errors::error_multiply_defined(
                    code,
                    what,
                    self.symbols.lookup(v.symbol),
                    errors::loc_span(loc, self.source_db),
                    errors::loc_span(*prev, self.source_db),
                ));
            } else {
                map.insert(v.symbol, loc);
            }
        }
    }
}
