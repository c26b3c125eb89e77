//! Design components: the declaration-level IR of modules, interfaces,
//! programs, packages, classes, and UDPs.

use crate::ids::{ComponentId, ExprId, TypespecId};
use crate::loc::SourceLoc;
use crate::signal::SignalDecl;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use veril_ast::NodeId;
use veril_common::Symbol;
use veril_source::FileId;

/// The kind of a design component.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ComponentKind {
    /// A module.
    Module,
    /// An interface.
    Interface,
    /// A program block.
    Program,
    /// A package.
    Package,
    /// A user-defined primitive.
    Udp,
    /// A class definition.
    Class,
    /// A file's unit scope acting as an anonymous package
    /// (`$unit` declarations).
    FileUnit,
}

/// A compiled parameter (value or type parameter).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parameter {
    /// The parameter name.
    pub name: Symbol,
    /// Whether declared `localparam`.
    pub local: bool,
    /// Whether this is a `parameter type`.
    pub is_type: bool,
    /// Declared typespec, when written.
    pub typespec: Option<TypespecId>,
    /// Default value expression, when written.
    pub default: Option<ExprId>,
    /// The folded default value in the unelaborated definition's context.
    pub value: Option<crate::value::Value>,
    /// Default type for type parameters.
    pub type_default: Option<TypespecId>,
    /// Source location.
    pub loc: SourceLoc,
}

/// A task or function signature (body kept as AST).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tf {
    /// The task/function name.
    pub name: Symbol,
    /// `true` for tasks, `false` for functions.
    pub is_task: bool,
    /// Return typespec for functions (functions without one return logic).
    pub return_type: Option<TypespecId>,
    /// `(name, direction keyword, typespec)` per formal, in order.
    pub ports: Vec<(Symbol, Symbol, Option<TypespecId>)>,
    /// The body's AST node. Kept through phase FUNCTION so bodies can be
    /// compiled after every signature in the component is known.
    pub body: Option<NodeId>,
    /// The compiled body, filled in phase OTHER.
    pub compiled: Option<crate::stmt::StmtId>,
    /// Source location.
    pub loc: SourceLoc,
}

/// A modport of an interface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Modport {
    /// The modport name.
    pub name: Symbol,
    /// `(signal name, direction)` pairs in declaration order.
    pub ports: Vec<(Symbol, crate::signal::Direction)>,
    /// Clocking-block names referenced by this modport.
    pub clocking: Vec<Symbol>,
    /// Source location.
    pub loc: SourceLoc,
}

/// The process kinds a component can own.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ProcessKind {
    /// `always`
    Always,
    /// `always_comb`
    AlwaysComb,
    /// `always_ff`
    AlwaysFf,
    /// `always_latch`
    AlwaysLatch,
    /// `initial`
    Initial,
    /// `final`
    Final,
}

/// A process (always/initial/final block). The body stays as AST; the
/// elaborated view reaches it through the definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Process {
    /// The process kind.
    pub kind: ProcessKind,
    /// The body's AST node.
    pub body: NodeId,
    /// The compiled body.
    pub compiled: Option<crate::stmt::StmtId>,
    /// Source location.
    pub loc: SourceLoc,
}

/// One instantiation statement inside a component.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubInstance {
    /// The instantiated component's name as written.
    pub target_name: Symbol,
    /// The instance name.
    pub instance_name: Symbol,
    /// Parameter overrides: `(name or bad-symbol for positional, expr)`.
    pub param_overrides: Vec<(Symbol, ExprId)>,
    /// Port connections: `(name or bad-symbol for positional, expr)`.
    pub connections: Vec<(Symbol, Option<ExprId>)>,
    /// The instantiation AST node.
    pub node: NodeId,
    /// Source location.
    pub loc: SourceLoc,
}

/// UDP-specific data: initial statement, port table, and table rows as
/// space-separated symbol strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UdpData {
    /// The output initial value expression, when written.
    pub initial: Option<ExprId>,
    /// Port names in header order.
    pub ports: Vec<Symbol>,
    /// Table rows, each a space-separated symbol string.
    pub rows: Vec<Symbol>,
}

/// A design component: the declaration-level IR node for one module,
/// interface, program, package, class, or UDP.
///
/// Cross-references (base classes, sub-components, instantiation targets)
/// are IDs into the design registry, never owning pointers, so mutually
/// recursive components are representable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Component {
    /// The component kind.
    pub kind: ComponentKind,
    /// The unqualified name.
    pub name: Symbol,
    /// The owning library (first segment of the qualified name).
    pub library: Symbol,
    /// The defining file.
    pub file: FileId,
    /// The defining AST node.
    pub node: Option<NodeId>,
    /// Source location of the declaration.
    pub loc: SourceLoc,
    /// Parameters in declaration order.
    pub params: Vec<Parameter>,
    /// Typedef name → typespec.
    pub typedefs: HashMap<Symbol, TypespecId>,
    /// Named data types declared inline (enum/struct tags).
    pub data_types: HashMap<Symbol, TypespecId>,
    /// Functions in declaration order.
    pub functions: Vec<Tf>,
    /// Tasks in declaration order.
    pub tasks: Vec<Tf>,
    /// Ports in declaration order.
    pub ports: Vec<SignalDecl>,
    /// Internal nets and variables.
    pub signals: Vec<SignalDecl>,
    /// Nested components (classes in classes/packages, nested modules).
    pub sub_components: Vec<ComponentId>,
    /// Instantiation statements.
    pub sub_instances: Vec<SubInstance>,
    /// Modports (interfaces only).
    pub modports: HashMap<Symbol, Modport>,
    /// Processes in declaration order.
    pub processes: Vec<Process>,
    /// Continuous assignments as `(lhs, rhs)` expression pairs.
    pub cont_assigns: Vec<(ExprId, ExprId)>,
    /// Unelaborated generate-construct AST nodes, re-visited at
    /// elaboration time when parameter values are known.
    pub gen_constructs: Vec<NodeId>,
    /// Packages imported by this component, in import order.
    pub imports: Vec<Symbol>,
    /// Attribute `(name, value)` pairs.
    pub attributes: Vec<(Symbol, Option<ExprId>)>,
    /// Base class reference (classes only): name and late resolution.
    pub base_class: Option<(Symbol, Option<ComponentId>)>,
    /// UDP data (primitives only).
    pub udp: Option<UdpData>,
}

impl Component {
    /// Creates an empty component shell, to be filled by the compiler.
    pub fn shell(
        kind: ComponentKind,
        name: Symbol,
        library: Symbol,
        file: FileId,
        loc: SourceLoc,
    ) -> Self {
        Self {
            kind,
            name,
            library,
            file,
            node: None,
            loc,
            params: Vec::new(),
            typedefs: HashMap::new(),
            data_types: HashMap::new(),
            functions: Vec::new(),
            tasks: Vec::new(),
            ports: Vec::new(),
            signals: Vec::new(),
            sub_components: Vec::new(),
            sub_instances: Vec::new(),
            modports: HashMap::new(),
            processes: Vec::new(),
            cont_assigns: Vec::new(),
            gen_constructs: Vec::new(),
            imports: Vec::new(),
            attributes: Vec::new(),
            base_class: None,
            udp: None,
        }
    }

    /// Finds a parameter by name.
    pub fn param(&self, name: Symbol) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// The folded value of a parameter, when present.
    pub fn value_of(&self, name: Symbol) -> Option<&crate::value::Value> {
        self.param(name).and_then(|p| p.value.as_ref())
    }

    /// Finds a port by name.
    pub fn port(&self, name: Symbol) -> Option<&SignalDecl> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Finds a port or internal signal by name (ports take precedence).
    pub fn signal(&self, name: Symbol) -> Option<&SignalDecl> {
        self.port(name)
            .or_else(|| self.signals.iter().find(|s| s.name == name))
    }

    /// Finds a function by name.
    pub fn function(&self, name: Symbol) -> Option<&Tf> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Finds a task by name.
    pub fn task(&self, name: Symbol) -> Option<&Tf> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Index of a named port or signal in the combined `[ports, signals]`
    /// view used by [`RefTarget::SignalIn`](crate::expr::RefTarget).
    pub fn signal_index(&self, name: Symbol) -> Option<u32> {
        if let Some(i) = self.ports.iter().position(|p| p.name == name) {
            return Some(i as u32);
        }
        self.signals
            .iter()
            .position(|s| s.name == name)
            .map(|i| (i + self.ports.len()) as u32)
    }

    /// The signal at a combined `[ports, signals]` index.
    pub fn signal_at(&self, index: u32) -> Option<&SignalDecl> {
        let i = index as usize;
        if i < self.ports.len() {
            self.ports.get(i)
        } else {
            self.signals.get(i - self.ports.len())
        }
    }

    /// Index of a named parameter.
    pub fn param_index(&self, name: Symbol) -> Option<u32> {
        self.params.iter().position(|p| p.name == name).map(|i| i as u32)
    }

    /// Index of a named task or function in the combined
    /// `[functions, tasks]` view used by
    /// [`RefTarget::TfIn`](crate::expr::RefTarget).
    pub fn tf_index(&self, name: Symbol) -> Option<u32> {
        if let Some(i) = self.functions.iter().position(|f| f.name == name) {
            return Some(i as u32);
        }
        self.tasks
            .iter()
            .position(|t| t.name == name)
            .map(|i| (i + self.functions.len()) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn shell() -> Component {
        Component::shell(
            ComponentKind::Module,
            Symbol::from_raw(1),
            Symbol::from_raw(2),
            FileId::from_raw(0),
            SourceLoc::UNKNOWN,
        )
    }

    #[test]
    fn shell_is_empty() {
        let c = shell();
        assert!(c.params.is_empty());
        assert!(c.ports.is_empty());
        assert!(c.udp.is_none());
    }

    #[test]
    fn param_lookup_and_value_of() {
        let mut c = shell();
        let w = Symbol::from_raw(10);
        c.params.push(Parameter {
            name: w,
            local: false,
            is_type: false,
            typespec: None,
            default: None,
            value: Some(Value::integer(4)),
            type_default: None,
            loc: SourceLoc::UNKNOWN,
        });
        assert_eq!(c.value_of(w).unwrap().to_i64(), Some(4));
        assert!(c.value_of(Symbol::from_raw(99)).is_none());
    }

    #[test]
    fn signal_lookup_prefers_ports() {
        let mut c = shell();
        let name = Symbol::from_raw(5);
        let nt = Symbol::from_raw(6);
        c.ports.push(SignalDecl::new(
            name,
            crate::signal::Direction::Input,
            nt,
            SourceLoc::UNKNOWN,
        ));
        c.signals.push(SignalDecl::new(
            name,
            crate::signal::Direction::Unspecified,
            nt,
            SourceLoc::UNKNOWN,
        ));
        assert_eq!(
            c.signal(name).unwrap().direction,
            crate::signal::Direction::Input
        );
    }

    #[test]
    fn serde_roundtrip() {
        let c = shell();
        let json = serde_json::to_string(&c).unwrap();
        let back: Component = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, ComponentKind::Module);
    }
}
