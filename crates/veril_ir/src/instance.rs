//! The elaborated instance tree.

use crate::arena::Arena;
use crate::ids::{ComponentId, InstanceId, TypespecId};
use crate::loc::SourceLoc;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use veril_common::Symbol;

/// What an elaborated instance represents.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum InstanceKind {
    /// A module instance.
    Module,
    /// An interface instance.
    Interface,
    /// A program instance.
    Program,
    /// A UDP instance.
    Udp,
    /// A concrete generate scope produced by an elaborated generate.
    GenScope,
    /// The target definition was not found.
    Unknown,
}

/// One physical occurrence of a component in the elaborated design.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleInstance {
    /// The instance name (a generate scope uses `name[i]`).
    pub name: Symbol,
    /// What this instance is.
    pub kind: InstanceKind,
    /// The definition: the unelaborated component, or its override clone.
    pub definition: Option<ComponentId>,
    /// The enclosing instance.
    pub parent: Option<InstanceId>,
    /// Children in elaboration order.
    pub children: Vec<InstanceId>,
    /// Parameter bindings visible in this instance.
    pub param_values: Vec<(Symbol, Value)>,
    /// Typedef overrides applied by type parameters.
    pub typedef_overrides: Vec<(Symbol, TypespecId)>,
    /// Interface-port bindings: `(port name, interface instance)`.
    pub modport_bindings: Vec<(Symbol, InstanceId)>,
    /// Source location of the instantiation.
    pub loc: SourceLoc,
}

impl ModuleInstance {
    /// The bound value of a parameter in this instance's context.
    pub fn value_of(&self, name: Symbol) -> Option<&Value> {
        self.param_values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// The tree of elaborated instances, arena-owned with index edges.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InstanceTree {
    arena: Arena<InstanceId, ModuleInstance>,
    /// Top instances in deterministic (name-sorted) order.
    pub tops: Vec<InstanceId>,
}

impl InstanceTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an instance and links it under its parent.
    pub fn alloc(&mut self, mut instance: ModuleInstance) -> InstanceId {
        let parent = instance.parent;
        instance.children = Vec::new();
        let id = self.arena.alloc(instance);
        if let Some(p) = parent {
            self.arena.get_mut(p).children.push(id);
        }
        id
    }

    /// Returns the instance with the given ID.
    pub fn get(&self, id: InstanceId) -> &ModuleInstance {
        self.arena.get(id)
    }

    /// Returns a mutable reference to the instance with the given ID.
    pub fn get_mut(&mut self, id: InstanceId) -> &mut ModuleInstance {
        self.arena.get_mut(id)
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the tree has no instances.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Iterates `(id, instance)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &ModuleInstance)> {
        self.arena.iter()
    }

    /// The dotted hierarchical path of an instance (`top.u1.u2`).
    pub fn full_path_name(&self, id: InstanceId, symbols: &veril_common::SymbolTable) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            let inst = self.get(c);
            segments.push(symbols.lookup(inst.name).to_string());
            cursor = inst.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// Depth-first traversal order starting from `root`.
    pub fn descendants(&self, root: InstanceId) -> Vec<InstanceId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &c in self.get(id).children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }
}
