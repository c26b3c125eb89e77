//! The design registry: qualified names to components, plus the shared
//! typespec and expression arenas.

use crate::arena::Arena;
use crate::component::{Component, ComponentKind};
use crate::expr::ExprNode;
use crate::ids::{ComponentId, ExprId, TypespecId};
use crate::instance::InstanceTree;
use crate::typespec::Typespec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use veril_common::Symbol;

/// The design database.
///
/// Owns every design component, the shared typespec/expression arenas, and
/// (after elaboration) the instance tree. Qualified names have the shape
/// `lib@Name`. The driver serializes access behind a single
/// writer-preferring lock: parallel compile workers take the rare insert
/// path exclusively and read otherwise.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Design {
    components: Arena<ComponentId, Component>,
    /// Qualified-name index. Rebuilt by [`rebuild_index`](Self::rebuild_index)
    /// after deserialization (tuple keys do not serialize as map keys).
    #[serde(skip)]
    by_qualified: HashMap<(Symbol, Symbol), ComponentId>,
    packages: HashMap<Symbol, ComponentId>,
    /// All typespecs in the design.
    pub typespecs: Arena<TypespecId, Typespec>,
    /// All expression nodes in the design.
    pub exprs: Arena<ExprId, ExprNode>,
    /// All statement nodes in the design.
    pub stmts: Arena<crate::stmt::StmtId, crate::stmt::StmtNode>,
    /// The elaborated instance tree, filled by the elaborator.
    pub instances: InstanceTree,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component under `lib@name`.
    ///
    /// The first registration wins; a duplicate returns the existing ID as
    /// `Err` so the caller can diagnose it.
    pub fn register(&mut self, component: Component) -> Result<ComponentId, ComponentId> {
        let key = (component.library, component.name);
        if let Some(&existing) = self.by_qualified.get(&key) {
            return Err(existing);
        }
        let is_package = component.kind == ComponentKind::Package;
        let name = component.name;
        let id = self.components.alloc(component);
        self.by_qualified.insert(key, id);
        if is_package {
            self.packages.insert(name, id);
        }
        Ok(id)
    }

    /// Adds a component without a qualified-name registration.
    ///
    /// Used for nested components (inner classes), which are reached
    /// through their parent's `sub_components` rather than the registry.
    pub fn add_unregistered(&mut self, component: Component) -> ComponentId {
        self.components.alloc(component)
    }

    /// Adds a clone of `id` without registering a qualified name.
    ///
    /// Parameter and typedef overrides are applied on clones so the
    /// unelaborated component keeps its original definition.
    pub fn clone_component(&mut self, id: ComponentId) -> ComponentId {
        let cloned = self.components.get(id).clone();
        self.components.alloc(cloned)
    }

    /// Looks up `lib@name`.
    pub fn lookup(&self, library: Symbol, name: Symbol) -> Option<ComponentId> {
        self.by_qualified.get(&(library, name)).copied()
    }

    /// Looks up `name` in any library, in registration order.
    pub fn lookup_any(&self, name: Symbol) -> Option<ComponentId> {
        self.components
            .iter()
            .find(|(_, c)| c.name == name)
            .map(|(id, _)| id)
    }

    /// Looks up a package by name.
    pub fn package(&self, name: Symbol) -> Option<ComponentId> {
        self.packages.get(&name).copied()
    }

    /// Returns the component with the given ID.
    pub fn component(&self, id: ComponentId) -> &Component {
        self.components.get(id)
    }

    /// Returns a mutable reference to the component with the given ID.
    pub fn component_mut(&mut self, id: ComponentId) -> &mut Component {
        self.components.get_mut(id)
    }

    /// Iterates all components in registration order (clones included).
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components.iter()
    }

    /// Number of components (clones included).
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Allocates a typespec.
    pub fn add_typespec(&mut self, ts: Typespec) -> TypespecId {
        self.typespecs.alloc(ts)
    }

    /// Allocates an expression node.
    pub fn add_expr(&mut self, e: ExprNode) -> ExprId {
        self.exprs.alloc(e)
    }

    /// Allocates a statement node.
    pub fn add_stmt(&mut self, s: crate::stmt::StmtNode) -> crate::stmt::StmtId {
        self.stmts.alloc(s)
    }

    /// Rebuilds the qualified-name index from the component arena.
    ///
    /// Clones are skipped: the first registration of each `lib@name` wins,
    /// matching registration-time behavior.
    pub fn rebuild_index(&mut self) {
        self.by_qualified.clear();
        for (id, c) in self.components.iter() {
            self.by_qualified.entry((c.library, c.name)).or_insert(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loc::SourceLoc;
    use veril_source::FileId;

    fn comp(kind: ComponentKind, lib: u32, name: u32) -> Component {
        Component::shell(
            kind,
            Symbol::from_raw(name),
            Symbol::from_raw(lib),
            FileId::from_raw(0),
            SourceLoc::UNKNOWN,
        )
    }

    #[test]
    fn register_and_lookup_roundtrip() {
        let mut design = Design::new();
        let id = design
            .register(comp(ComponentKind::Module, 1, 2))
            .unwrap();
        assert_eq!(
            design.lookup(Symbol::from_raw(1), Symbol::from_raw(2)),
            Some(id)
        );
        assert_eq!(design.component(id).name, Symbol::from_raw(2));
    }

    #[test]
    fn duplicate_registration_returns_existing() {
        let mut design = Design::new();
        let first = design.register(comp(ComponentKind::Module, 1, 2)).unwrap();
        let err = design.register(comp(ComponentKind::Module, 1, 2)).unwrap_err();
        assert_eq!(err, first);
        assert_eq!(design.component_count(), 1);
    }

    #[test]
    fn same_name_different_library_coexist() {
        let mut design = Design::new();
        let a = design.register(comp(ComponentKind::Module, 1, 5)).unwrap();
        let b = design.register(comp(ComponentKind::Module, 2, 5)).unwrap();
        assert_ne!(a, b);
        assert_eq!(design.lookup(Symbol::from_raw(1), Symbol::from_raw(5)), Some(a));
        assert_eq!(design.lookup(Symbol::from_raw(2), Symbol::from_raw(5)), Some(b));
    }

    #[test]
    fn package_lookup_by_name() {
        let mut design = Design::new();
        let id = design.register(comp(ComponentKind::Package, 1, 7)).unwrap();
        assert_eq!(design.package(Symbol::from_raw(7)), Some(id));
        assert_eq!(design.package(Symbol::from_raw(8)), None);
    }

    #[test]
    fn clone_is_unregistered() {
        let mut design = Design::new();
        let id = design.register(comp(ComponentKind::Module, 1, 2)).unwrap();
        let clone = design.clone_component(id);
        assert_ne!(id, clone);
        // Qualified lookup still resolves to the original.
        assert_eq!(
            design.lookup(Symbol::from_raw(1), Symbol::from_raw(2)),
            Some(id)
        );
        assert_eq!(design.component(clone).name, design.component(id).name);
    }

    #[test]
    fn lookup_any_searches_all_libraries() {
        let mut design = Design::new();
        let id = design.register(comp(ComponentKind::Interface, 3, 9)).unwrap();
        assert_eq!(design.lookup_any(Symbol::from_raw(9)), Some(id));
        assert_eq!(design.lookup_any(Symbol::from_raw(10)), None);
    }

    #[test]
    fn serde_roundtrip_with_index_rebuild() {
        let mut design = Design::new();
        design.register(comp(ComponentKind::Module, 1, 2)).unwrap();
        let json = serde_json::to_string(&design).unwrap();
        let mut back: Design = serde_json::from_str(&json).unwrap();
        assert_eq!(back.component_count(), 1);
        back.rebuild_index();
        assert!(back
            .lookup(Symbol::from_raw(1), Symbol::from_raw(2))
            .is_some());
    }
}
