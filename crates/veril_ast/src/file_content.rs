//! Per-file AST container.

use crate::node::{NodeId, NodeKind, VObject};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use veril_common::Symbol;
use veril_source::FileId;

/// The packed AST of one parsed file.
///
/// Owns the append-only [`VObject`] arena plus the name maps downstream
/// passes use to find declarations without walking the tree. Chunked files
/// carry a `parent_file` link back to the file they were split from; their
/// contents are stitched logically through the design registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileContent {
    /// The parsed file.
    pub file: FileId,
    /// The library this file was compiled into.
    pub library: Symbol,
    /// The original file when this content is a chunk of a split file.
    pub parent_file: Option<FileId>,
    nodes: Vec<VObject>,
    /// Name of each top-level declaration → its node.
    declarations: HashMap<Symbol, NodeId>,
    /// Name → design-element definition node (module/interface/package/
    /// program/class/UDP).
    definitions: HashMap<Symbol, NodeId>,
}

impl FileContent {
    /// Creates an empty file content for the given file and library.
    pub fn new(file: FileId, library: Symbol) -> Self {
        Self {
            file,
            library,
            parent_file: None,
            nodes: Vec::new(),
            declarations: HashMap::new(),
            definitions: HashMap::new(),
        }
    }

    /// Appends a node, returning its ID.
    ///
    /// Enforces the arena ordering invariant: any `child`/`sibling` edge on
    /// the new node must point at an already-allocated (lower) index.
    pub fn add(&mut self, node: VObject) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        if let Some(child) = node.child {
            debug_assert!(child < id, "child edge must point downward");
        }
        if let Some(sibling) = node.sibling {
            debug_assert!(sibling < id, "sibling edge must point downward");
        }
        self.nodes.push(node);
        id
    }

    /// Returns the node with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn node(&self, id: NodeId) -> &VObject {
        &self.nodes[id.as_raw() as usize]
    }

    /// Sets the parent edge of `id`. Used during parse when the parent is
    /// allocated after its children.
    pub fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        self.nodes[id.as_raw() as usize].parent = Some(parent);
    }

    /// Sets the previous-sibling edge of `id`.
    ///
    /// # Panics
    ///
    /// Debug-panics if the edge would point upward.
    pub fn set_sibling(&mut self, id: NodeId, sibling: NodeId) {
        debug_assert!(sibling < id, "sibling edge must point downward");
        self.nodes[id.as_raw() as usize].sibling = Some(sibling);
    }

    /// Fills the late-bound definition edge of `id`.
    pub fn set_definition(&mut self, id: NodeId, definition: NodeId) {
        self.nodes[id.as_raw() as usize].definition = Some(definition);
    }

    /// The root node: the last allocated (post-order numbering).
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId::from_raw(self.nodes.len() as u32 - 1))
        }
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates `(id, node)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &VObject)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from_raw(i as u32), n))
    }

    /// The children of `id` in source order.
    ///
    /// Walks the last-child/previous-sibling chain and reverses it.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.node(id).child;
        while let Some(c) = cursor {
            out.push(c);
            cursor = self.node(c).sibling;
        }
        out.reverse();
        out
    }

    /// The first child of `id` with the given kind, in source order.
    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .into_iter()
            .find(|&c| self.node(c).kind == kind)
    }

    /// All children of `id` with the given kind, in source order.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|&c| self.node(c).kind == kind)
            .collect()
    }

    /// Registers a top-level declaration name.
    pub fn register_declaration(&mut self, name: Symbol, node: NodeId) {
        self.declarations.insert(name, node);
    }

    /// Looks up a top-level declaration by name.
    pub fn declaration(&self, name: Symbol) -> Option<NodeId> {
        self.declarations.get(&name).copied()
    }

    /// Registers a design-element definition name.
    pub fn register_definition(&mut self, name: Symbol, node: NodeId) {
        self.definitions.insert(name, node);
    }

    /// Looks up a design-element definition by name.
    pub fn definition(&self, name: Symbol) -> Option<NodeId> {
        self.definitions.get(&name).copied()
    }

    /// All registered definitions as `(name, node)` pairs.
    pub fn definitions(&self) -> impl Iterator<Item = (Symbol, NodeId)> + '_ {
        self.definitions.iter().map(|(&s, &n)| (s, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veril_source::FileId;

    fn leaf(kind: NodeKind) -> VObject {
        VObject::leaf(kind, Symbol::BAD, FileId::from_raw(0), 1, 1, 1, 1)
    }

    fn make_fc() -> FileContent {
        FileContent::new(FileId::from_raw(0), Symbol::from_raw(1))
    }

    #[test]
    fn add_assigns_monotonic_ids() {
        let mut fc = make_fc();
        let a = fc.add(leaf(NodeKind::Identifier));
        let b = fc.add(leaf(NodeKind::Identifier));
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(fc.len(), 2);
    }

    #[test]
    fn root_is_highest_id() {
        let mut fc = make_fc();
        assert!(fc.root().is_none());
        fc.add(leaf(NodeKind::Identifier));
        let design = fc.add(leaf(NodeKind::Design));
        assert_eq!(fc.root(), Some(design));
    }

    #[test]
    fn children_restored_in_source_order() {
        let mut fc = make_fc();
        // Children allocated first, in source order a, b, c.
        let a = fc.add(leaf(NodeKind::Identifier));
        let mut b_node = leaf(NodeKind::Identifier);
        b_node.sibling = Some(a);
        let b = fc.add(b_node);
        let mut c_node = leaf(NodeKind::Identifier);
        c_node.sibling = Some(b);
        let c = fc.add(c_node);
        // Parent last, pointing at its last child.
        let mut p_node = leaf(NodeKind::SeqBlock);
        p_node.child = Some(c);
        let p = fc.add(p_node);
        fc.set_parent(a, p);
        fc.set_parent(b, p);
        fc.set_parent(c, p);

        assert_eq!(fc.children(p), vec![a, b, c]);
        assert_eq!(fc.node(a).parent, Some(p));
    }

    #[test]
    fn child_of_kind_finds_first() {
        let mut fc = make_fc();
        let a = fc.add(leaf(NodeKind::Port));
        let mut b_node = leaf(NodeKind::Parameter);
        b_node.sibling = Some(a);
        let b = fc.add(b_node);
        let mut p_node = leaf(NodeKind::Module);
        p_node.child = Some(b);
        let p = fc.add(p_node);

        assert_eq!(fc.child_of_kind(p, NodeKind::Port), Some(a));
        assert_eq!(fc.child_of_kind(p, NodeKind::Parameter), Some(b));
        assert_eq!(fc.child_of_kind(p, NodeKind::Typedef), None);
        assert_eq!(fc.children_of_kind(p, NodeKind::Port), vec![a]);
    }

    #[test]
    fn declaration_and_definition_maps() {
        let mut fc = make_fc();
        let m = fc.add(leaf(NodeKind::Module));
        let name = Symbol::from_raw(7);
        fc.register_definition(name, m);
        fc.register_declaration(name, m);
        assert_eq!(fc.definition(name), Some(m));
        assert_eq!(fc.declaration(name), Some(m));
        assert_eq!(fc.definitions().count(), 1);
    }

    #[test]
    fn set_definition_late_binds() {
        let mut fc = make_fc();
        let use_site = fc.add(leaf(NodeKind::Identifier));
        let decl = fc.add(leaf(NodeKind::Typedef));
        fc.set_definition(use_site, decl);
        assert_eq!(fc.node(use_site).definition, Some(decl));
    }

    #[test]
    fn serde_roundtrip() {
        let mut fc = make_fc();
        fc.add(leaf(NodeKind::Module));
        let json = serde_json::to_string(&fc).unwrap();
        let back: FileContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
    }
}
