//! The per-material node arena.
//!
//! Nodes, aka textures, can be linked together to form a shader tree, and
//! several channels can link to the same node. Rather than nesting nodes
//! (which would duplicate the shared ones) every node lives in one pool and
//! is addressed by its arena id; the name index gives at most one live node
//! instance per logical name, which is what enables structural sharing when
//! two channels reference the same underlying map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::node::{NodeId, TextureNode};

/// Arena of [`TextureNode`]s owned by exactly one material.
///
/// Inputs of a node may only reference ids handed out by earlier `insert`
/// calls on the same pool, so the graph is acyclic by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodePool {
    nodes: Vec<TextureNode>,
    index: HashMap<String, NodeId>,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node and binds its name in the index.
    ///
    /// Inserting under an existing name rebinds the name to the new node;
    /// the superseded node stays in the arena (earlier ids remain valid)
    /// but is no longer reachable by name.
    pub fn insert(&mut self, node: TextureNode) -> NodeId {
        debug_assert!(
            node.references().iter().all(|r| r.index() < self.nodes.len()),
            "node {} references an id not yet in the pool",
            node.name
        );
        let id = NodeId(self.nodes.len() as u32);
        self.index.insert(node.name.clone(), id);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &TextureNode {
        &self.nodes[id.index()]
    }

    /// Mutable access for post-conversion fixups (linear gamma on specular
    /// maps, domain re-tagging). The name index is keyed separately, so
    /// renaming through this accessor is not supported.
    pub fn get_mut(&mut self, id: NodeId) -> &mut TextureNode {
        &mut self.nodes[id.index()]
    }

    /// Resolves a name against the index.
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Derives a name not yet present in the index by appending `_2`, `_3`,
    /// ... to `base`. Used when a shared node must be forced unique.
    pub fn unique_name(&self, base: &str) -> String {
        let mut i = 2;
        loop {
            let candidate = format!("{base}_{i}");
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
            i += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over (id, node) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TextureNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::node::{NodeKind, ValueDomain};

    fn constant(name: &str) -> TextureNode {
        TextureNode::new(
            name,
            ValueDomain::Color,
            NodeKind::Constant {
                color: Rgb::gray(0.5),
            },
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut pool = NodePool::new();
        let id = pool.insert(constant("base"));
        assert_eq!(pool.lookup("base"), Some(id));
        assert_eq!(pool.get(id).name, "base");
        assert_eq!(pool.lookup("missing"), None);
    }

    #[test]
    fn test_insert_same_name_rebinds() {
        let mut pool = NodePool::new();
        let first = pool.insert(constant("n"));
        let second = pool.insert(constant("n"));
        assert_ne!(first, second);
        assert_eq!(pool.lookup("n"), Some(second));
        // the original id stays valid
        assert_eq!(pool.get(first).name, "n");
    }

    #[test]
    fn test_unique_name_skips_taken_suffixes() {
        let mut pool = NodePool::new();
        pool.insert(constant("map"));
        pool.insert(constant("map_2"));
        assert_eq!(pool.unique_name("map"), "map_3");
    }
}
