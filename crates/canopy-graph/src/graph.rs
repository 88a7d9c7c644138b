//! The graph store.
//!
//! Nodes are kept in insertion order. Every undirected connection is stored as two `Adjacency`
//! halves, one in each endpoint's adjacency map. Lookups on unknown ids return `None` and
//! removals of unknown ids are no-ops.

mod node;
mod options;

pub use node::{Adjacency, AngleSpan, Data, Node, PosProp};
pub use options::{GraphOptions, NodeDefaults};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

type NodeMap = IndexMap<String, Node, FxBuildHasher>;

#[derive(Debug, Clone, Default)]
pub struct Graph {
    options: GraphOptions,
    nodes: NodeMap,
}

impl Graph {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            nodes: NodeMap::default(),
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    /// Adds a node, or returns the existing one untouched.
    pub fn add_node(&mut self, id: &str, name: &str, data: Data) -> &mut Node {
        let complex = self.options.complex;
        let defaults = self.options.node;
        self.nodes
            .entry(id.to_string())
            .or_insert_with(|| Node::new(id, name, data, complex, defaults))
    }

    /// Connects `a` and `b`, creating bare nodes for missing endpoints.
    ///
    /// Returns the halves that were created: both on a fresh connection, none if the nodes were
    /// already connected in both directions.
    pub fn add_adjacence(&mut self, a: &str, b: &str, data: Data) -> Vec<&Adjacency> {
        self.add_node(a, "", Data::new());
        self.add_node(b, "", Data::new());

        let data = Arc::new(data);
        let created_ab = self.insert_half(a, b, &data);
        let created_ba = self.insert_half(b, a, &data);

        let mut out = Vec::new();
        if created_ab {
            out.extend(self.nodes.get(a).and_then(|n| n.get_adjacency(b)));
        }
        if created_ba {
            out.extend(self.nodes.get(b).and_then(|n| n.get_adjacency(a)));
        }
        out
    }

    fn insert_half(&mut self, from: &str, to: &str, data: &Arc<Data>) -> bool {
        match self.nodes.get_mut(from) {
            Some(node) if !node.adjacent_to(to) => {
                node.adjacencies
                    .insert(to.to_string(), Adjacency::new(from, to, Arc::clone(data)));
                true
            }
            _ => false,
        }
    }

    /// Removes the node and every adjacency pointing at it.
    pub fn remove_node(&mut self, id: &str) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let neighbors: Vec<String> = node.adjacencies.keys().cloned().collect();
        for other in neighbors {
            self.remove_adjacence(id, &other);
        }
        self.nodes.shift_remove(id);
    }

    pub fn remove_adjacence(&mut self, a: &str, b: &str) {
        if let Some(node) = self.nodes.get_mut(a) {
            node.adjacencies.shift_remove(b);
        }
        if let Some(node) = self.nodes.get_mut(b) {
            node.adjacencies.shift_remove(a);
        }
    }

    /// Both halves of the `a`/`b` connection, when both exist.
    pub fn get_adjacence(&self, a: &str, b: &str) -> Option<[&Adjacency; 2]> {
        let ab = self.nodes.get(a)?.get_adjacency(b)?;
        let ba = self.nodes.get(b)?.get_adjacency(a)?;
        Some([ab, ba])
    }

    pub fn adjacency_mut(&mut self, from: &str, to: &str) -> Option<&mut Adjacency> {
        self.nodes.get_mut(from)?.adjacencies.get_mut(to)
    }

    /// Every undirected connection once, as `(from, to)` in insertion order of `from`.
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (i, node) in self.nodes.values().enumerate() {
            for other in node.adjacencies.keys() {
                let j = self.nodes.get_index_of(other).unwrap_or(usize::MAX);
                if i < j {
                    out.push((node.id.clone(), other.clone()));
                }
            }
        }
        out
    }
}
