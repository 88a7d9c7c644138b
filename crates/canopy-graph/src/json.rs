//! JSON input forms and graph construction.
//!
//! An object is a tree (`children` nest recursively); an array is a graph whose elements list
//! their `adjacencies` either as bare ids or as `{ "nodeTo": id, "data": {...} }`.
//!
//! Construction validates every referenced id before touching the target graph.

use crate::error::{Error, Result};
use crate::graph::{Data, Graph, GraphOptions};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub adjacencies: Vec<AdjacencyRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdjacencyRef {
    Id(String),
    Edge {
        #[serde(rename = "nodeTo")]
        node_to: String,
        #[serde(default)]
        data: Data,
    },
}

impl AdjacencyRef {
    pub fn node_to(&self) -> &str {
        match self {
            AdjacencyRef::Id(id) => id,
            AdjacencyRef::Edge { node_to, .. } => node_to,
        }
    }

    fn data(&self) -> Data {
        match self {
            AdjacencyRef::Id(_) => Data::new(),
            AdjacencyRef::Edge { data, .. } => data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Input {
    Graph(Vec<GraphNode>),
    Tree(TreeNode),
}

impl Input {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The tree root, or the `index`-th element of a graph array.
    pub fn root_id(&self, index: usize) -> Result<&str> {
        match self {
            Input::Tree(tree) => Ok(&tree.id),
            Input::Graph(nodes) if nodes.is_empty() => Err(Error::EmptyGraph),
            Input::Graph(nodes) => nodes
                .get(index)
                .map(|n| n.id.as_str())
                .ok_or(Error::RootIndexOutOfRange {
                    index,
                    len: nodes.len(),
                }),
        }
    }

    /// Fails on the first adjacency naming an id that is not part of this payload.
    pub fn validate(&self) -> Result<()> {
        let Input::Graph(nodes) = self else {
            return Ok(());
        };
        let ids: FxHashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        for node in nodes {
            for adj in &node.adjacencies {
                if !ids.contains(adj.node_to()) {
                    return Err(Error::DanglingReference {
                        node: node.id.clone(),
                        missing: adj.node_to().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn to_graph(&self, options: GraphOptions) -> Result<Graph> {
        let mut graph = Graph::new(options);
        self.append_to(&mut graph)?;
        Ok(graph)
    }

    /// Adds the payload's nodes and adjacencies to `graph`. Existing nodes are left as they are.
    pub fn append_to(&self, graph: &mut Graph) -> Result<()> {
        self.validate()?;
        match self {
            Input::Tree(tree) => append_tree(graph, tree),
            Input::Graph(nodes) => {
                for node in nodes {
                    graph.add_node(&node.id, &node.name, node.data.clone());
                }
                for node in nodes {
                    for adj in &node.adjacencies {
                        graph.add_adjacence(&node.id, adj.node_to(), adj.data());
                    }
                }
            }
        }
        Ok(())
    }
}

fn append_tree(graph: &mut Graph, tree: &TreeNode) {
    graph.add_node(&tree.id, &tree.name, tree.data.clone());
    for child in &tree.children {
        graph.add_node(&child.id, &child.name, child.data.clone());
        graph.add_adjacence(&tree.id, &child.id, Data::new());
        append_tree(graph, child);
    }
}

/// Helpers over raw JSON trees, used before they are loaded into a graph.
pub mod tree {
    use super::TreeNode;

    /// Visits nodes whose level (relative to `tree`, starting at `level`) is at most `to_level`.
    pub fn each_level<'t>(
        tree: &'t TreeNode,
        level: usize,
        to_level: usize,
        action: &mut dyn FnMut(&'t TreeNode, usize),
    ) {
        if level > to_level {
            return;
        }
        action(tree, level);
        for child in &tree.children {
            each_level(child, level + 1, to_level, action);
        }
    }

    pub fn each<'t>(tree: &'t TreeNode, action: &mut dyn FnMut(&'t TreeNode, usize)) {
        each_level(tree, 0, usize::MAX, action);
    }

    /// Drops every node deeper than `max_level`.
    pub fn prune(tree: &mut TreeNode, max_level: usize) {
        fn walk(node: &mut TreeNode, level: usize, max_level: usize) {
            if level >= max_level {
                node.children.clear();
                return;
            }
            for child in &mut node.children {
                walk(child, level + 1, max_level);
            }
        }
        walk(tree, 0, max_level);
    }

    pub fn parent_of<'t>(tree: &'t TreeNode, id: &str) -> Option<&'t TreeNode> {
        for child in &tree.children {
            if child.id == id {
                return Some(tree);
            }
            if let Some(found) = parent_of(child, id) {
                return Some(found);
            }
        }
        None
    }

    pub fn subtree<'t>(tree: &'t TreeNode, id: &str) -> Option<&'t TreeNode> {
        if tree.id == id {
            return Some(tree);
        }
        tree.children.iter().find_map(|child| subtree(child, id))
    }

    /// Childless nodes above `max_level`, paired with how many levels remain below them.
    pub fn leaves(tree: &TreeNode, max_level: Option<usize>) -> Vec<(&TreeNode, usize)> {
        let limit = max_level.unwrap_or(usize::MAX);
        let mut out = Vec::new();
        each(tree, &mut |node, level| {
            if level < limit && node.children.is_empty() {
                out.push((node, limit - level));
            }
        });
        out
    }
}
