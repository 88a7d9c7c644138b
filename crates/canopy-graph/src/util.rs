//! Traversal utilities over the graph store.
//!
//! The graph itself has no notion of parents or levels: those are derived by
//! [`compute_levels`] from a chosen root and kept in a [`Traversal`] side table, so that nodes stay
//! free of algorithm scratch state and several traversals can coexist.
//!
//! Filters replace the space-separated flag strings of the JS toolkit with a typed predicate over
//! nodes and adjacencies.

use crate::geom::Complex;
use crate::graph::{Adjacency, Graph, Node, PosProp};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Upper bound for open-ended level windows.
pub const UNBOUNDED: i32 = i32::MAX;

/// Decides which nodes and adjacencies a traversal may see.
pub trait Filter {
    fn accept_node(&self, _node: &Node) -> bool {
        true
    }

    fn accept_adjacency(&self, _adj: &Adjacency) -> bool {
        true
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl Filter for All {}

/// Skips nodes and adjacencies that an in-flight operation excluded from layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipIgnored;

impl Filter for SkipIgnored {
    fn accept_node(&self, node: &Node) -> bool {
        !node.ignore
    }

    fn accept_adjacency(&self, adj: &Adjacency) -> bool {
        !adj.ignore
    }
}

/// Node predicate filter; adjacencies are always accepted.
pub struct Where<F>(pub F);

impl<F: Fn(&Node) -> bool> Filter for Where<F> {
    fn accept_node(&self, node: &Node) -> bool {
        (self.0)(node)
    }
}

/// Depths and visit marks from one root.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    root: String,
    depth: FxHashMap<String, i32>,
    flag: FxHashSet<String>,
}

impl Traversal {
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Depth of `id`, or `-1` when the node was not reached.
    pub fn depth(&self, id: &str) -> i32 {
        self.depth.get(id).copied().unwrap_or(-1)
    }

    pub fn is_reached(&self, id: &str) -> bool {
        self.depth.contains_key(id)
    }

    pub fn reached_count(&self) -> usize {
        self.depth.len()
    }

    pub fn max_depth(&self) -> i32 {
        self.depth.values().copied().max().unwrap_or(-1)
    }

    pub fn is_flagged(&self, id: &str) -> bool {
        self.flag.contains(id)
    }

    pub fn set_flag(&mut self, id: &str) {
        self.flag.insert(id.to_string());
    }

    pub fn set_depth(&mut self, id: &str, depth: i32) {
        self.depth.insert(id.to_string(), depth);
    }
}

/// Re-arms the visit marks.
pub fn clean(traversal: &mut Traversal) {
    traversal.flag.clear();
}

pub fn each_node(graph: &Graph, filter: &dyn Filter, mut action: impl FnMut(&Node)) {
    for node in graph.nodes() {
        if filter.accept_node(node) {
            action(node);
        }
    }
}

pub fn each_adjacency(node: &Node, filter: &dyn Filter, mut action: impl FnMut(&Adjacency)) {
    for adj in node.adjacencies() {
        if filter.accept_adjacency(adj) {
            action(adj);
        }
    }
}

fn accepted_neighbors<'g>(
    graph: &'g Graph,
    node: &'g Node,
    filter: &'g dyn Filter,
) -> impl Iterator<Item = &'g Node> + 'g {
    node.adjacencies()
        .filter(move |adj| filter.accept_adjacency(adj))
        .filter_map(move |adj| graph.get_node(&adj.node_to))
        .filter(move |n| filter.accept_node(n))
}

/// Assigns depths from `root` using a FIFO frontier, so every depth is a shortest path length.
pub fn compute_levels(graph: &Graph, root: &str, start_depth: i32, filter: &dyn Filter) -> Traversal {
    let mut traversal = Traversal {
        root: root.to_string(),
        ..Default::default()
    };
    let Some(root_node) = graph.get_node(root) else {
        return traversal;
    };
    if !filter.accept_node(root_node) {
        return traversal;
    }

    traversal.set_depth(root, start_depth);
    let mut queue = VecDeque::from([root_node]);
    while let Some(node) = queue.pop_front() {
        let depth = traversal.depth(&node.id);
        for child in accepted_neighbors(graph, node, filter) {
            if !traversal.is_reached(&child.id) {
                traversal.set_depth(&child.id, depth + 1);
                queue.push_back(child);
            }
        }
    }
    traversal
}

/// Visits every node reachable from `root` once, in breadth-first order.
pub fn each_bfs(
    graph: &Graph,
    traversal: &mut Traversal,
    root: &str,
    filter: &dyn Filter,
    mut action: impl FnMut(&Node, i32),
) {
    clean(traversal);
    let Some(root_node) = graph.get_node(root) else {
        return;
    };
    traversal.set_flag(root);
    let mut queue = VecDeque::from([root_node]);
    while let Some(node) = queue.pop_front() {
        action(node, traversal.depth(&node.id));
        for child in accepted_neighbors(graph, node, filter) {
            if !traversal.is_flagged(&child.id) {
                traversal.set_flag(&child.id);
                queue.push_back(child);
            }
        }
    }
}

/// Visits `id` and its descendants whose depth relative to `id` lies in `[begin, end]`.
///
/// Descent only follows adjacencies to strictly deeper nodes.
pub fn each_level(
    graph: &Graph,
    traversal: &Traversal,
    id: &str,
    begin: i32,
    end: i32,
    filter: &dyn Filter,
    mut action: impl FnMut(&Node, i32),
) {
    let Some(node) = graph.get_node(id) else {
        return;
    };
    let d = traversal.depth(id);
    walk_levels(
        graph,
        traversal,
        node,
        begin.saturating_add(d),
        end.saturating_add(d),
        filter,
        &mut action,
    );
}

fn walk_levels(
    graph: &Graph,
    traversal: &Traversal,
    node: &Node,
    begin: i32,
    end: i32,
    filter: &dyn Filter,
    action: &mut dyn FnMut(&Node, i32),
) {
    let d = traversal.depth(&node.id);
    if d >= begin && d <= end && filter.accept_node(node) {
        action(node, d);
    }
    if d < end {
        for adj in node.adjacencies() {
            if let Some(child) = graph.get_node(&adj.node_to) {
                if traversal.depth(&child.id) > d {
                    walk_levels(graph, traversal, child, begin, end, filter, action);
                }
            }
        }
    }
}

pub fn each_subgraph(
    graph: &Graph,
    traversal: &Traversal,
    id: &str,
    filter: &dyn Filter,
    action: impl FnMut(&Node, i32),
) {
    each_level(graph, traversal, id, 0, UNBOUNDED, filter, action);
}

pub fn each_subnode(
    graph: &Graph,
    traversal: &Traversal,
    id: &str,
    filter: &dyn Filter,
    action: impl FnMut(&Node, i32),
) {
    each_level(graph, traversal, id, 1, 1, filter, action);
}

pub fn any_subnode(
    graph: &Graph,
    traversal: &Traversal,
    id: &str,
    cond: impl Fn(&Node) -> bool,
    filter: &dyn Filter,
) -> bool {
    let mut found = false;
    each_subnode(graph, traversal, id, filter, |n, _| found |= cond(n));
    found
}

/// Relative level window for [`get_subnodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSpan {
    /// This level and everything below it.
    From(i32),
    Range(i32, i32),
}

pub fn get_subnodes<'g>(
    graph: &'g Graph,
    traversal: &Traversal,
    id: &str,
    span: LevelSpan,
    filter: &dyn Filter,
) -> Vec<&'g Node> {
    let (begin, end) = match span {
        LevelSpan::From(level) => (level, UNBOUNDED),
        LevelSpan::Range(begin, end) => (begin, end),
    };
    let mut ids = Vec::new();
    each_level(graph, traversal, id, begin, end, filter, |n, _| {
        ids.push(n.id.clone())
    });
    ids.iter().filter_map(|id| graph.get_node(id)).collect()
}

/// Neighbors strictly closer to the root than `id`.
pub fn get_parents<'g>(graph: &'g Graph, traversal: &Traversal, id: &str) -> Vec<&'g Node> {
    let Some(node) = graph.get_node(id) else {
        return Vec::new();
    };
    let d = traversal.depth(id);
    node.adjacencies()
        .filter_map(|adj| graph.get_node(&adj.node_to))
        .filter(|n| traversal.depth(&n.id) < d)
        .collect()
}

/// Node nearest to `pos` on the `prop` position (squared Euclidean distance).
pub fn closest_node_to_pos<'g>(
    graph: &'g Graph,
    pos: Complex,
    prop: PosProp,
    filter: &dyn Filter,
) -> Option<&'g Node> {
    let distance = |n: &Node| (n.position(prop).getc() - pos).squared_norm();
    let mut best: Option<(&Node, f64)> = None;
    for node in graph.nodes().filter(|n| filter.accept_node(n)) {
        let d = distance(node);
        match best {
            Some((_, bd)) if bd <= d => {}
            _ => best = Some((node, d)),
        }
    }
    best.map(|(n, _)| n)
}

pub fn closest_node_to_origin<'g>(
    graph: &'g Graph,
    prop: PosProp,
    filter: &dyn Filter,
) -> Option<&'g Node> {
    closest_node_to_pos(graph, Complex::ZERO, prop, filter)
}
