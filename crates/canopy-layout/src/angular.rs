//! Angular widths shared by the radial and hyperbolic layouts.
//!
//! A node needs an angle proportional to its diameter divided by its depth (the circumference
//! at depth `d` grows with `d`). A subtree reserves the larger of its root's own width and the sum
//! of its children's subtree widths.

use canopy_graph::util::{self, LevelSpan};
use canopy_graph::{AngleSpan, Graph, PosProp, SkipIgnored, Traversal};
use rustc_hash::{FxHashMap, FxHashSet};
use std::f64::consts::PI;

use crate::dims::NodeDims;

#[derive(Debug, Clone, Default)]
pub struct AngularWidths {
    node: FxHashMap<String, f64>,
    tree: FxHashMap<String, f64>,
}

impl AngularWidths {
    pub fn compute(graph: &Graph, traversal: &mut Traversal, root: &str, dims: &NodeDims) -> Self {
        let mut out = Self::default();
        util::each_bfs(graph, traversal, root, &SkipIgnored, |node, depth| {
            // The root sits at depth 0; treat it as depth 1 so its width stays finite.
            let aw = dims.angular_of(node) / f64::from(depth.max(1));
            out.node.insert(node.id.clone(), aw);
        });
        out.subtree(graph, traversal, root);
        out
    }

    fn subtree(&mut self, graph: &Graph, traversal: &Traversal, id: &str) -> f64 {
        let children: Vec<String> =
            util::get_subnodes(graph, traversal, id, LevelSpan::Range(1, 1), &SkipIgnored)
                .iter()
                .map(|n| n.id.clone())
                .collect();
        let sum: f64 = children
            .iter()
            .map(|child| self.subtree(graph, traversal, child))
            .sum();
        let total = self.node(id).max(sum);
        self.tree.insert(id.to_string(), total);
        total
    }

    /// Width of the node itself; `0` for nodes outside the last computation.
    pub fn node(&self, id: &str) -> f64 {
        self.node.get(id).copied().unwrap_or(0.0)
    }

    pub fn tree(&self, id: &str) -> f64 {
        self.tree.get(id).copied().unwrap_or(0.0)
    }
}

/// Ranks used to keep a parent's children in a fixed circular order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildOrder {
    pub parent: String,
    pub rank: FxHashMap<String, usize>,
}

/// Splits each parent's angular span among its children, proportionally to their subtree widths,
/// and writes `(theta, rho_for(parent_depth))` into every requested property.
pub(crate) fn distribute(
    graph: &mut Graph,
    traversal: &mut Traversal,
    root: &str,
    widths: &AngularWidths,
    props: &[PosProp],
    order: Option<&ChildOrder>,
    rho_for: impl Fn(i32) -> f64,
) {
    let mut bfs = Vec::new();
    util::each_bfs(graph, traversal, root, &SkipIgnored, |node, depth| {
        bfs.push((node.id.clone(), depth))
    });

    let mut spans: FxHashMap<String, AngleSpan> = FxHashMap::default();
    spans.insert(
        root.to_string(),
        AngleSpan {
            begin: 0.0,
            end: 2.0 * PI,
        },
    );
    let mut placed: FxHashSet<String> = FxHashSet::default();
    placed.insert(root.to_string());
    let mut placements: Vec<(String, f64, f64)> = Vec::new();

    for (id, depth) in &bfs {
        let Some(span) = spans.get(id).copied() else {
            continue;
        };
        let rho = rho_for(*depth);
        let mut subnodes: Vec<String> =
            util::get_subnodes(graph, traversal, id, LevelSpan::Range(1, 1), &SkipIgnored)
                .iter()
                .map(|n| n.id.clone())
                .collect();
        let total: f64 = subnodes.iter().map(|c| widths.tree(c)).sum();

        if let Some(order) = order.filter(|o| o.parent == *id) {
            if subnodes.first().is_some_and(|c| order.rank.contains_key(c)) {
                subnodes.sort_by_key(|c| order.rank.get(c).copied().unwrap_or(usize::MAX));
            }
        }

        let mut angle = span.begin;
        for child in subnodes {
            if !placed.insert(child.clone()) {
                continue;
            }
            let rel = if total > 0.0 {
                widths.tree(&child) / total
            } else {
                0.0
            };
            let proportion = rel * span.width();
            let theta = angle + proportion / 2.0;
            spans.insert(
                child.clone(),
                AngleSpan {
                    begin: angle,
                    end: angle + proportion,
                },
            );
            placements.push((child, theta, rho));
            angle += proportion;
        }
    }

    if let Some(node) = graph.get_node_mut(root) {
        for prop in props {
            node.position_mut(*prop).setp(canopy_graph::Polar::ORIGIN);
        }
    }
    for (id, theta, rho) in placements {
        if let Some(node) = graph.get_node_mut(&id) {
            for prop in props {
                node.position_mut(*prop)
                    .setp(canopy_graph::Polar::new(theta, rho));
            }
        }
    }
    for (id, span) in spans {
        if let Some(node) = graph.get_node_mut(&id) {
            node.angle_span = span;
        }
    }
}
