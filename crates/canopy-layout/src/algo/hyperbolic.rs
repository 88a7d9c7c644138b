//! Hyperbolic layout in the Poincaré disk.
//!
//! Angles are distributed exactly like the radial layout. Radii follow a geometric series whose
//! ratio is picked from the tree depth so that the deepest level still lands inside the unit disk.
//! Refocusing is a Möbius translation of every point, not a new layout.

use canopy_graph::util;
use canopy_graph::{Complex, Filter, Graph, PosProp, SkipIgnored, Traversal};

use crate::angular::{self, AngularWidths};
use crate::dims::NodeDims;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct HyperbolicOptions {
    pub dims: NodeDims,
}

impl Default for HyperbolicOptions {
    fn default() -> Self {
        Self {
            dims: NodeDims {
                dim: 7.0,
                ..NodeDims::default()
            },
        }
    }
}

/// Ratio of the radius series for a tree of the given depth.
///
/// The first ratio in `0.51..1.00` (step `0.01`) whose partial sum over `depth + 1` terms reaches
/// 2 is stepped back once; shallow trees use `0.5`.
pub fn edge_length(depth: i32) -> f64 {
    let n = depth + 1;
    for k in 51..100 {
        let a = f64::from(k) / 100.0;
        let series = (1.0 - a.powi(n)) / (1.0 - a);
        if series >= 2.0 {
            return a - 0.01;
        }
    }
    0.5
}

/// Distance from the origin of the children of a node at `depth`.
pub fn ring_radius(edge_length: f64, depth: i32) -> f64 {
    let mut rho = 0.0;
    let mut term = edge_length;
    for _ in 0..=depth {
        rho += term;
        term *= edge_length;
    }
    rho
}

/// Rewrites `props` of every accepted node as `source.moebius(c)`, where `source` defaults to the
/// property being written.
pub fn moebius_graph(
    graph: &mut Graph,
    c: Complex,
    props: &[PosProp],
    source: Option<PosProp>,
    filter: &dyn Filter,
) {
    for node in graph.nodes_mut() {
        if !filter.accept_node(node) {
            continue;
        }
        for prop in props {
            let from = node.position(source.unwrap_or(*prop)).getc();
            node.position_mut(*prop).setc(from.moebius(c));
        }
    }
}

impl HyperbolicOptions {
    pub fn compute_positions(
        &self,
        graph: &mut Graph,
        root: &str,
        props: &[PosProp],
    ) -> Result<Traversal> {
        if !graph.has_node(root) {
            return Err(Error::MissingRoot { id: root.to_string() });
        }
        let mut traversal = util::compute_levels(graph, root, 0, &SkipIgnored);
        let widths = AngularWidths::compute(graph, &mut traversal, root, &self.dims);
        let edge = edge_length(traversal.max_depth().max(0));
        angular::distribute(
            graph,
            &mut traversal,
            root,
            &widths,
            props,
            None,
            |depth| ring_radius(edge, depth),
        );
        tracing::debug!(root, edge, nodes = traversal.reached_count(), "hyperbolic layout");
        Ok(traversal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_length_for_shallow_trees() {
        assert_eq!(edge_length(0), 0.5);
        assert_eq!(edge_length(1), 0.5);
        // 1 + a + a² first reaches 2 at a = 0.62.
        assert!((edge_length(2) - 0.61).abs() < 1e-9);
    }

    #[test]
    fn ring_radius_stays_inside_the_disk() {
        for depth in 0..12 {
            let edge = edge_length(depth);
            // Children of the deepest parents sit on ring `depth - 1`.
            for d in 0..depth {
                assert!(ring_radius(edge, d) < 1.0, "depth {depth} ring {d}");
            }
        }
    }
}
