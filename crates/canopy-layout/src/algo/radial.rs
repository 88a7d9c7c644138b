//! Radial layout: concentric rings `level_distance` apart, angular sectors sized by subtree
//! angular width.

use canopy_graph::util;
use canopy_graph::{Graph, PosProp, SkipIgnored, Traversal};

use crate::angular::{self, AngularWidths, ChildOrder};
use crate::dims::NodeDims;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct RadialOptions {
    pub level_distance: f64,
    pub dims: NodeDims,
    /// Keeps the children of one node in a fixed order (used when re-rooting on click).
    pub child_order: Option<ChildOrder>,
}

impl Default for RadialOptions {
    fn default() -> Self {
        Self {
            level_distance: 100.0,
            dims: NodeDims {
                dim: 3.0,
                ..NodeDims::default()
            },
            child_order: None,
        }
    }
}

impl RadialOptions {
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
        let level_distance = self.level_distance;
        angular::distribute(
            graph,
            &mut traversal,
            root,
            &widths,
            props,
            self.child_order.as_ref(),
            |depth| f64::from(depth + 1) * level_distance,
        );
        tracing::debug!(root, nodes = traversal.reached_count(), "radial layout");
        Ok(traversal)
    }
}
