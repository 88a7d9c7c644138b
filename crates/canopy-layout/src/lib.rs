#![forbid(unsafe_code)]

//! Headless layout algorithms for `canopy` graphs.
//!
//! Every algorithm reads the graph from a root, writes positions into the requested position
//! properties (`pos`, `start_pos`, `end_pos`) and returns the level table it computed. Writing into
//! `end_pos` lets a caller prepare the next state while the current one is still on screen.

pub mod algo;
pub mod angular;
pub mod dims;
pub mod error;

pub use algo::{
    Algorithm, Align, BoundingBox, EdgeEnd, HyperbolicOptions, Orientation, RadialOptions,
    TreeOptions,
};
pub use angular::{AngularWidths, ChildOrder};
pub use dims::NodeDims;
pub use error::{Error, Result};

use canopy_graph::{Graph, PosProp, Traversal};

/// Position assignment from a root into one or more position properties.
pub trait LayoutStrategy {
    fn compute_positions(
        &self,
        graph: &mut Graph,
        root: &str,
        props: &[PosProp],
    ) -> Result<Traversal>;
}

impl LayoutStrategy for TreeOptions {
    fn compute_positions(&self, graph: &mut Graph, root: &str, props: &[PosProp]) -> Result<Traversal> {
        TreeOptions::compute_positions(self, graph, root, props)
    }
}

impl LayoutStrategy for RadialOptions {
    fn compute_positions(&self, graph: &mut Graph, root: &str, props: &[PosProp]) -> Result<Traversal> {
        RadialOptions::compute_positions(self, graph, root, props)
    }
}

impl LayoutStrategy for HyperbolicOptions {
    fn compute_positions(&self, graph: &mut Graph, root: &str, props: &[PosProp]) -> Result<Traversal> {
        HyperbolicOptions::compute_positions(self, graph, root, props)
    }
}

impl LayoutStrategy for Algorithm {
    fn compute_positions(&self, graph: &mut Graph, root: &str, props: &[PosProp]) -> Result<Traversal> {
        layout(graph, root, self, props)
    }
}

/// Headless layout entry point.
pub fn layout(
    graph: &mut Graph,
    root: &str,
    algorithm: &Algorithm,
    props: &[PosProp],
) -> Result<Traversal> {
    match algorithm {
        Algorithm::Tree(opts) => opts.compute_positions(graph, root, props),
        Algorithm::Radial(opts) => opts.compute_positions(graph, root, props),
        Algorithm::Hyperbolic(opts) => opts.compute_positions(graph, root, props),
    }
}
