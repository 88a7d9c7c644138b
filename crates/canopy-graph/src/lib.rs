#![forbid(unsafe_code)]

//! Graph store and geometry primitives for `canopy`.
//!
//! - [`geom`]: `Complex`/`Polar` points and the Möbius disk automorphism
//! - [`graph`]: the insertion-ordered undirected graph with per-node animation state
//! - [`util`]: level computation and tree-shaped traversals over the general graph
//! - [`json`]: tree and graph JSON inputs

pub mod error;
pub mod geom;
pub mod graph;
pub mod json;
pub mod util;

pub use error::{Error, Result};
pub use geom::{Complex, Polar, Position};
pub use graph::{Adjacency, AngleSpan, Data, Graph, GraphOptions, Node, NodeDefaults, PosProp};
pub use json::{AdjacencyRef, GraphNode, Input, TreeNode};
pub use util::{All, Filter, LevelSpan, SkipIgnored, Traversal, Where};
