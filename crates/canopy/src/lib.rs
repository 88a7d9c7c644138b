#![forbid(unsafe_code)]

//! Headless Spacetree, RGraph and Hypertree visualizations.
//!
//! Design goals:
//! - layouts and animated transitions without a renderer (every frame is a [`Scene`])
//! - deterministic, testable animation through an injectable [`anim::Clock`]
//! - one shared engine ([`Visualization`]) with per-kind interaction flows on top

pub mod anim;
pub mod config;
pub mod error;
pub mod op;
pub mod scene;
pub mod viz;

pub use anim::{Clock, ManualClock, SystemClock, Transition};
pub use config::{Config, Kind, VizConfig};
pub use error::{Error, Result};
pub use op::{OpOptions, OpType};
pub use scene::{EdgeShape, NodeShape, Scene, SceneEdge, SceneNode};
pub use viz::{
    Completion, Controller, Dispatch, Hypertree, Method, NoopController, RGraph, Spacetree,
    SubtreeLoader, Then, TreeSource, Visualization, Viz,
};

pub use canopy_graph::{Complex, Graph, Input, Node, Polar, PosProp, TreeNode};
pub use canopy_layout::Orientation;
