//! Renderer-agnostic frame description.
//!
//! A [`Scene`] is what a plot produces: every drawn node with its resolved style and every edge
//! between two drawn nodes with its endpoints. Hypertree coordinates are scaled from the unit disk
//! to the canvas; the other kinds are emitted in layout units.

use canopy_graph::{Adjacency, Complex, Node};
use canopy_layout::{EdgeEnd, TreeOptions};
use serde::Serialize;

use crate::config::Kind;
use crate::error::{Error, Result};
use crate::viz::Visualization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    None,
    Circle,
    Square,
    Rectangle,
    Ellipse,
    Triangle,
    Star,
}

impl NodeShape {
    /// Parses a node type name; each kind supports its own set.
    pub fn parse(kind: Kind, name: &str) -> Result<Self> {
        let shape = match name {
            "none" => NodeShape::None,
            "circle" => NodeShape::Circle,
            "square" => NodeShape::Square,
            "rectangle" => NodeShape::Rectangle,
            "ellipse" if kind == Kind::Spacetree => NodeShape::Ellipse,
            "triangle" if kind != Kind::Spacetree => NodeShape::Triangle,
            "star" if kind != Kind::Spacetree => NodeShape::Star,
            other => return Err(Error::unsupported("node type", other)),
        };
        Ok(shape)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeShape {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "arrow")]
    Arrow,
    #[serde(rename = "hyperline")]
    Hyperline,
    #[serde(rename = "quadratic:begin")]
    QuadraticBegin,
    #[serde(rename = "quadratic:end")]
    QuadraticEnd,
    #[serde(rename = "bezier")]
    Bezier,
}

impl EdgeShape {
    pub fn parse(kind: Kind, name: &str) -> Result<Self> {
        let shape = match (kind, name) {
            (_, "none") => EdgeShape::None,
            (_, "line") => EdgeShape::Line,
            (Kind::Spacetree | Kind::RGraph, "arrow") => EdgeShape::Arrow,
            (Kind::Hypertree, "hyperline") => EdgeShape::Hyperline,
            (Kind::Spacetree, "quadratic:begin") => EdgeShape::QuadraticBegin,
            (Kind::Spacetree, "quadratic:end") => EdgeShape::QuadraticEnd,
            (Kind::Spacetree, "bezier") => EdgeShape::Bezier,
            (_, other) => return Err(Error::unsupported("edge type", other)),
        };
        Ok(shape)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub shape: NodeShape,
    pub width: f64,
    pub height: f64,
    pub dim: f64,
    pub color: String,
    pub alpha: f64,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub shape: EdgeShape,
    pub color: String,
    pub line_width: f64,
    pub alpha: f64,
    pub begin: Complex,
    pub end: Complex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub kind: Kind,
    pub root: Option<String>,
    /// Number of frames plotted before this one.
    pub frame: usize,
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
}

impl Scene {
    pub fn build(viz: &Visualization) -> Result<Scene> {
        let config = viz.config();
        let kind = viz.kind();
        let graph = viz.graph();
        let dims = config.node_dims();
        let tree = match kind {
            Kind::Spacetree => Some(config.tree_options()?),
            Kind::RGraph | Kind::Hypertree => None,
        };
        let scale = match kind {
            Kind::Hypertree => config.canvas.width.min(config.canvas.height) / 2.0,
            Kind::Spacetree | Kind::RGraph => 1.0,
        };

        let overridable = config.node.overridable;
        let mut nodes = Vec::new();
        for node in graph.nodes().filter(|n| n.drawn) {
            let shape_name = node_style(overridable, node, "$type").unwrap_or(&config.node.shape);
            let shape = NodeShape::parse(kind, shape_name)?;
            let pos = node.pos.getc();
            let mut dim = dims.dim_of(node);
            if kind == Kind::Hypertree && config.node.transform {
                dim *= 1.0 - pos.squared_norm();
            }
            nodes.push(SceneNode {
                id: node.id.clone(),
                name: node.name.clone(),
                x: pos.x * scale,
                y: pos.y * scale,
                shape,
                width: dims.width_of(node),
                height: dims.height_of(node),
                dim,
                color: node_style(overridable, node, "$color")
                    .unwrap_or(&config.node.color)
                    .to_string(),
                alpha: node.alpha,
                selected: node.selected,
            });
        }

        let mut edges = Vec::new();
        for (from, to) in graph.edges() {
            let (Some(a), Some(b)) = (graph.get_node(&from), graph.get_node(&to)) else {
                continue;
            };
            if !(a.drawn && b.drawn) {
                continue;
            }
            let Some(adj) = a.get_adjacency(&to) else {
                continue;
            };
            let edge_style = |key: &str| {
                if config.edge.overridable {
                    adj.data.get(key)
                } else {
                    None
                }
            };
            let shape_name = edge_style("$type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(&config.edge.shape);
            let (begin, end) = match &tree {
                Some(opts) => tree_anchors(viz, opts, a, b),
                None => (a.pos.getc().scale(scale), b.pos.getc().scale(scale)),
            };
            edges.push(SceneEdge {
                from: from.clone(),
                to: to.clone(),
                shape: EdgeShape::parse(kind, shape_name)?,
                color: edge_style("$color")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or(&config.edge.color)
                    .to_string(),
                line_width: edge_style("$lineWidth")
                    .and_then(serde_json::Value::as_f64)
                    .unwrap_or(config.edge.line_width),
                alpha: edge_alpha(a, b, adj),
                begin,
                end,
            });
        }

        Ok(Scene {
            kind,
            root: viz.root().map(str::to_string),
            frame: viz.frames(),
            nodes,
            edges,
        })
    }

    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&SceneEdge> {
        self.edges
            .iter()
            .find(|e| (e.from == from && e.to == to) || (e.from == to && e.to == from))
    }
}

fn node_style<'n>(overridable: bool, node: &'n Node, key: &str) -> Option<&'n str> {
    if overridable { node.data_str(key) } else { None }
}

/// Edge endpoints on the node borders; the edge begins at the shallower node.
fn tree_anchors(viz: &Visualization, opts: &TreeOptions, a: &Node, b: &Node) -> (Complex, Complex) {
    let traversal = viz.traversal();
    let (parent, child) = if traversal.depth(&b.id) < traversal.depth(&a.id) {
        (b, a)
    } else {
        (a, b)
    };
    (
        opts.edge_anchor(parent, EdgeEnd::Begin),
        opts.edge_anchor(child, EdgeEnd::End),
    )
}

fn edge_alpha(a: &Node, b: &Node, adj: &Adjacency) -> f64 {
    a.alpha.min(b.alpha).min(adj.alpha)
}
