use canopy_graph::geom::normalize_angle;
use canopy_graph::util;
use canopy_graph::{Polar, PosProp, SkipIgnored};
use canopy_layout::ChildOrder;
use serde_json::Value;

use super::{Dispatch, Visualization, impl_viz};
use crate::anim::Clock;
use crate::config::{Kind, VizConfig};
use crate::error::Result;

/// Radial graph: concentric rings around the root. Clicking a node makes it the new root and
/// rotates the rings so that the old parent keeps its direction.
#[derive(Debug)]
pub struct RGraph(Visualization);

impl_viz!(RGraph);

impl RGraph {
    pub fn new(config: VizConfig) -> Self {
        Self(Visualization::new(Kind::RGraph, config))
    }

    pub fn with_clock(config: VizConfig, clock: Box<dyn Clock>) -> Self {
        Self(Visualization::with_clock(Kind::RGraph, config, clock))
    }

    pub fn from_overrides(overrides: Option<&Value>) -> Result<Self> {
        Ok(Self::new(VizConfig::for_kind(Kind::RGraph, overrides)?))
    }

    pub fn into_inner(self) -> Visualization {
        self.0
    }

    /// Lays out into every position property.
    pub fn compute(&mut self) -> Result<()> {
        self.0.compute(&PosProp::ALL)
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.0.refresh(false)
    }

    pub fn on_click(&mut self, id: &str) -> Result<Dispatch> {
        self.0.rg_on_click(id)
    }
}

impl Visualization {
    /// Angle from `id` towards its first parent, with that parent's id.
    fn parent_angle(&self, id: &str) -> Option<(String, f64)> {
        let node = self.graph.get_node(id)?;
        let parent = util::get_parents(&self.graph, &self.traversal, id)
            .into_iter()
            .next()?;
        let d = parent.pos.getc() - node.pos.getc();
        Some((parent.id.clone(), normalize_angle(d.y.atan2(d.x))))
    }

    /// Ranks the neighbours of `parent` that follow `id` in its adjacency order, wrapping around,
    /// so the old parent's children keep their circular order after re-rooting.
    fn tag_children(&self, parent: &str, id: &str) -> Option<ChildOrder> {
        let node = self.graph.get_node(parent)?;
        let mut adjs = Vec::new();
        util::each_adjacency(node, &SkipIgnored, |adj| adjs.push(adj.node_to.clone()));
        let at = adjs.iter().position(|n| n == id)?;
        let len = adjs.len();
        let rank = (1..len)
            .map(|k| adjs[(at + k) % len].clone())
            .enumerate()
            .map(|(rank, child)| (child, rank))
            .collect();
        Some(ChildOrder {
            parent: parent.to_string(),
            rank,
        })
    }

    pub(crate) fn rg_on_click(&mut self, id: &str) -> Result<Dispatch> {
        if self.busy {
            return Ok(Dispatch::Busy);
        }
        self.node(id)?;
        if self.root.as_deref() == Some(id) {
            return Ok(Dispatch::Done);
        }
        self.busy = true;
        self.root = Some(id.to_string());
        self.notify(id, |c, n| c.on_before_compute(n));

        let parent = self.parent_angle(id);
        self.child_order = parent
            .as_ref()
            .and_then(|(parent, _)| self.tag_children(parent, id));
        if let Err(err) = self.compute(&[PosProp::EndPos]) {
            self.busy = false;
            return Err(err);
        }

        if let Some((parent, theta)) = parent {
            let parent_theta = self
                .graph
                .get_node(&parent)
                .map_or(theta, |p| p.end_pos.getp().theta);
            let rotation = Polar::new(theta - parent_theta, 0.0);
            for node in self.graph.nodes_mut() {
                let end = node.end_pos.getp().add(rotation);
                node.end_pos.setp(end);
            }
        }
        tracing::debug!(root = id, "rgraph click");

        let mode = self.config.interpolation.mode();
        let options = self.config.animation();
        self.animate(
            vec![mode],
            options,
            None,
            Box::new(|viz: &mut Visualization| viz.finish(None)),
        );
        Ok(Dispatch::Scheduled)
    }
}
