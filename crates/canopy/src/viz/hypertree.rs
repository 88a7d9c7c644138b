use canopy_graph::util;
use canopy_graph::{Complex, PosProp, SkipIgnored};
use canopy_layout::algo::hyperbolic::moebius_graph;
use serde_json::Value;

use super::{Dispatch, Visualization, impl_viz};
use crate::anim::{Clock, Mode};
use crate::config::{Kind, VizConfig};
use crate::error::{Error, Result};

/// Hyperbolic tree in the Poincaré disk. Focus changes are Möbius translations of the whole
/// layout, so nodes near the focus grow and the periphery shrinks.
#[derive(Debug)]
pub struct Hypertree(Visualization);

impl_viz!(Hypertree);

impl Hypertree {
    pub fn new(config: VizConfig) -> Self {
        Self(Visualization::new(Kind::Hypertree, config))
    }

    pub fn with_clock(config: VizConfig, clock: Box<dyn Clock>) -> Self {
        Self(Visualization::with_clock(Kind::Hypertree, config, clock))
    }

    pub fn from_overrides(overrides: Option<&Value>) -> Result<Self> {
        Ok(Self::new(VizConfig::for_kind(Kind::Hypertree, overrides)?))
    }

    pub fn into_inner(self) -> Visualization {
        self.0
    }

    /// Lays out into `pos` and `start_pos`, dropping any translation.
    pub fn compute(&mut self) -> Result<()> {
        self.0.compute(&[PosProp::Pos, PosProp::StartPos])
    }

    /// Replots; with `reposition` the current focus is kept.
    pub fn refresh(&mut self, reposition: bool) -> Result<()> {
        self.0.refresh(reposition)
    }

    pub fn on_click(&mut self, id: &str) -> Result<Dispatch> {
        let pos = self.0.node(id)?.pos.getc();
        self.move_to(pos)
    }

    /// Animates the point `pos` of the unit disk to the centre. Points outside the disk are
    /// ignored.
    pub fn move_to(&mut self, pos: Complex) -> Result<Dispatch> {
        self.0.ht_move(pos)
    }
}

impl Visualization {
    pub(crate) fn ht_reposition(&mut self) -> Result<()> {
        self.compute(&[PosProp::EndPos])?;
        let root = self.root_id()?;
        let c = self
            .graph
            .get_node(&root)
            .map(|n| n.pos.getc())
            .ok_or(Error::NodeNotFound { id: root })?;
        moebius_graph(&mut self.graph, c, &[PosProp::EndPos], None, &SkipIgnored);
        for node in self.graph.nodes_mut().filter(|n| n.ignore) {
            let pos = node.pos;
            node.end_pos.set(pos);
        }
        Ok(())
    }

    pub(crate) fn ht_refresh(&mut self, reposition: bool) -> Result<()> {
        if reposition {
            self.ht_reposition()?;
            for node in self.graph.nodes_mut() {
                let end = node.end_pos;
                node.pos.set(end);
                node.start_pos.set(end);
            }
        } else {
            self.compute(&[PosProp::Pos, PosProp::StartPos])?;
        }
        self.plot()
    }

    pub(crate) fn ht_move(&mut self, pos: Complex) -> Result<Dispatch> {
        if self.busy {
            return Ok(Dispatch::Busy);
        }
        if pos.norm() >= 1.0 {
            return Ok(Dispatch::Done);
        }
        let closest = util::closest_node_to_pos(&self.graph, pos, PosProp::Pos, &SkipIgnored)
            .map(|n| n.id.clone());
        let Some(closest) = closest else {
            return Ok(Dispatch::Done);
        };
        self.busy = true;
        self.traversal = util::compute_levels(&self.graph, &closest, 0, &SkipIgnored);
        self.notify(&closest, |c, n| c.on_before_compute(n));
        tracing::debug!(x = pos.x, y = pos.y, focus = %closest, "hypertree move");

        let options = self.config.animation();
        self.animate(
            vec![Mode::Moebius],
            options,
            Some(pos),
            Box::new(|viz: &mut Visualization| viz.finish(None)),
        );
        Ok(Dispatch::Scheduled)
    }
}
