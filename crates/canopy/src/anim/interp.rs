//! Per-node interpolators.
//!
//! Position modes blend `start_pos` towards `end_pos` into `pos`; fade modes blend the alpha
//! triples of nodes or of their adjacencies.

use canopy_graph::{Complex, Node};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "polar")]
    Polar,
    #[serde(rename = "moebius")]
    Moebius,
    #[serde(rename = "fade:nodes")]
    FadeNodes,
    #[serde(rename = "fade:vertex")]
    FadeVertex,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Linear => "linear",
            Mode::Polar => "polar",
            Mode::Moebius => "moebius",
            Mode::FadeNodes => "fade:nodes",
            Mode::FadeVertex => "fade:vertex",
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Mode::Linear),
            "polar" => Ok(Mode::Polar),
            "moebius" => Ok(Mode::Moebius),
            "fade:nodes" => Ok(Mode::FadeNodes),
            "fade:vertex" => Ok(Mode::FadeVertex),
            other => Err(Error::unsupported("interpolation mode", other)),
        }
    }
}

/// Cartesian lerp.
pub fn linear(node: &mut Node, delta: f64) {
    let from = node.start_pos.getc();
    let to = node.end_pos.getc();
    node.pos
        .setc(Complex::new(from.x + (to.x - from.x) * delta, from.y + (to.y - from.y) * delta));
}

/// Polar lerp along the shorter arc.
pub fn polar(node: &mut Node, delta: f64) {
    let from = node.start_pos.getp();
    let to = node.end_pos.getp();
    node.pos.setp(from.interpolate(to, delta));
}

/// Möbius translation of `start_pos` by `vector`, which the caller has already scaled by the
/// negated delta.
pub fn moebius(node: &mut Node, delta: f64, vector: Complex) {
    if delta <= 1.0 {
        node.pos.setc(node.start_pos.getc().moebius(vector));
    }
}

fn fade(alpha: &mut f64, start: f64, end: f64, delta: f64) {
    if delta <= 1.0 && end != *alpha {
        *alpha = start + (end - start) * delta;
    }
}

pub fn fade_nodes(node: &mut Node, delta: f64) {
    fade(&mut node.alpha, node.start_alpha, node.end_alpha, delta);
}

pub fn fade_vertex(node: &mut Node, delta: f64) {
    for adj in node.adjacencies_mut() {
        fade(&mut adj.alpha, adj.start_alpha, adj.end_alpha, delta);
    }
}

/// Applies one mode. `vector` is only read by [`Mode::Moebius`].
pub fn apply(mode: Mode, node: &mut Node, delta: f64, vector: Option<Complex>) {
    match mode {
        Mode::Linear => linear(node, delta),
        Mode::Polar => polar(node, delta),
        Mode::Moebius => {
            if let Some(v) = vector {
                moebius(node, delta, v);
            }
        }
        Mode::FadeNodes => fade_nodes(node, delta),
        Mode::FadeVertex => fade_vertex(node, delta),
    }
}
