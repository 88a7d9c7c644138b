//! Visualization configuration.
//!
//! Options are plain camelCase JSON. Each visualization kind starts from its own defaults and
//! user overrides are deep-merged on top before the result is read into [`VizConfig`].

use canopy_layout::{Align, HyperbolicOptions, NodeDims, Orientation, RadialOptions, TreeOptions};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::anim::{AnimationOptions, Mode, Transition};
use crate::error::{Error, Result};

/// Raw option tree: kind defaults with user overrides merged in, before it is typed.
#[derive(Debug, Clone, PartialEq)]
pub struct Config(Value);

impl Config {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Merges `other` into this tree. Objects merge key by key; any other value replaces what is
    /// there.
    pub fn deep_merge(&mut self, other: &Value) {
        merge_into(&mut self.0, other);
    }
}

fn merge_into(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match target_map.get_mut(key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// The three visualizations sharing the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Spacetree,
    #[serde(rename = "rgraph")]
    RGraph,
    Hypertree,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Spacetree => "spacetree",
            Kind::RGraph => "rgraph",
            Kind::Hypertree => "hypertree",
        }
    }

    /// Built-in option values for this kind.
    pub fn defaults(self) -> Value {
        let mut config = Config::from_value(json!({
            "orientation": "left",
            "levelsToShow": 2,
            "subtreeOffset": 8,
            "siblingOffset": 5,
            "levelDistance": 100,
            "duration": 2500,
            "fps": 40,
            "transition": "Quart.easeInOut",
            "interpolation": "linear",
            "withLabels": true,
            "constrained": true,
            "offset": { "x": 0, "y": 0 },
            "canvas": { "width": 600, "height": 600 },
            "Node": {
                "overridable": false,
                "type": "circle",
                "dim": 3,
                "width": 5,
                "height": 5,
                "color": "#ccb",
                "lineWidth": 1,
                "align": "center",
                "transform": true
            },
            "Edge": {
                "overridable": false,
                "type": "line",
                "color": "#ccb",
                "lineWidth": 1,
                "dim": 15
            }
        }));
        let specific = match self {
            Kind::Spacetree => json!({
                "levelDistance": 30,
                "duration": 700,
                "fps": 25,
                "Node": { "type": "rectangle", "width": 90, "height": 20, "dim": 15 },
                "Edge": { "color": "#ccc" }
            }),
            Kind::RGraph => json!({}),
            Kind::Hypertree => json!({
                "duration": 1500,
                "Node": { "dim": 7 },
                "Edge": { "type": "hyperline" }
            }),
        };
        config.deep_merge(&specific);
        config.into_value()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spacetree" | "st" => Ok(Kind::Spacetree),
            "rgraph" => Ok(Kind::RGraph),
            "hypertree" => Ok(Kind::Hypertree),
            _ => Err(Error::unsupported("visualization", s)),
        }
    }
}

/// Position interpolation used by click-to-focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Linear,
    Polar,
}

impl Interpolation {
    pub fn mode(self) -> Mode {
        match self {
            Interpolation::Linear => Mode::Linear,
            Interpolation::Polar => Mode::Polar,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

/// Node style group. Shape names are validated when a scene is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub overridable: bool,
    #[serde(rename = "type")]
    pub shape: String,
    pub dim: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub line_width: f64,
    pub align: String,
    pub transform: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub overridable: bool,
    #[serde(rename = "type")]
    pub shape: String,
    pub color: String,
    pub line_width: f64,
    pub dim: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VizConfig {
    pub orientation: Orientation,
    pub levels_to_show: u32,
    pub subtree_offset: f64,
    pub sibling_offset: f64,
    pub level_distance: f64,
    /// Milliseconds.
    pub duration: u64,
    pub fps: u32,
    pub transition: Transition,
    pub interpolation: Interpolation,
    pub with_labels: bool,
    pub constrained: bool,
    pub offset: Offset,
    pub canvas: Canvas,
    #[serde(rename = "Node")]
    pub node: NodeStyle,
    #[serde(rename = "Edge")]
    pub edge: EdgeStyle,
}

impl VizConfig {
    /// Defaults for `kind` with `overrides` deep-merged on top.
    pub fn for_kind(kind: Kind, overrides: Option<&Value>) -> Result<Self> {
        let mut config = Config::from_value(kind.defaults());
        if let Some(overrides) = overrides {
            if !overrides.is_object() {
                return Err(Error::Config {
                    message: "configuration must be a JSON object".to_string(),
                });
            }
            config.deep_merge(overrides);
        }
        serde_json::from_value(config.into_value()).map_err(|err| Error::Config {
            message: err.to_string(),
        })
    }

    pub fn animation(&self) -> AnimationOptions {
        AnimationOptions {
            duration: Duration::from_millis(self.duration),
            fps: self.fps,
            transition: self.transition,
        }
    }

    pub fn node_dims(&self) -> NodeDims {
        NodeDims {
            width: self.node.width,
            height: self.node.height,
            dim: self.node.dim,
            overridable: self.node.overridable,
        }
    }

    pub fn tree_options(&self) -> Result<TreeOptions> {
        Ok(TreeOptions {
            orientation: self.orientation,
            subtree_offset: self.subtree_offset,
            sibling_offset: self.sibling_offset,
            level_distance: self.level_distance,
            levels_to_show: self.levels_to_show,
            dims: self.node_dims(),
            align: self.node.align.parse::<Align>()?,
        })
    }

    pub fn radial_options(&self) -> RadialOptions {
        RadialOptions {
            level_distance: self.level_distance,
            dims: self.node_dims(),
            child_order: None,
        }
    }

    pub fn hyperbolic_options(&self) -> HyperbolicOptions {
        HyperbolicOptions {
            dims: self.node_dims(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_merge_keeps_siblings_and_replaces_leaves() {
        let mut config = Config::from_value(json!({
            "Node": { "type": "circle", "dim": 3 },
            "offset": { "x": 0, "y": 0 },
            "fps": 40
        }));
        config.deep_merge(&json!({
            "Node": { "dim": 9, "color": "#f00" },
            "offset": 5,
            "canvas": { "width": 10 }
        }));
        assert_eq!(
            config.into_value(),
            json!({
                "Node": { "type": "circle", "dim": 9, "color": "#f00" },
                "offset": 5,
                "fps": 40,
                "canvas": { "width": 10 }
            })
        );
    }

    #[test]
    fn overrides_merge_over_kind_defaults() {
        let overrides = json!({ "duration": 10, "Node": { "color": "#123" } });
        let st = VizConfig::for_kind(Kind::Spacetree, Some(&overrides)).unwrap();
        assert_eq!(st.duration, 10);
        assert_eq!(st.fps, 25);
        assert_eq!(st.node.color, "#123");
        assert_eq!(st.node.shape, "rectangle");
        assert_eq!(st.level_distance, 30.0);

        let ht = VizConfig::for_kind(Kind::Hypertree, None).unwrap();
        assert_eq!(ht.edge.shape, "hyperline");
        assert_eq!(ht.node.dim, 7.0);
        assert_eq!(ht.duration, 1500);

        let rg = VizConfig::for_kind(Kind::RGraph, None).unwrap();
        assert_eq!(rg.level_distance, 100.0);
        assert_eq!(rg.interpolation, Interpolation::Linear);
        assert_eq!(rg.animation().interval(), Duration::from_millis(25));
    }

    #[test]
    fn malformed_overrides_are_configuration_errors() {
        let bad = json!({ "orientation": "diagonal" });
        assert!(matches!(
            VizConfig::for_kind(Kind::Spacetree, Some(&bad)),
            Err(Error::Config { .. })
        ));
        assert!(VizConfig::for_kind(Kind::RGraph, Some(&json!([1, 2]))).is_err());

        let mut st = VizConfig::for_kind(Kind::Spacetree, None).unwrap();
        st.node.align = "middle".to_string();
        assert!(matches!(st.tree_options(), Err(Error::Layout(_))));
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("RGraph".parse::<Kind>().unwrap(), Kind::RGraph);
        assert_eq!("st".parse::<Kind>().unwrap(), Kind::Spacetree);
        assert!("treemap".parse::<Kind>().is_err());
    }
}
