use canopy_graph::Node;

/// Node footprint used by the layouts.
///
/// When `overridable` is set, `$width`, `$height`, `$dim` and `$aw` entries in a node's data take
/// precedence over the configured values. A zero override falls back to the configured value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeDims {
    pub width: f64,
    pub height: f64,
    pub dim: f64,
    pub overridable: bool,
}

impl Default for NodeDims {
    fn default() -> Self {
        Self {
            width: 90.0,
            height: 20.0,
            dim: 15.0,
            overridable: false,
        }
    }
}

impl NodeDims {
    fn read(&self, node: &Node, key: &str, fallback: f64) -> f64 {
        if !self.overridable {
            return fallback;
        }
        node.data_f64(key)
            .filter(|v| *v != 0.0)
            .unwrap_or(fallback)
    }

    pub fn width_of(&self, node: &Node) -> f64 {
        self.read(node, "$width", self.width)
    }

    pub fn height_of(&self, node: &Node) -> f64 {
        self.read(node, "$height", self.height)
    }

    pub fn dim_of(&self, node: &Node) -> f64 {
        self.read(node, "$dim", self.dim)
    }

    /// Diameter used for angular widths.
    pub fn angular_of(&self, node: &Node) -> f64 {
        self.read(node, "$aw", self.dim)
    }
}
