#[derive(Debug, Clone, Copy, Default)]
pub struct GraphOptions {
    /// Store positions in Cartesian form (tree layouts) instead of polar form (radial layouts).
    pub complex: bool,
    pub node: NodeDefaults,
}

/// Initial flag values for nodes created by the graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeDefaults {
    pub selected: bool,
    pub exist: bool,
    pub drawn: bool,
}

impl GraphOptions {
    /// Polar positions, every node visible from the start.
    pub fn radial() -> Self {
        Self {
            complex: false,
            node: NodeDefaults {
                selected: false,
                exist: true,
                drawn: true,
            },
        }
    }

    /// Cartesian positions, nodes hidden until the tree reveals them.
    pub fn tree() -> Self {
        Self {
            complex: true,
            node: NodeDefaults::default(),
        }
    }
}
