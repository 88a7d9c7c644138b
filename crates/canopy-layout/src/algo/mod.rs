pub mod hyperbolic;
pub mod radial;
pub mod tree;

pub use hyperbolic::HyperbolicOptions;
pub use radial::RadialOptions;
pub use tree::{Align, BoundingBox, EdgeEnd, Orientation, TreeOptions};

#[derive(Debug, Clone, PartialEq)]
pub enum Algorithm {
    /// Tidy tree with extent fitting (Spacetree).
    Tree(TreeOptions),
    /// Concentric rings (RGraph).
    Radial(RadialOptions),
    /// Poincaré disk (Hypertree).
    Hyperbolic(HyperbolicOptions),
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Tree(_) => "tree",
            Algorithm::Radial(_) => "radial",
            Algorithm::Hyperbolic(_) => "hyperbolic",
        }
    }

    /// Whether node positions are kept in Cartesian form.
    pub fn is_complex(&self) -> bool {
        matches!(self, Algorithm::Tree(_))
    }
}
