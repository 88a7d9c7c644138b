//! Tidy tree layout with per-level extents.
//!
//! Each subtree is summarized by its extent: one `(min, max)` interval per level along the
//! breadth axis, relative to the subtree root. Sibling subtrees are packed by fitting extents
//! against the accumulated contour from the left and from the right and averaging both passes,
//! which centers the children under their parent.
//!
//! Orientation decides which axis is the breadth axis (`y` for `left`/`right`, `x` for
//! `top`/`bottom`) and in which direction levels grow.

use canopy_graph::util::{self, LevelSpan};
use canopy_graph::{All, Complex, Graph, Node, PosProp, SkipIgnored, Traversal};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::dims::NodeDims;
use crate::error::{Error, Result};

pub type Extent = Vec<(f64, f64)>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
}

impl Orientation {
    /// Picks the value for the current orientation, in `top, right, bottom, left` order.
    pub fn dispatch<T>(self, top: T, right: T, bottom: T, left: T) -> T {
        match self {
            Orientation::Top => top,
            Orientation::Right => right,
            Orientation::Bottom => bottom,
            Orientation::Left => left,
        }
    }

    /// Levels grow along `x` and siblings spread along `y`.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Orientation::Left | Orientation::Right)
    }

    fn grows_positive(self) -> bool {
        matches!(self, Orientation::Top | Orientation::Left)
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Orientation::Left),
            "right" => Ok(Orientation::Right),
            "top" => Ok(Orientation::Top),
            "bottom" => Ok(Orientation::Bottom),
            other => Err(Error::Unsupported {
                what: "orientation",
                value: other.to_string(),
            }),
        }
    }
}

/// Where a node box sits relative to its position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Center,
    Left,
    Right,
}

impl FromStr for Align {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "center" => Ok(Align::Center),
            "left" => Ok(Align::Left),
            "right" => Ok(Align::Right),
            other => Err(Error::Unsupported {
                what: "align",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEnd {
    Begin,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeOptions {
    pub orientation: Orientation,
    /// Gap between neighbouring subtrees below the first level.
    pub subtree_offset: f64,
    /// Gap between adjacent siblings.
    pub sibling_offset: f64,
    pub level_distance: f64,
    pub levels_to_show: u32,
    pub dims: NodeDims,
    pub align: Align,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Left,
            subtree_offset: 8.0,
            sibling_offset: 5.0,
            level_distance: 30.0,
            levels_to_show: 2,
            dims: NodeDims::default(),
            align: Align::Center,
        }
    }
}

pub fn move_extent(extent: &[(f64, f64)], val: f64) -> Extent {
    extent.iter().map(|&(a, b)| (a + val, b + val)).collect()
}

/// Combines two contours, `ps` on the left and `qs` on the right.
pub fn merge(ps: &[(f64, f64)], qs: &[(f64, f64)]) -> Extent {
    let n = ps.len().min(qs.len());
    let mut out: Extent = ps.iter().zip(qs).map(|(p, q)| (p.0, q.1)).collect();
    if ps.len() > n {
        out.extend_from_slice(&ps[n..]);
    } else {
        out.extend_from_slice(&qs[n..]);
    }
    out
}

pub fn merge_list(extents: &[Extent]) -> Extent {
    extents
        .iter()
        .rev()
        .fold(Vec::new(), |acc, ps| merge(ps, &acc))
}

/// Smallest offset for `ext2` that keeps it clear of `ext1` on every shared level.
pub fn fit(ext1: &[(f64, f64)], ext2: &[(f64, f64)], subtree_offset: f64, sibling_offset: f64) -> f64 {
    let n = ext1.len().min(ext2.len());
    (0..n).rev().fold(0.0, |deeper, i| {
        (deeper + subtree_offset).max(ext1[i].1 - ext2[i].0 + sibling_offset)
    })
}

pub fn fit_list_l(extents: &[Extent], subtree_offset: f64, sibling_offset: f64) -> Vec<f64> {
    let mut acc: Extent = Vec::new();
    let mut out = Vec::with_capacity(extents.len());
    for e in extents {
        let ans = fit(&acc, e, subtree_offset, sibling_offset);
        acc = merge(&acc, &move_extent(e, ans));
        out.push(ans);
    }
    out
}

pub fn fit_list_r(extents: &[Extent], subtree_offset: f64, sibling_offset: f64) -> Vec<f64> {
    let mut acc: Extent = Vec::new();
    let mut out = Vec::with_capacity(extents.len());
    for e in extents.iter().rev() {
        let ans = -fit(e, &acc, subtree_offset, sibling_offset);
        acc = merge(&move_extent(e, ans), &acc);
        out.push(ans);
    }
    out.reverse();
    out
}

/// Average of the left and right packings.
pub fn fit_list(extents: &[Extent], subtree_offset: f64, sibling_offset: f64) -> Vec<f64> {
    let l = fit_list_l(extents, subtree_offset, sibling_offset);
    let r = fit_list_r(extents, subtree_offset, sibling_offset);
    l.iter().zip(&r).map(|(a, b)| (a + b) / 2.0).collect()
}

struct Designer<'a> {
    graph: &'a Graph,
    traversal: &'a Traversal,
    opts: &'a TreeOptions,
    boundaries: FxHashMap<i32, (f64, f64)>,
    /// `(breadth, depth)` per node; breadth relative to the parent until absolutized.
    placed: FxHashMap<String, (f64, f64)>,
}

impl<'a> Designer<'a> {
    fn breadth_size(&self, node: &Node) -> f64 {
        if self.opts.orientation.is_horizontal() {
            self.opts.dims.height_of(node)
        } else {
            self.opts.dims.width_of(node)
        }
    }

    fn depth_size(&self, node: &Node) -> f64 {
        if self.opts.orientation.is_horizontal() {
            self.opts.dims.width_of(node)
        } else {
            self.opts.dims.height_of(node)
        }
    }

    /// Largest depth-axis size among the nodes of one level.
    fn level_boundary(&mut self, level: i32) -> f64 {
        let (w, h) = match self.boundaries.get(&level) {
            Some(b) => *b,
            None => {
                let b = boundaries(self.graph, self.traversal, &self.opts.dims, level);
                self.boundaries.insert(level, b);
                b
            }
        };
        if self.opts.orientation.is_horizontal() { w } else { h }
    }

    fn design(&mut self, node: &'a Node, maxsize: Option<f64>, acum: f64) -> Extent {
        let sval = self.breadth_size(node);
        let notsval = maxsize.unwrap_or_else(|| self.depth_size(node));
        let chacum = notsval + self.opts.level_distance;

        let children: Vec<&'a Node> =
            util::get_subnodes(self.graph, self.traversal, &node.id, LevelSpan::Range(1, 1), &All)
                .into_iter()
                .filter(|n| n.exist)
                .collect();

        let mut child_size = None;
        let mut extents = Vec::with_capacity(children.len());
        for child in &children {
            let size = match child_size {
                Some(s) => s,
                None => {
                    let s = self.level_boundary(self.traversal.depth(&child.id));
                    child_size = Some(s);
                    s
                }
            };
            extents.push(self.design(child, Some(size), acum + chacum));
        }

        let positions = fit_list(&extents, self.opts.subtree_offset, self.opts.sibling_offset);
        let mut moved = Vec::with_capacity(extents.len());
        for ((child, extent), pos) in children.iter().zip(&extents).zip(&positions) {
            if let Some(p) = self.placed.get_mut(&child.id) {
                p.0 += pos;
            }
            moved.push(move_extent(extent, *pos));
        }

        let depth = if self.opts.orientation.grows_positive() {
            acum
        } else {
            -acum
        };
        self.placed.insert(node.id.clone(), (0.0, depth));

        let mut result = vec![(-sval / 2.0, sval / 2.0)];
        result.extend(merge_list(&moved));
        result
    }

    fn absolutize(&mut self, node: &Node, base: f64) {
        let children: Vec<&Node> =
            util::get_subnodes(self.graph, self.traversal, &node.id, LevelSpan::Range(1, 1), &All)
                .into_iter()
                .filter(|n| n.exist)
                .collect();
        for child in children {
            let Some(p) = self.placed.get_mut(&child.id) else {
                continue;
            };
            p.0 += base;
            let abs = p.0;
            self.absolutize(child, abs);
        }
    }
}

/// Max `(width, height)` among nodes at `level`, or the configured size when not overridable.
pub fn boundaries(graph: &Graph, traversal: &Traversal, dims: &NodeDims, level: i32) -> (f64, f64) {
    if !dims.overridable {
        return (dims.width, dims.height);
    }
    let mut w: f64 = -1.0;
    let mut h: f64 = -1.0;
    for node in graph.nodes().filter(|n| traversal.depth(&n.id) == level) {
        w = w.max(dims.width_of(node));
        h = h.max(dims.height_of(node));
    }
    (w, h)
}

impl TreeOptions {
    fn to_complex(&self, breadth: f64, depth: f64) -> Complex {
        if self.orientation.is_horizontal() {
            Complex::new(depth, breadth)
        } else {
            Complex::new(breadth, depth)
        }
    }

    /// Lays out the visible (`exist`) part of the tree below `root`.
    pub fn compute_positions(
        &self,
        graph: &mut Graph,
        root: &str,
        props: &[PosProp],
    ) -> Result<Traversal> {
        let traversal = util::compute_levels(graph, root, 0, &SkipIgnored);
        let placed = {
            let Some(root_node) = graph.get_node(root) else {
                return Err(Error::MissingRoot { id: root.to_string() });
            };
            let mut designer = Designer {
                graph,
                traversal: &traversal,
                opts: self,
                boundaries: FxHashMap::default(),
                placed: FxHashMap::default(),
            };
            designer.design(root_node, None, 0.0);
            designer.absolutize(root_node, 0.0);
            designer.placed
        };

        tracing::debug!(root, nodes = placed.len(), orientation = ?self.orientation, "tree layout");
        for (id, (breadth, depth)) in placed {
            let c = self.to_complex(breadth, depth);
            if let Some(node) = graph.get_node_mut(&id) {
                for prop in props {
                    node.position_mut(*prop).setc(c);
                }
            }
        }
        Ok(traversal)
    }

    /// Begin or end point of an edge drawn at `node` (its `pos` property).
    pub fn edge_anchor(&self, node: &Node, end: EdgeEnd) -> Complex {
        let w = self.dims.width_of(node);
        let h = self.dims.height_of(node);
        let o = self.orientation;
        let offset = match (end, self.align) {
            (EdgeEnd::Begin, Align::Center) => o.dispatch(
                Complex::new(0.0, h / 2.0),
                Complex::new(-w / 2.0, 0.0),
                Complex::new(0.0, -h / 2.0),
                Complex::new(w / 2.0, 0.0),
            ),
            (EdgeEnd::Begin, Align::Left) => o.dispatch(
                Complex::new(0.0, h),
                Complex::ZERO,
                Complex::ZERO,
                Complex::new(w, 0.0),
            ),
            (EdgeEnd::Begin, Align::Right) => o.dispatch(
                Complex::ZERO,
                Complex::new(-w, 0.0),
                Complex::new(0.0, -h),
                Complex::ZERO,
            ),
            (EdgeEnd::End, Align::Center) => o.dispatch(
                Complex::new(0.0, -h / 2.0),
                Complex::new(w / 2.0, 0.0),
                Complex::new(0.0, h / 2.0),
                Complex::new(-w / 2.0, 0.0),
            ),
            (EdgeEnd::End, Align::Left) => o.dispatch(
                Complex::ZERO,
                Complex::new(w, 0.0),
                Complex::new(0.0, h),
                Complex::ZERO,
            ),
            (EdgeEnd::End, Align::Right) => o.dispatch(
                Complex::new(0.0, -h),
                Complex::ZERO,
                Complex::ZERO,
                Complex::new(-w, 0.0),
            ),
        };
        node.pos.getc() + offset
    }

    /// Node size plus sibling offset along the breadth axis (`invert` picks the other axis).
    pub fn node_size(&self, node: &Node, invert: bool) -> f64 {
        let w = self.dims.width_of(node) + self.sibling_offset;
        let h = self.dims.height_of(node) + self.sibling_offset;
        let vertical = !self.orientation.is_horizontal();
        match (vertical, invert) {
            (true, false) | (false, true) => h,
            (true, true) | (false, false) => w,
        }
    }

    /// Space needed along the breadth axis to show `level` levels below `node`.
    pub fn tree_base_size(&self, graph: &Graph, traversal: &Traversal, node: &Node, level: u32) -> f64 {
        let size = self.node_size(node, true);
        let is_leaf = level == 0 || !util::any_subnode(graph, traversal, &node.id, |_| true, &All);
        if is_leaf {
            return size;
        }
        let base: f64 =
            util::get_subnodes(graph, traversal, &node.id, LevelSpan::Range(1, 1), &All)
                .iter()
                .map(|child| self.tree_base_size(graph, traversal, child, level - 1))
                .sum();
        size.max(base) + self.subtree_offset
    }

    pub fn tree_fits(
        &self,
        graph: &Graph,
        traversal: &Traversal,
        node: &Node,
        canvas: (f64, f64),
        level: u32,
    ) -> bool {
        let available = if self.orientation.is_horizontal() {
            canvas.1
        } else {
            canvas.0
        };
        self.tree_base_size(graph, traversal, node, level) < available
    }

    /// Deepest level (at most `levels_to_show`, at least 1) whose subtree fits the canvas.
    pub fn right_level_to_show(
        &self,
        graph: &Graph,
        traversal: &Traversal,
        node: &Node,
        canvas: (f64, f64),
    ) -> u32 {
        let mut level = self.levels_to_show;
        while level > 1 && !self.tree_fits(graph, traversal, node, canvas, level) {
            level -= 1;
        }
        level
    }

    /// Box around the visible subtree of `node`, using current `pos` values and node sizes.
    pub fn bounding_box(&self, graph: &Graph, traversal: &Traversal, node: &Node) -> BoundingBox {
        let mut bb = BoundingBox {
            left: f64::INFINITY,
            right: f64::NEG_INFINITY,
            top: f64::INFINITY,
            bottom: f64::NEG_INFINITY,
        };
        util::each_subgraph(graph, traversal, &node.id, &All, |n, _| {
            if !n.exist && n.id != node.id {
                return;
            }
            let c = n.pos.getc();
            let (hw, hh) = (self.dims.width_of(n) / 2.0, self.dims.height_of(n) / 2.0);
            bb.left = bb.left.min(c.x - hw);
            bb.right = bb.right.max(c.x + hw);
            bb.top = bb.top.min(c.y - hh);
            bb.bottom = bb.bottom.max(c.y + hh);
        });
        bb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_outer_bounds_and_longer_tail() {
        let ps = vec![(-1.0, 1.0), (-2.0, 2.0), (-3.0, 3.0)];
        let qs = vec![(4.0, 6.0)];
        assert_eq!(merge(&ps, &qs), vec![(-1.0, 6.0), (-2.0, 2.0), (-3.0, 3.0)]);
        assert_eq!(merge(&[], &qs), qs);
    }

    #[test]
    fn merge_list_folds_from_the_right() {
        let a = vec![(0.0, 1.0)];
        let b = vec![(2.0, 3.0), (2.0, 4.0)];
        let c = vec![(5.0, 6.0)];
        assert_eq!(
            merge_list(&[a, b, c]),
            vec![(0.0, 6.0), (2.0, 4.0)]
        );
    }

    #[test]
    fn fit_respects_both_offsets() {
        let e = vec![(-10.0, 10.0)];
        assert_eq!(fit(&e, &e, 8.0, 5.0), 25.0);
        // Deeper levels only need the subtree offset on top of the deeper fit.
        let wide_below = vec![(-1.0, 1.0), (-50.0, 50.0)];
        assert_eq!(fit(&wide_below, &wide_below, 8.0, 5.0), 113.0);
        assert_eq!(fit(&[], &e, 8.0, 5.0), 0.0);
    }

    #[test]
    fn fit_list_centers_siblings() {
        let e = vec![(-10.0, 10.0)];
        let positions = fit_list(&[e.clone(), e.clone(), e], 8.0, 5.0);
        assert_eq!(positions, vec![-25.0, 0.0, 25.0]);
    }
}
