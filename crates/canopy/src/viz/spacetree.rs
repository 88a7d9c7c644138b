//! Spacetree: a tidy tree that shows a few levels around the selected node.
//!
//! A click runs a fixed chain: load missing subtrees, contract the branches leaving the view,
//! slide the clicked node to the origin, expand the levels that fit the canvas. Contract and
//! expand animate node alpha.

use canopy_graph::util::{self, UNBOUNDED};
use canopy_graph::{All, Complex, Input, PosProp, SkipIgnored, TreeNode};
use canopy_layout::{Orientation, TreeOptions};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use serde_json::Value;
use std::str::FromStr;

use super::loader::Completion;
use super::{Dispatch, Then, Visualization, impl_viz};
use crate::anim::{Clock, Mode};
use crate::config::{Kind, VizConfig};
use crate::error::{Error, Result};
use crate::op::{self, OpOptions, OpType};

/// How a Spacetree applies a structural change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Animate,
    Replot,
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "animate" => Ok(Method::Animate),
            "replot" => Ok(Method::Replot),
            other => Err(Error::unsupported("method", other)),
        }
    }
}

#[derive(Debug)]
pub struct Spacetree(Visualization);

impl_viz!(Spacetree);

impl Spacetree {
    pub fn new(config: VizConfig) -> Self {
        Self(Visualization::new(Kind::Spacetree, config))
    }

    pub fn with_clock(config: VizConfig, clock: Box<dyn Clock>) -> Self {
        Self(Visualization::with_clock(Kind::Spacetree, config, clock))
    }

    pub fn from_overrides(overrides: Option<&Value>) -> Result<Self> {
        Ok(Self::new(VizConfig::for_kind(Kind::Spacetree, overrides)?))
    }

    pub fn into_inner(self) -> Visualization {
        self.0
    }

    pub fn set_loader(&mut self, loader: impl super::SubtreeLoader + 'static) {
        self.0.set_loader(loader);
    }

    /// Lays out the visible part of the tree into `pos` and `start_pos`.
    pub fn compute(&mut self) -> Result<()> {
        self.0.compute(&[PosProp::Pos, PosProp::StartPos])
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.0.refresh(false)
    }

    pub fn clicked(&self) -> Option<&str> {
        self.0.st.clicked.as_deref()
    }

    /// Deepest node shared by the clicked node and the extra path nodes.
    pub fn lca(&self) -> Option<&str> {
        self.0.st.lca.as_deref()
    }

    /// Keeps `id` and its ancestors selected on every later selection.
    pub fn add_node_in_path(&mut self, id: &str) {
        if !self.0.st.nodes_in_path.iter().any(|n| n == id) {
            self.0.st.nodes_in_path.push(id.to_string());
        }
    }

    pub fn clear_nodes_in_path(&mut self) {
        self.0.st.nodes_in_path.clear();
    }

    pub fn on_click(&mut self, id: &str) -> Result<Dispatch> {
        self.0.st_on_click(id)
    }

    /// Shows `id` as if it had been clicked, without animating.
    pub fn select(&mut self, id: &str) -> Result<Dispatch> {
        if self.0.busy {
            return Ok(Dispatch::Busy);
        }
        let deferred = self.0.st_select(id, None)?;
        if deferred {
            return Ok(Dispatch::Scheduled);
        }
        match self.0.error.take() {
            Some(err) => Err(err),
            None => Ok(Dispatch::Done),
        }
    }

    pub fn select_path(&mut self, id: &str) -> Result<()> {
        self.0.node(id)?;
        self.0.st_select_path(id);
        Ok(())
    }

    pub fn set_right_level_to_show(&mut self, id: &str) -> Result<()> {
        self.0.st_set_right_level_to_show(id)
    }

    pub fn nodes_to_hide(&self, id: &str) -> Result<Vec<String>> {
        let opts = self.0.config.tree_options()?;
        self.0.st_nodes_to_hide(id, &opts)
    }

    pub fn nodes_to_show(&self, id: &str) -> Vec<String> {
        self.0.st_nodes_to_show(id)
    }

    /// Re-lays the tree out with another orientation, then reselects the clicked node.
    pub fn switch_position(&mut self, orientation: Orientation, method: Method) -> Result<Dispatch> {
        self.0.st_switch_position(orientation, method)
    }

    /// Grafts `subtree` onto the node with the same id as its root.
    pub fn add_subtree(
        &mut self,
        subtree: &TreeNode,
        method: Method,
        on_complete: Option<Then>,
    ) -> Result<Dispatch> {
        let kind = match method {
            Method::Replot => OpType::Replot,
            Method::Animate => OpType::FadeSeq,
        };
        let input = Input::Tree(subtree.clone());
        op::sum(&mut self.0, &input, op_options(kind, on_complete))
    }

    /// Removes everything below `id`, and `id` itself when `remove_root` is set.
    pub fn remove_subtree(
        &mut self,
        id: &str,
        remove_root: bool,
        method: Method,
        on_complete: Option<Then>,
    ) -> Result<Dispatch> {
        if self.0.busy {
            return Ok(Dispatch::Busy);
        }
        self.0.node(id)?;
        self.0.st_levels()?;
        let begin = if remove_root { 0 } else { 1 };
        let mut ids = Vec::new();
        util::each_level(
            &self.0.graph,
            &self.0.traversal,
            id,
            begin,
            UNBOUNDED,
            &All,
            |n, _| ids.push(n.id.clone()),
        );
        ids.reverse();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let kind = match method {
            Method::Replot => OpType::Replot,
            Method::Animate => OpType::FadeSeq,
        };
        op::remove_nodes(&mut self.0, &refs, op_options(kind, on_complete))
    }
}

fn op_options(kind: OpType, on_complete: Option<Then>) -> OpOptions {
    OpOptions {
        on_complete,
        ..OpOptions::new(kind)
    }
}

fn levels(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(UNBOUNDED)
}

impl Visualization {
    pub(crate) fn st_levels(&mut self) -> Result<()> {
        let root = self.root_id()?;
        self.traversal = util::compute_levels(&self.graph, &root, 0, &SkipIgnored);
        Ok(())
    }

    /// The clicked node while it is still in the graph, the root otherwise.
    fn st_focus(&self) -> Result<String> {
        match self.st.clicked.as_deref() {
            Some(id) if self.graph.has_node(id) => Ok(id.to_string()),
            _ => self.root_id(),
        }
    }

    /// Whether `id` lies in the subtree of `of` (a node descends from itself).
    fn is_descendant(&self, id: &str, of: &str) -> bool {
        let mut stack = vec![id.to_string()];
        while let Some(cur) = stack.pop() {
            if cur == of {
                return true;
            }
            for parent in util::get_parents(&self.graph, &self.traversal, &cur) {
                stack.push(parent.id.clone());
            }
        }
        false
    }

    fn ancestors(&self, id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cur = Some(id.to_string());
        while let Some(c) = cur {
            cur = util::get_parents(&self.graph, &self.traversal, &c)
                .first()
                .map(|p| p.id.clone());
            chain.push(c);
        }
        chain
    }

    pub(crate) fn update_lca(&mut self) {
        let targets: Vec<String> = self
            .st
            .clicked
            .iter()
            .chain(self.st.nodes_in_path.iter())
            .filter(|id| self.graph.has_node(id))
            .cloned()
            .collect();
        let chains: Vec<Vec<String>> = targets.iter().map(|id| self.ancestors(id)).collect();
        self.st.lca = match chains.split_first() {
            None => self.root.clone(),
            Some((first, rest)) => first
                .iter()
                .find(|id| rest.iter().all(|chain| chain.contains(id)))
                .cloned(),
        };
    }

    fn st_right_level(&self, id: &str, opts: &TreeOptions) -> Result<u32> {
        let node = self.node(id)?;
        if !self.config.constrained {
            return Ok(opts.levels_to_show);
        }
        let canvas = (self.config.canvas.width, self.config.canvas.height);
        Ok(opts.right_level_to_show(&self.graph, &self.traversal, node, canvas))
    }

    /// Marks the levels below `id` that fit the canvas as existing and hides the rest.
    pub(crate) fn st_set_right_level_to_show(&mut self, id: &str) -> Result<()> {
        let opts = self.config.tree_options()?;
        let level = levels(self.st_right_level(id, &opts)?);
        let base = self.traversal.depth(id);
        let mut visits = Vec::new();
        util::each_level(
            &self.graph,
            &self.traversal,
            id,
            0,
            levels(opts.levels_to_show),
            &All,
            |n, d| visits.push((n.id.clone(), d - base)),
        );
        for (nid, rel) in visits {
            if let Some(n) = self.graph.get_node_mut(&nid) {
                if rel > level {
                    n.drawn = false;
                    n.exist = false;
                } else {
                    n.exist = true;
                }
            }
        }
        if let Some(n) = self.graph.get_node_mut(id) {
            n.drawn = true;
        }
        Ok(())
    }

    /// Selects `id` and its ancestors (plus the extra path nodes) and makes the siblings along
    /// the way visible.
    pub(crate) fn st_select_path(&mut self, id: &str) {
        for n in self.graph.nodes_mut() {
            n.selected = false;
        }
        let starts: Vec<String> = std::iter::once(id.to_string())
            .chain(self.st.nodes_in_path.iter().cloned())
            .collect();
        for start in starts {
            let mut cur = Some(start);
            while let Some(cid) = cur.take() {
                match self.graph.get_node_mut(&cid) {
                    Some(n) if !n.selected => n.selected = true,
                    _ => break,
                }
                let parent = util::get_parents(&self.graph, &self.traversal, &cid)
                    .first()
                    .map(|p| p.id.clone());
                let siblings: Vec<String> = match &parent {
                    Some(p) => {
                        util::get_subnodes(&self.graph, &self.traversal, p, util::LevelSpan::Range(1, 1), &All)
                            .iter()
                            .map(|n| n.id.clone())
                            .collect()
                    }
                    None => vec![cid.clone()],
                };
                for s in siblings {
                    if let Some(n) = self.graph.get_node_mut(&s) {
                        n.exist = true;
                        n.drawn = true;
                    }
                }
                cur = parent;
            }
        }
    }

    /// Visible, unselected nodes that leave the view when `id` becomes the clicked node.
    pub(crate) fn st_nodes_to_hide(&self, id: &str, opts: &TreeOptions) -> Result<Vec<String>> {
        let depth = self.traversal.depth(id);
        let mut out: IndexSet<String, FxBuildHasher> = IndexSet::default();
        for n in self.graph.nodes().filter(|n| n.exist && !n.selected) {
            if !self.is_descendant(&n.id, id) || self.traversal.depth(&n.id) <= depth {
                out.insert(n.id.clone());
            }
        }
        let leaf = levels(self.st_right_level(id, opts)?);
        util::each_level(&self.graph, &self.traversal, id, leaf, leaf, &All, |n, _| {
            if n.exist && !n.selected {
                out.insert(n.id.clone());
            }
        });
        for p in &self.st.nodes_in_path {
            if self.graph.has_node(p) && !self.is_descendant(p, id) {
                out.insert(p.clone());
            }
        }
        Ok(out.into_iter().collect())
    }

    /// Drawn nodes within the visible levels of `id` whose children are not drawn yet.
    pub(crate) fn st_nodes_to_show(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        util::each_level(
            &self.graph,
            &self.traversal,
            id,
            0,
            levels(self.config.levels_to_show),
            &All,
            |n, _| {
                let open = util::any_subnode(&self.graph, &self.traversal, &n.id, |s| s.drawn, &All);
                if n.drawn && !open {
                    out.push(n.id.clone());
                }
            },
        );
        out
    }

    /// Keeps the nodes that have existing children and are not inside another kept subtree.
    fn st_prepare(&self, ids: &[String]) -> Vec<String> {
        let with_children: Vec<&String> = ids
            .iter()
            .filter(|id| util::any_subnode(&self.graph, &self.traversal, id, |s| s.exist, &All))
            .collect();
        with_children
            .iter()
            .filter(|id| {
                !with_children
                    .iter()
                    .any(|other| other != *id && self.is_descendant(id, other))
            })
            .map(|id| (*id).clone())
            .collect()
    }

    fn st_descendants(&self, ids: &[String], end: i32, cond: impl Fn(&canopy_graph::Node) -> bool) -> Vec<String> {
        let mut out = Vec::new();
        for id in ids {
            util::each_level(&self.graph, &self.traversal, id, 1, end, &All, |n, _| {
                if cond(n) {
                    out.push(n.id.clone());
                }
            });
        }
        out
    }

    fn st_hide(&mut self, prepared: &[String]) {
        for id in self.st_descendants(prepared, UNBOUNDED, |n| n.exist) {
            if let Some(n) = self.graph.get_node_mut(&id) {
                n.drawn = false;
                n.exist = false;
                n.alpha = 1.0;
                n.start_alpha = 1.0;
                n.end_alpha = 1.0;
            }
        }
    }

    /// Draws the existing levels below `ids`; returns the nodes that were not drawn before.
    fn st_show(&mut self, ids: &[String]) -> Vec<String> {
        let prepared = self.st_prepare(ids);
        let mut shown = Vec::new();
        for id in &prepared {
            let mut visits = Vec::new();
            util::each_level(
                &self.graph,
                &self.traversal,
                id,
                0,
                levels(self.config.levels_to_show),
                &All,
                |n, _| {
                    if n.exist {
                        visits.push((n.id.clone(), n.drawn));
                    }
                },
            );
            for (nid, was_drawn) in visits {
                if let Some(n) = self.graph.get_node_mut(&nid) {
                    n.drawn = true;
                }
                if !was_drawn {
                    shown.push(nid);
                }
            }
        }
        shown
    }

    fn st_contract(&mut self, ids: Vec<String>, then: Then) {
        let prepared = self.st_prepare(&ids);
        for id in self.st_descendants(&prepared, UNBOUNDED, |n| n.exist) {
            if let Some(n) = self.graph.get_node_mut(&id) {
                n.start_alpha = n.alpha;
                n.end_alpha = 0.0;
            }
        }
        tracing::debug!(nodes = prepared.len(), "contract");
        let options = self.config.animation();
        self.animate_step(
            vec![Mode::FadeNodes],
            options,
            Box::new(move |viz: &mut Visualization| {
                viz.st_hide(&prepared);
                then(viz);
            }),
        );
    }

    fn st_expand(&mut self, ids: Vec<String>, then: Then) {
        let shown = self.st_show(&ids);
        for id in &shown {
            if let Some(n) = self.graph.get_node_mut(id) {
                n.alpha = 0.0;
                n.start_alpha = 0.0;
                n.end_alpha = 1.0;
            }
        }
        tracing::debug!(nodes = shown.len(), "expand");
        let options = self.config.animation();
        self.animate_step(vec![Mode::FadeNodes], options, then);
    }

    /// Lays out into `end_pos` and shifts it so that `id` lands on `-offset`.
    fn st_center_end_pos(&mut self, id: &str) -> Result<()> {
        self.compute(&[PosProp::EndPos])?;
        let offset = Complex::new(self.config.offset.x, self.config.offset.y);
        let shift = self.node(id)?.end_pos.getc() + offset;
        for n in self.graph.nodes_mut() {
            let end = n.end_pos.getc() - shift;
            n.end_pos.setc(end);
        }
        Ok(())
    }

    fn st_move(&mut self, id: &str, then: Then) -> Result<()> {
        self.st_center_end_pos(id)?;
        let options = self.config.animation();
        self.animate_step(vec![Mode::Linear], options, then);
        Ok(())
    }

    /// Asks the loader for the subtrees below the visible leaves of `id`, merges the replies and
    /// runs `then`. Returns whether `then` was deferred to a later tick.
    fn st_request_nodes(&mut self, id: &str, then: Then) -> bool {
        if self.loader.is_none() {
            then(self);
            return false;
        }
        let lev = levels(self.config.levels_to_show);
        let base = self.traversal.depth(id);
        let mut leaves = Vec::new();
        util::each_level(&self.graph, &self.traversal, id, 0, lev, &All, |n, d| {
            let has_children = util::any_subnode(&self.graph, &self.traversal, &n.id, |_| true, &All);
            if n.drawn && !has_children {
                let level = u32::try_from(lev - (d - base)).unwrap_or(0);
                leaves.push((n.id.clone(), level));
            }
        });
        if leaves.is_empty() {
            then(self);
            return false;
        }

        let completion = Completion::new();
        if let Some(loader) = self.loader.as_mut() {
            for (leaf, level) in &leaves {
                tracing::debug!(node = %leaf, level, "request subtree");
                loader.request(leaf, *level, completion.clone());
            }
        }
        let expected = leaves.len();
        if completion.received() >= expected {
            self.st_merge_replies(&completion);
            then(self);
            return false;
        }

        let ready = completion.clone();
        self.scheduler.when(
            Box::new(move |_: &mut Visualization| ready.received() >= expected),
            Box::new(move |viz: &mut Visualization| {
                viz.st_merge_replies(&completion);
                then(viz);
            }),
        );
        true
    }

    fn st_merge_replies(&mut self, completion: &Completion) {
        for (node_id, data) in completion.take() {
            let Some(mut subtree) = data else {
                continue;
            };
            if subtree.children.is_empty() {
                continue;
            }
            subtree.id = node_id;
            let merged = Input::Tree(subtree)
                .append_to(&mut self.graph)
                .map_err(Error::from);
            self.record(merged);
        }
        let relevelled = self.st_levels();
        self.record(relevelled);
    }

    pub(crate) fn st_on_click(&mut self, id: &str) -> Result<Dispatch> {
        if self.busy {
            return Ok(Dispatch::Busy);
        }
        self.node(id)?;
        self.st_levels()?;
        self.busy = true;
        self.st_select_path(id);
        self.st.clicked = Some(id.to_string());
        self.notify(id, |c, n| c.on_before_compute(n));
        self.notify(id, |c, n| c.on_before_request(n));
        tracing::debug!(node = id, "spacetree click");

        let target = id.to_string();
        self.st_request_nodes(
            id,
            Box::new(move |viz: &mut Visualization| {
                viz.notify(&target, |c, n| c.on_before_contract(n));
                let hide = viz
                    .config
                    .tree_options()
                    .and_then(|opts| viz.st_nodes_to_hide(&target, &opts));
                let hide = match hide {
                    Ok(hide) => hide,
                    Err(err) => return viz.abort(err),
                };
                viz.st_contract(
                    hide,
                    Box::new(move |viz: &mut Visualization| {
                        if let Err(err) = viz.st_set_right_level_to_show(&target) {
                            return viz.abort(err);
                        }
                        viz.notify(&target, |c, n| c.on_before_move(n));
                        let clicked = target.clone();
                        let moved = viz.st_move(
                            &target,
                            Box::new(move |viz: &mut Visualization| {
                                viz.notify(&clicked, |c, n| c.on_before_expand(n));
                                let show = viz.st_nodes_to_show(&clicked);
                                viz.st_expand(
                                    show,
                                    Box::new(|viz: &mut Visualization| {
                                        viz.busy = false;
                                        viz.controller.on_after_compute();
                                        viz.finish(None);
                                    }),
                                );
                            }),
                        );
                        if let Err(err) = moved {
                            viz.abort(err);
                        }
                    }),
                );
            }),
        );
        Ok(Dispatch::Scheduled)
    }

    /// Returns whether the selection waits on the loader.
    pub(crate) fn st_select(&mut self, id: &str, then: Option<Then>) -> Result<bool> {
        self.node(id)?;
        self.st_levels()?;
        self.notify(id, |c, n| c.on_before_compute(n));
        self.st_select_path(id);
        self.st.clicked = Some(id.to_string());
        let target = id.to_string();
        Ok(self.st_request_nodes(
            id,
            Box::new(move |viz: &mut Visualization| {
                let shown = viz.st_show_selection(&target);
                viz.record(shown);
                if let Some(then) = then {
                    then(viz);
                }
            }),
        ))
    }

    fn st_show_selection(&mut self, id: &str) -> Result<()> {
        let opts = self.config.tree_options()?;
        let hide = self.st_nodes_to_hide(id, &opts)?;
        let prepared = self.st_prepare(&hide);
        self.st_hide(&prepared);
        self.st_set_right_level_to_show(id)?;
        self.compute(&[PosProp::Pos])?;
        for n in self.graph.nodes_mut() {
            let pos = n.pos.getc();
            n.start_pos.setc(pos);
            n.end_pos.setc(pos);
        }
        let offset = Complex::new(self.config.offset.x, self.config.offset.y);
        let shift = self.node(id)?.end_pos.getc() + offset;
        for n in self.graph.nodes_mut() {
            for prop in PosProp::ALL {
                let p = n.position(prop).getc() - shift;
                n.position_mut(prop).setc(p);
            }
        }
        let show = self.st_nodes_to_show(id);
        self.st_show(&show);
        self.plot()?;
        self.controller.on_after_compute();
        self.controller.on_complete();
        Ok(())
    }

    pub(crate) fn st_reposition(&mut self) -> Result<()> {
        self.st_levels()?;
        let focus = self.st_focus()?;
        self.st_set_right_level_to_show(&focus)?;
        for n in self.graph.nodes_mut() {
            if n.exist {
                n.drawn = true;
            }
        }
        self.compute(&[PosProp::EndPos])
    }

    pub(crate) fn st_refresh(&mut self) -> Result<()> {
        self.st_reposition()?;
        let focus = self.st_focus()?;
        self.st_select(&focus, None)?;
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn st_switch_position(&mut self, orientation: Orientation, method: Method) -> Result<Dispatch> {
        if self.busy {
            return Ok(Dispatch::Busy);
        }
        let mut opts = self.config.tree_options()?;
        opts.orientation = orientation;
        let focus = self.st_focus()?;
        let hide = self.st_nodes_to_hide(&focus, &opts)?;
        self.busy = true;
        tracing::debug!(?orientation, ?method, "switch position");
        self.st_contract(
            hide,
            Box::new(move |viz: &mut Visualization| {
                viz.config.orientation = orientation;
                let computed = viz.compute(&[PosProp::EndPos]);
                viz.record(computed);
                viz.busy = false;
                let reselected = match method {
                    Method::Animate => viz.st_on_click(&focus).map(|_| ()),
                    Method::Replot => viz.st_select(&focus, None).map(|_| ()),
                };
                viz.record(reselected);
            }),
        );
        Ok(Dispatch::Scheduled)
    }
}
