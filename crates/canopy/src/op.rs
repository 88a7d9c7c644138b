//! Structural graph operations: removing nodes or edges, adding a subgraph (`sum`) and turning
//! the graph into another one (`morph`), each optionally animated.
//!
//! Animated operations mark the visualization busy until they complete; any operation requested
//! meanwhile is refused with [`Dispatch::Busy`] and leaves the graph untouched.

use canopy_graph::{Graph, Input, Polar};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use crate::anim::{AnimationOptions, Mode, Transition};
use crate::config::Kind;
use crate::error::{Error, Result};
use crate::viz::{Dispatch, Then, Visualization};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpType {
    /// Mutate the graph only.
    #[default]
    Nothing,
    /// Mutate, then recompute and plot without animating.
    Replot,
    /// Fade, then mutate, then animate the layout change (or the reverse when adding).
    FadeSeq,
    /// Fade and move at the same time.
    FadeCon,
    /// One element at a time.
    Iter,
}

impl OpType {
    pub fn as_str(self) -> &'static str {
        match self {
            OpType::Nothing => "nothing",
            OpType::Replot => "replot",
            OpType::FadeSeq => "fade:seq",
            OpType::FadeCon => "fade:con",
            OpType::Iter => "iter",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nothing" => Ok(OpType::Nothing),
            "replot" => Ok(OpType::Replot),
            "fade:seq" | "fade" => Ok(OpType::FadeSeq),
            "fade:con" => Ok(OpType::FadeCon),
            "iter" => Ok(OpType::Iter),
            other => Err(Error::unsupported("operation type", other)),
        }
    }
}

/// Options of a single operation. Animation timing defaults to 2000 ms at 30 fps; the transition
/// defaults to the visualization's.
pub struct OpOptions {
    pub kind: OpType,
    pub duration: Duration,
    pub fps: u32,
    pub transition: Option<Transition>,
    pub on_complete: Option<Then>,
}

impl fmt::Debug for OpOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpOptions")
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("fps", &self.fps)
            .field("transition", &self.transition)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for OpOptions {
    fn default() -> Self {
        Self::new(OpType::Nothing)
    }
}

impl OpOptions {
    pub fn new(kind: OpType) -> Self {
        Self {
            kind,
            duration: Duration::from_millis(2000),
            fps: 30,
            transition: None,
            on_complete: None,
        }
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Runs once the operation is finished, before the controller's `on_complete`.
    pub fn on_complete(mut self, then: impl FnOnce(&mut Visualization) + 'static) -> Self {
        self.on_complete = Some(Box::new(then));
        self
    }

    pub(crate) fn animation(&self, fallback: Transition) -> AnimationOptions {
        AnimationOptions {
            duration: self.duration,
            fps: self.fps,
            transition: self.transition.unwrap_or(fallback),
        }
    }
}

/// Runs the caller's continuation of a synchronous operation.
fn done(viz: &mut Visualization, opt: OpOptions) -> Result<Dispatch> {
    if let Some(then) = opt.on_complete {
        then(viz);
    }
    Ok(Dispatch::Done)
}

/// Removes `ids` from the graph.
pub fn remove_nodes(viz: &mut Visualization, ids: &[&str], opt: OpOptions) -> Result<Dispatch> {
    if viz.busy {
        return Ok(Dispatch::Busy);
    }
    let ids: Vec<String> = ids
        .iter()
        .filter(|id| viz.graph.has_node(id))
        .map(|id| id.to_string())
        .collect();
    tracing::debug!(op = %opt.kind, count = ids.len(), "remove nodes");

    match opt.kind {
        OpType::Nothing => {
            remove_all_nodes(&mut viz.graph, &ids);
            done(viz, opt)
        }
        OpType::Replot => {
            remove_all_nodes(&mut viz.graph, &ids);
            viz.refresh(true)?;
            done(viz, opt)
        }
        OpType::FadeSeq => {
            for id in &ids {
                if let Some(node) = viz.graph.get_node_mut(id) {
                    node.end_alpha = 0.0;
                }
            }
            let options = viz.animation_options(Some(&opt));
            let on_complete = opt.on_complete;
            viz.busy = true;
            viz.animate(
                vec![Mode::FadeNodes],
                options,
                None,
                Box::new(move |viz: &mut Visualization| {
                    remove_all_nodes(&mut viz.graph, &ids);
                    let repositioned = viz.reposition();
                    viz.record(repositioned);
                    viz.animate(
                        vec![Mode::Linear],
                        options,
                        None,
                        Box::new(move |viz: &mut Visualization| viz.finish(on_complete)),
                    );
                }),
            );
            Ok(Dispatch::Scheduled)
        }
        OpType::FadeCon => {
            let saved: Vec<(String, f64, bool)> = ids
                .iter()
                .filter_map(|id| viz.graph.get_node(id))
                .map(|n| (n.id.clone(), n.end_alpha, n.ignore))
                .collect();
            for id in &ids {
                if let Some(node) = viz.graph.get_node_mut(id) {
                    node.end_alpha = 0.0;
                    node.ignore = true;
                }
            }
            if let Err(err) = viz.reposition() {
                for (id, end_alpha, ignore) in saved {
                    if let Some(node) = viz.graph.get_node_mut(&id) {
                        node.end_alpha = end_alpha;
                        node.ignore = ignore;
                    }
                }
                return Err(err);
            }
            let options = viz.animation_options(Some(&opt));
            let on_complete = opt.on_complete;
            viz.busy = true;
            viz.animate(
                vec![Mode::FadeNodes, Mode::Linear],
                options,
                None,
                Box::new(move |viz: &mut Visualization| {
                    remove_all_nodes(&mut viz.graph, &ids);
                    viz.finish(on_complete);
                }),
            );
            Ok(Dispatch::Scheduled)
        }
        OpType::Iter => {
            let interval = step_interval(opt.duration, ids.len());
            let on_complete = opt.on_complete;
            iterate(
                viz,
                interval,
                ids,
                |graph: &mut Graph, id: &String| graph.remove_node(id),
                on_complete,
            );
            Ok(Dispatch::Scheduled)
        }
    }
}

/// Removes the undirected edges `pairs`.
pub fn remove_edges(
    viz: &mut Visualization,
    pairs: &[(&str, &str)],
    opt: OpOptions,
) -> Result<Dispatch> {
    if viz.busy {
        return Ok(Dispatch::Busy);
    }
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .filter(|(a, b)| viz.graph.get_adjacence(a, b).is_some())
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    tracing::debug!(op = %opt.kind, count = pairs.len(), "remove edges");

    match opt.kind {
        OpType::Nothing => {
            remove_all_edges(&mut viz.graph, &pairs);
            done(viz, opt)
        }
        OpType::Replot => {
            remove_all_edges(&mut viz.graph, &pairs);
            viz.refresh(true)?;
            done(viz, opt)
        }
        OpType::FadeSeq => {
            set_edge_fade(&mut viz.graph, &pairs, false);
            let options = viz.animation_options(Some(&opt));
            let on_complete = opt.on_complete;
            viz.busy = true;
            viz.animate(
                vec![Mode::FadeVertex],
                options,
                None,
                Box::new(move |viz: &mut Visualization| {
                    remove_all_edges(&mut viz.graph, &pairs);
                    let repositioned = viz.reposition();
                    viz.record(repositioned);
                    viz.animate(
                        vec![Mode::Linear],
                        options,
                        None,
                        Box::new(move |viz: &mut Visualization| viz.finish(on_complete)),
                    );
                }),
            );
            Ok(Dispatch::Scheduled)
        }
        OpType::FadeCon => {
            let saved: Vec<(String, String, f64, bool)> = pairs
                .iter()
                .flat_map(|(a, b)| [(a, b), (b, a)])
                .filter_map(|(from, to)| {
                    let adj = viz.graph.get_node(from)?.get_adjacency(to)?;
                    Some((from.clone(), to.clone(), adj.end_alpha, adj.ignore))
                })
                .collect();
            set_edge_fade(&mut viz.graph, &pairs, true);
            if let Err(err) = viz.reposition() {
                for (from, to, end_alpha, ignore) in saved {
                    if let Some(adj) = viz.graph.adjacency_mut(&from, &to) {
                        adj.end_alpha = end_alpha;
                        adj.ignore = ignore;
                    }
                }
                return Err(err);
            }
            let options = viz.animation_options(Some(&opt));
            let on_complete = opt.on_complete;
            viz.busy = true;
            viz.animate(
                vec![Mode::FadeVertex, Mode::Linear],
                options,
                None,
                Box::new(move |viz: &mut Visualization| {
                    remove_all_edges(&mut viz.graph, &pairs);
                    viz.finish(on_complete);
                }),
            );
            Ok(Dispatch::Scheduled)
        }
        OpType::Iter => {
            let interval = step_interval(opt.duration, pairs.len());
            let on_complete = opt.on_complete;
            iterate(
                viz,
                interval,
                pairs,
                |graph: &mut Graph, (a, b): &(String, String)| graph.remove_adjacence(a, b),
                on_complete,
            );
            Ok(Dispatch::Scheduled)
        }
    }
}

/// Adds the nodes and edges of `input` that the graph lacks.
///
/// Nodes that share no id with the current graph are added but stay unreachable from the root,
/// so layouts leave them where they are.
pub fn sum(viz: &mut Visualization, input: &Input, opt: OpOptions) -> Result<Dispatch> {
    if viz.busy {
        return Ok(Dispatch::Busy);
    }
    input.validate()?;
    tracing::debug!(op = %opt.kind, "sum");

    match opt.kind {
        OpType::Nothing => {
            input.append_to(&mut viz.graph)?;
            done(viz, opt)
        }
        OpType::Replot => {
            viz.refresh(true)?;
            input.append_to(&mut viz.graph)?;
            viz.refresh(true)?;
            done(viz, opt)
        }
        OpType::FadeSeq | OpType::FadeCon | OpType::Iter => {
            let fade_edges = preprocess_sum(&mut viz.graph, input)?;
            viz.reposition()?;
            let mut modes = vec![Mode::FadeNodes];
            if fade_edges {
                modes.push(Mode::FadeVertex);
            }
            let options = viz.animation_options(Some(&opt));
            let on_complete = opt.on_complete;
            viz.busy = true;

            if opt.kind == OpType::FadeCon {
                let root = viz.root.clone();
                place_new_nodes(&mut viz.graph, root.as_deref());
                let mut all = vec![position_mode(viz.kind, Mode::Linear)];
                all.extend(modes);
                viz.animate(
                    all,
                    options,
                    None,
                    Box::new(move |viz: &mut Visualization| viz.finish(on_complete)),
                );
            } else {
                viz.animate(
                    vec![Mode::Linear],
                    options,
                    None,
                    Box::new(move |viz: &mut Visualization| {
                        viz.animate(
                            modes,
                            options,
                            None,
                            Box::new(move |viz: &mut Visualization| viz.finish(on_complete)),
                        );
                    }),
                );
            }
            Ok(Dispatch::Scheduled)
        }
    }
}

/// Turns the graph into `input`: what is missing is added, what `input` lacks is removed.
pub fn morph(viz: &mut Visualization, input: &Input, opt: OpOptions) -> Result<Dispatch> {
    if viz.busy {
        return Ok(Dispatch::Busy);
    }
    let target = input.to_graph(*viz.graph.options())?;
    tracing::debug!(op = %opt.kind, nodes = target.node_count(), "morph");

    let keeps_root = viz
        .root
        .as_deref()
        .is_some_and(|root| target.has_node(root));
    if !keeps_root {
        viz.root = Some(input.root_id(0)?.to_string());
    }

    match opt.kind {
        OpType::Nothing | OpType::Replot => {
            input.append_to(&mut viz.graph)?;
            for (a, b) in viz.graph.edges() {
                if target.get_adjacence(&a, &b).is_none() {
                    viz.graph.remove_adjacence(&a, &b);
                }
            }
            for id in viz.graph.node_ids() {
                if !target.has_node(&id) {
                    viz.graph.remove_node(&id);
                }
            }
            if opt.kind == OpType::Replot {
                viz.refresh(true)?;
            }
            done(viz, opt)
        }
        OpType::FadeSeq | OpType::FadeCon | OpType::Iter => {
            let mut fade_edges = preprocess_sum(&mut viz.graph, input)?;

            for node in viz.graph.nodes_mut() {
                if !target.has_node(&node.id) {
                    node.alpha = 1.0;
                    node.start_alpha = 1.0;
                    node.end_alpha = 0.0;
                    node.ignore = true;
                }
            }
            for (a, b) in viz.graph.edges() {
                if target.get_adjacence(&a, &b).is_some() {
                    continue;
                }
                let both_kept = [&a, &b]
                    .iter()
                    .all(|id| viz.graph.get_node(id).is_some_and(|n| !n.ignore));
                if !both_kept {
                    continue;
                }
                for (from, to) in [(&a, &b), (&b, &a)] {
                    if let Some(adj) = viz.graph.adjacency_mut(from, to) {
                        adj.alpha = 1.0;
                        adj.start_alpha = 1.0;
                        adj.end_alpha = 0.0;
                        adj.ignore = true;
                    }
                }
                fade_edges = true;
            }

            viz.reposition()?;
            let root = viz.root.clone();
            place_new_nodes(&mut viz.graph, root.as_deref());

            let mut modes = vec![position_mode(viz.kind, Mode::Polar), Mode::FadeNodes];
            if fade_edges {
                modes.push(Mode::FadeVertex);
            }
            let options = viz.animation_options(Some(&opt));
            let on_complete = opt.on_complete;
            viz.busy = true;
            viz.animate(
                modes,
                options,
                None,
                Box::new(move |viz: &mut Visualization| {
                    remove_ignored(&mut viz.graph);
                    viz.finish(on_complete);
                }),
            );
            Ok(Dispatch::Scheduled)
        }
    }
}

/// Adds the nodes and edges of `input` missing from `graph`, prepared to fade in.
///
/// New nodes go from alpha 0 to 1. New edges between nodes that are already visible fade in as
/// well; the return value tells whether any did.
pub fn preprocess_sum(graph: &mut Graph, input: &Input) -> Result<bool> {
    let incoming = input.to_graph(*graph.options())?;

    for node in incoming.nodes() {
        if graph.has_node(&node.id) {
            continue;
        }
        let added = graph.add_node(&node.id, &node.name, node.data.clone());
        added.alpha = 0.0;
        added.start_alpha = 0.0;
        added.end_alpha = 1.0;
    }

    let mut fade_edges = false;
    for (a, b) in incoming.edges() {
        if graph.get_adjacence(&a, &b).is_some() {
            continue;
        }
        let data = incoming
            .get_adjacence(&a, &b)
            .map(|[adj, _]| (*adj.data).clone())
            .unwrap_or_default();
        graph.add_adjacence(&a, &b, data);

        let settled = [&a, &b].iter().all(|id| {
            graph
                .get_node(id)
                .is_some_and(|n| n.start_alpha == n.end_alpha)
        });
        if settled {
            for (from, to) in [(&a, &b), (&b, &a)] {
                if let Some(adj) = graph.adjacency_mut(from, to) {
                    adj.alpha = 0.0;
                    adj.start_alpha = 0.0;
                    adj.end_alpha = 1.0;
                }
            }
            fade_edges = true;
        }
    }
    Ok(fade_edges)
}

/// Trees move along straight lines; radial layouts use the requested mode.
fn position_mode(kind: Kind, radial: Mode) -> Mode {
    match kind {
        Kind::Spacetree => Mode::Linear,
        Kind::RGraph | Kind::Hypertree => radial,
    }
}

/// Nodes still sitting on the origin start at their target, so they fade in place.
fn place_new_nodes(graph: &mut Graph, root: Option<&str>) {
    for node in graph.nodes_mut() {
        if Some(node.id.as_str()) == root {
            continue;
        }
        let at_origin = node.pos.getp() == Polar::ORIGIN;
        if at_origin {
            let end = node.end_pos;
            node.pos.set(end);
            node.start_pos.set(end);
        }
    }
}

fn remove_all_nodes(graph: &mut Graph, ids: &[String]) {
    for id in ids {
        graph.remove_node(id);
    }
}

fn remove_all_edges(graph: &mut Graph, pairs: &[(String, String)]) {
    for (a, b) in pairs {
        graph.remove_adjacence(a, b);
    }
}

fn set_edge_fade(graph: &mut Graph, pairs: &[(String, String)], ignore: bool) {
    for (a, b) in pairs {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(adj) = graph.adjacency_mut(from, to) {
                adj.end_alpha = 0.0;
                adj.ignore |= ignore;
            }
        }
    }
}

fn remove_ignored(graph: &mut Graph) {
    let mut edges = Vec::new();
    for node in graph.nodes() {
        for adj in node.adjacencies().filter(|adj| adj.ignore) {
            edges.push((adj.node_from.clone(), adj.node_to.clone()));
        }
    }
    remove_all_edges(graph, &edges);

    let ids: Vec<String> = graph
        .nodes()
        .filter(|n| n.ignore)
        .map(|n| n.id.clone())
        .collect();
    remove_all_nodes(graph, &ids);
}

/// `ceil(duration / count)`, the pause between two steps of an `iter` operation.
fn step_interval(duration: Duration, count: usize) -> Duration {
    let count = count.max(1) as u128;
    let millis = duration.as_millis().div_ceil(count);
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

/// Applies `apply` to one item per step, refreshing after each.
fn iterate<T: 'static>(
    viz: &mut Visualization,
    interval: Duration,
    items: Vec<T>,
    apply: fn(&mut Graph, &T),
    on_complete: Option<Then>,
) {
    let queue = Rc::new(RefCell::new(VecDeque::from(items)));
    let pending = Rc::clone(&queue);
    viz.busy = true;
    viz.scheduler.sequence(
        interval,
        Box::new(move |_: &mut Visualization| !pending.borrow().is_empty()),
        Box::new(move |viz: &mut Visualization| {
            let next = queue.borrow_mut().pop_front();
            if let Some(item) = next {
                apply(&mut viz.graph, &item);
                let refreshed = viz.refresh(true);
                viz.record(refreshed);
            }
        }),
        Box::new(move |viz: &mut Visualization| viz.finish(on_complete)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_types_parse_with_the_fade_alias() {
        assert_eq!("fade".parse::<OpType>().unwrap(), OpType::FadeSeq);
        assert_eq!("fade:con".parse::<OpType>().unwrap(), OpType::FadeCon);
        assert_eq!("iter".parse::<OpType>().unwrap().to_string(), "iter");
        assert!(matches!(
            "explode".parse::<OpType>(),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn iter_steps_split_the_duration() {
        assert_eq!(
            step_interval(Duration::from_millis(2000), 3),
            Duration::from_millis(667)
        );
        assert_eq!(
            step_interval(Duration::from_millis(2000), 0),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn preprocess_sum_fades_in_new_structure_only() {
        let mut graph = Graph::new(canopy_graph::GraphOptions::radial());
        let base = Input::parse(r#"[{"id":"a","adjacencies":["b"]},{"id":"b"}]"#).unwrap();
        base.append_to(&mut graph).unwrap();

        let more = Input::parse(
            r#"[{"id":"a","adjacencies":["b","c"]},{"id":"b","adjacencies":["a"]},{"id":"c"}]"#,
        )
        .unwrap();
        // The new edge touches a fading node, so only node alphas change.
        assert!(!preprocess_sum(&mut graph, &more).unwrap());
        let c = graph.get_node("c").unwrap();
        assert_eq!((c.alpha, c.start_alpha, c.end_alpha), (0.0, 0.0, 1.0));
        assert_eq!(graph.get_node("a").unwrap().alpha, 1.0);

        let chord = Input::parse(r#"[{"id":"b","adjacencies":["x"]},{"id":"x"}]"#).unwrap();
        let mut settled = Graph::new(canopy_graph::GraphOptions::radial());
        base.append_to(&mut settled).unwrap();
        settled.add_node("x", "", Default::default());
        assert!(preprocess_sum(&mut settled, &chord).unwrap());
        let [bx, xb] = settled.get_adjacence("b", "x").unwrap();
        assert_eq!((bx.alpha, bx.end_alpha), (0.0, 1.0));
        assert_eq!((xb.alpha, xb.end_alpha), (0.0, 1.0));
    }
}
