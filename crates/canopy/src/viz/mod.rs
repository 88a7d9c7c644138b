//! Visualizations: a graph, a layout and an animation scheduler composed into one value.
//!
//! [`Visualization`] holds everything the three kinds share. [`Spacetree`], [`RGraph`] and
//! [`Hypertree`] wrap it and add their interaction flows; the shared surface is the [`Viz`] trait.

macro_rules! impl_viz {
    ($ty:ident) => {
        impl $crate::viz::Viz for $ty {
            fn core(&self) -> &$crate::viz::Visualization {
                &self.0
            }

            fn core_mut(&mut self) -> &mut $crate::viz::Visualization {
                &mut self.0
            }
        }
    };
}
pub(crate) use impl_viz;

mod hypertree;
mod loader;
mod rgraph;
mod spacetree;

pub use hypertree::Hypertree;
pub use loader::{Completion, SubtreeLoader, TreeSource};
pub use rgraph::RGraph;
pub use spacetree::{Method, Spacetree};

use canopy_graph::util;
use canopy_graph::{Complex, Graph, GraphOptions, Input, Node, PosProp, SkipIgnored, Traversal};
use canopy_layout::{Algorithm, ChildOrder, RadialOptions};
use serde_json::Value;
use std::fmt;

use crate::anim::{AnimationOptions, Clock, Mode, Scheduler, SystemClock, interp};
use crate::config::{Kind, VizConfig};
use crate::error::{Error, Result};
use crate::op::{self, OpOptions};
use crate::scene::Scene;

/// Continuation run by the engine once an operation or flow has finished.
pub type Then = crate::anim::scheduler::Then<Visualization>;

/// What happened to a request.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Applied synchronously.
    Done,
    /// Animation or loading jobs were queued; drive them with `tick` or `run_until_idle`.
    Scheduled,
    /// Another animated operation is in flight; nothing was changed.
    Busy,
}

/// Lifecycle hooks. Every hook defaults to a no-op.
pub trait Controller {
    fn on_before_compute(&mut self, _node: &Node) {}

    fn on_after_compute(&mut self) {}

    fn on_complete(&mut self) {}

    fn on_before_request(&mut self, _node: &Node) {}

    fn on_before_contract(&mut self, _node: &Node) {}

    fn on_before_move(&mut self, _node: &Node) {}

    fn on_before_expand(&mut self, _node: &Node) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopController;

impl Controller for NoopController {}

/// Spacetree selection state.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpacetreeState {
    pub(crate) clicked: Option<String>,
    pub(crate) nodes_in_path: Vec<String>,
    pub(crate) lca: Option<String>,
}

pub struct Visualization {
    pub(crate) kind: Kind,
    pub(crate) config: VizConfig,
    pub(crate) graph: Graph,
    pub(crate) root: Option<String>,
    pub(crate) traversal: Traversal,
    pub(crate) scheduler: Scheduler<Visualization>,
    pub(crate) busy: bool,
    pub(crate) controller: Box<dyn Controller>,
    pub(crate) plot_sink: Option<Box<dyn FnMut(&Scene)>>,
    pub(crate) last_scene: Option<Scene>,
    pub(crate) frames: usize,
    pub(crate) loader: Option<Box<dyn SubtreeLoader>>,
    pub(crate) error: Option<Error>,
    pub(crate) st: SpacetreeState,
    pub(crate) child_order: Option<ChildOrder>,
}

impl fmt::Debug for Visualization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visualization")
            .field("kind", &self.kind)
            .field("root", &self.root)
            .field("nodes", &self.graph.node_count())
            .field("busy", &self.busy)
            .field("frames", &self.frames)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

fn scheduler_of(viz: &mut Visualization) -> &mut Scheduler<Visualization> {
    &mut viz.scheduler
}

fn graph_options(kind: Kind) -> GraphOptions {
    match kind {
        Kind::Spacetree => GraphOptions::tree(),
        Kind::RGraph | Kind::Hypertree => GraphOptions::radial(),
    }
}

impl Visualization {
    pub fn new(kind: Kind, config: VizConfig) -> Self {
        Self::with_clock(kind, config, Box::new(SystemClock::default()))
    }

    pub fn with_clock(kind: Kind, config: VizConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            kind,
            config,
            graph: Graph::new(graph_options(kind)),
            root: None,
            traversal: Traversal::default(),
            scheduler: Scheduler::new(clock),
            busy: false,
            controller: Box::new(NoopController),
            plot_sink: None,
            last_scene: None,
            frames: 0,
            loader: None,
            error: None,
            st: SpacetreeState::default(),
            child_order: None,
        }
    }

    /// Kind defaults with `overrides` deep-merged on top.
    pub fn from_overrides(kind: Kind, overrides: Option<&Value>) -> Result<Self> {
        Ok(Self::new(kind, VizConfig::for_kind(kind, overrides)?))
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut VizConfig {
        &mut self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Levels from the last layout or level computation.
    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn scheduler(&self) -> &Scheduler<Visualization> {
        &self.scheduler
    }

    /// The most recently plotted frame.
    pub fn scene(&self) -> Option<&Scene> {
        self.last_scene.as_ref()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn set_controller(&mut self, controller: impl Controller + 'static) {
        self.controller = Box::new(controller);
    }

    /// Receives every plotted frame.
    pub fn on_plot(&mut self, sink: impl FnMut(&Scene) + 'static) {
        self.plot_sink = Some(Box::new(sink));
    }

    pub fn set_loader(&mut self, loader: impl SubtreeLoader + 'static) {
        self.loader = Some(Box::new(loader));
    }

    pub(crate) fn root_id(&self) -> Result<String> {
        self.root.clone().ok_or(Error::NotLoaded)
    }

    pub(crate) fn node(&self, id: &str) -> Result<&Node> {
        self.graph.get_node(id).ok_or_else(|| Error::NodeNotFound { id: id.to_string() })
    }

    /// Replaces the graph with `input`. The root is the tree root or the `root_index`-th graph
    /// element. Pending jobs are dropped.
    pub fn load(&mut self, input: &Input, root_index: usize) -> Result<()> {
        let graph = input.to_graph(graph_options(self.kind))?;
        let root = input.root_id(root_index)?.to_string();
        tracing::debug!(kind = %self.kind, root = %root, nodes = graph.node_count(), "load graph");

        self.scheduler.clear();
        self.busy = false;
        self.traversal = util::compute_levels(&graph, &root, 0, &SkipIgnored);
        self.graph = graph;
        self.root = Some(root);
        self.st = SpacetreeState::default();
        self.child_order = None;
        self.last_scene = None;
        self.error = None;
        Ok(())
    }

    pub fn load_json(&mut self, text: &str, root_index: usize) -> Result<()> {
        let input = Input::parse(text)?;
        self.load(&input, root_index)
    }

    pub(crate) fn algorithm(&self) -> Result<Algorithm> {
        Ok(match self.kind {
            Kind::Spacetree => Algorithm::Tree(self.config.tree_options()?),
            Kind::RGraph => Algorithm::Radial(RadialOptions {
                child_order: self.child_order.clone(),
                ..self.config.radial_options()
            }),
            Kind::Hypertree => Algorithm::Hyperbolic(self.config.hyperbolic_options()),
        })
    }

    /// Lays the graph out from the root into `props`.
    pub fn compute(&mut self, props: &[PosProp]) -> Result<()> {
        let root = self.root_id()?;
        let algorithm = self.algorithm()?;
        if self.kind == Kind::Spacetree {
            let node = self
                .graph
                .get_node_mut(&root)
                .ok_or_else(|| Error::NodeNotFound { id: root.clone() })?;
            node.drawn = true;
            node.exist = true;
            node.selected = true;
        }
        self.traversal = canopy_layout::layout(&mut self.graph, &root, &algorithm, props)?;
        if self.kind == Kind::Spacetree {
            self.update_lca();
        }
        Ok(())
    }

    /// Computes the next layout into `end_pos` without touching what is on screen.
    pub fn reposition(&mut self) -> Result<()> {
        match self.kind {
            Kind::Spacetree => self.st_reposition(),
            Kind::RGraph => self.compute(&[PosProp::EndPos]),
            Kind::Hypertree => self.ht_reposition(),
        }
    }

    /// Recomputes the layout and plots it without animating. A Hypertree keeps its current
    /// translation only when `reposition` is set.
    pub fn refresh(&mut self, reposition: bool) -> Result<()> {
        match self.kind {
            Kind::Spacetree => self.st_refresh(),
            Kind::RGraph => {
                self.compute(&PosProp::ALL)?;
                self.plot()
            }
            Kind::Hypertree => self.ht_refresh(reposition),
        }
    }

    /// Builds a scene from the current `pos` values and hands it to the plot sink.
    pub fn plot(&mut self) -> Result<()> {
        let scene = Scene::build(self)?;
        tracing::trace!(
            frame = scene.frame,
            nodes = scene.nodes.len(),
            edges = scene.edges.len(),
            "plot"
        );
        self.frames += 1;
        if let Some(sink) = self.plot_sink.as_mut() {
            sink(&scene);
        }
        self.last_scene = Some(scene);
        Ok(())
    }

    /// Plot from inside a scheduled job; the first failure is reported by the next `tick`.
    pub(crate) fn plot_frame(&mut self) {
        if let Err(err) = self.plot() {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }

    pub(crate) fn record(&mut self, result: Result<()>) {
        if let Err(err) = result {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }

    /// Records `err` and releases the busy flag of a flow that cannot continue.
    pub(crate) fn abort(&mut self, err: Error) {
        tracing::debug!(error = %err, "flow aborted");
        self.busy = false;
        self.record(Err(err));
    }

    pub(crate) fn notify(&mut self, id: &str, hook: fn(&mut dyn Controller, &Node)) {
        if let Some(node) = self.graph.get_node(id) {
            hook(self.controller.as_mut(), node);
        }
    }

    pub(crate) fn animation_options(&self, opt: Option<&OpOptions>) -> AnimationOptions {
        match opt {
            Some(opt) => opt.animation(self.config.transition),
            None => self.config.animation(),
        }
    }

    /// Interpolates every node with `modes` on each frame and plots it. On completion the
    /// interpolated values become the new start values, `on_after_compute` fires and `then` runs.
    pub(crate) fn animate(
        &mut self,
        modes: Vec<Mode>,
        options: AnimationOptions,
        versor: Option<Complex>,
        then: Then,
    ) {
        self.schedule_animation(modes, options, versor, true, then);
    }

    /// Like [`Self::animate`] without the `on_after_compute` hook, for steps of a longer flow.
    pub(crate) fn animate_step(
        &mut self,
        modes: Vec<Mode>,
        options: AnimationOptions,
        then: Then,
    ) {
        self.schedule_animation(modes, options, None, false, then);
    }

    fn schedule_animation(
        &mut self,
        modes: Vec<Mode>,
        options: AnimationOptions,
        versor: Option<Complex>,
        notify: bool,
        then: Then,
    ) {
        tracing::debug!(?modes, duration = ?options.duration, fps = options.fps, "animate");
        let compute = Box::new(move |viz: &mut Visualization, delta: f64| {
            let vector = versor.map(|v| v.scale(-delta));
            for node in viz.graph.nodes_mut() {
                for mode in &modes {
                    interp::apply(*mode, node, delta, vector);
                }
            }
            viz.plot_frame();
        });
        let complete = Box::new(move |viz: &mut Visualization| {
            for node in viz.graph.nodes_mut() {
                let pos = node.pos;
                node.start_pos.set(pos);
                node.start_alpha = node.alpha;
                for adj in node.adjacencies_mut() {
                    adj.start_alpha = adj.alpha;
                }
            }
            viz.plot_frame();
            if notify {
                viz.controller.on_after_compute();
            }
            then(viz);
        });
        self.scheduler.animate(options, compute, complete);
    }

    /// Clears `busy`, runs the caller's continuation and fires `on_complete`.
    pub(crate) fn finish(&mut self, on_complete: Option<Then>) {
        self.busy = false;
        if let Some(then) = on_complete {
            then(self);
        }
        self.controller.on_complete();
    }

    /// Advances every due job once. Errors raised while plotting inside a job surface here.
    pub fn tick(&mut self) -> Result<usize> {
        let advanced = Scheduler::tick(self, scheduler_of);
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(advanced),
        }
    }

    /// Ticks until no job is left, waiting on the clock between frames. Returns early when the
    /// only remaining jobs wait on subtrees that have not been delivered.
    pub fn run_until_idle(&mut self) -> Result<()> {
        loop {
            self.tick()?;
            if self.scheduler.is_idle() || self.scheduler.is_stalled() {
                return Ok(());
            }
            if let Some(deadline) = self.scheduler.next_deadline() {
                let now = self.scheduler.now();
                if deadline > now {
                    self.scheduler.clock().wait(deadline - now);
                }
            }
        }
    }
}

/// Operations every visualization supports.
pub trait Viz {
    fn core(&self) -> &Visualization;

    fn core_mut(&mut self) -> &mut Visualization;

    fn graph(&self) -> &Graph {
        self.core().graph()
    }

    fn config(&self) -> &VizConfig {
        self.core().config()
    }

    fn root(&self) -> Option<&str> {
        self.core().root()
    }

    fn is_busy(&self) -> bool {
        self.core().is_busy()
    }

    fn scene(&self) -> Option<&Scene> {
        self.core().scene()
    }

    fn load(&mut self, input: &Input, root_index: usize) -> Result<()> {
        self.core_mut().load(input, root_index)
    }

    fn load_json(&mut self, text: &str) -> Result<()> {
        self.core_mut().load_json(text, 0)
    }

    fn plot(&mut self) -> Result<()> {
        self.core_mut().plot()
    }

    fn reposition(&mut self) -> Result<()> {
        self.core_mut().reposition()
    }

    fn tick(&mut self) -> Result<usize> {
        self.core_mut().tick()
    }

    fn run_until_idle(&mut self) -> Result<()> {
        self.core_mut().run_until_idle()
    }

    fn set_controller(&mut self, controller: impl Controller + 'static)
    where
        Self: Sized,
    {
        self.core_mut().set_controller(controller);
    }

    fn on_plot(&mut self, sink: impl FnMut(&Scene) + 'static)
    where
        Self: Sized,
    {
        self.core_mut().on_plot(sink);
    }

    fn remove_nodes(&mut self, ids: &[&str], opt: OpOptions) -> Result<Dispatch> {
        op::remove_nodes(self.core_mut(), ids, opt)
    }

    fn remove_edges(&mut self, pairs: &[(&str, &str)], opt: OpOptions) -> Result<Dispatch> {
        op::remove_edges(self.core_mut(), pairs, opt)
    }

    fn sum(&mut self, input: &Input, opt: OpOptions) -> Result<Dispatch> {
        op::sum(self.core_mut(), input, opt)
    }

    fn morph(&mut self, input: &Input, opt: OpOptions) -> Result<Dispatch> {
        op::morph(self.core_mut(), input, opt)
    }
}

impl Viz for Visualization {
    fn core(&self) -> &Visualization {
        self
    }

    fn core_mut(&mut self) -> &mut Visualization {
        self
    }
}
