use canopy::{
    Dispatch, Input, Kind, ManualClock, OpOptions, OpType, RGraph, Spacetree, Viz, VizConfig,
};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

const TREE: &str = r#"{"id":"r","children":[
    {"id":"a","children":[{"id":"a1"},{"id":"a2"}]},
    {"id":"b","children":[{"id":"b1"}]},
    {"id":"c"}
]}"#;

fn rgraph(clock: &ManualClock) -> RGraph {
    let config = VizConfig::for_kind(Kind::RGraph, None).unwrap();
    let mut rg = RGraph::with_clock(config, Box::new(clock.clone()));
    rg.load_json(TREE).unwrap();
    rg.compute().unwrap();
    rg
}

fn fast(kind: OpType) -> OpOptions {
    OpOptions::new(kind).duration(Duration::from_millis(300))
}

#[test]
fn removals_without_animation_finish_synchronously() {
    let clock = ManualClock::new();
    let mut rg = rgraph(&clock);
    let completed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&completed);

    let opt = OpOptions::new(OpType::Nothing).on_complete(move |_| flag.set(true));
    assert_eq!(rg.remove_nodes(&["c", "missing"], opt).unwrap(), Dispatch::Done);
    assert!(completed.get());
    assert!(!rg.graph().has_node("c"));
    assert!(rg.graph().get_node("r").unwrap().get_adjacency("c").is_none());

    let frames = rg.core().frames();
    assert_eq!(
        rg.remove_edges(&[("b", "b1")], OpOptions::new(OpType::Replot))
            .unwrap(),
        Dispatch::Done
    );
    assert!(rg.graph().get_adjacence("b", "b1").is_none());
    assert!(rg.graph().has_node("b1"));
    assert_eq!(rg.core().frames(), frames + 1);
}

#[test]
fn faded_removals_drop_nodes_once_the_animation_ends() {
    for kind in [OpType::FadeSeq, OpType::FadeCon] {
        let clock = ManualClock::new();
        let mut rg = rgraph(&clock);

        assert_eq!(rg.remove_nodes(&["a1"], fast(kind)).unwrap(), Dispatch::Scheduled);
        assert!(rg.is_busy());
        assert!(rg.graph().has_node("a1"));
        // Anything else is refused while the fade runs.
        assert_eq!(
            rg.remove_nodes(&["c"], OpOptions::new(OpType::Nothing)).unwrap(),
            Dispatch::Busy
        );

        rg.run_until_idle().unwrap();
        assert!(!rg.is_busy(), "{kind}");
        assert!(!rg.graph().has_node("a1"), "{kind}");
        assert!(rg.graph().has_node("c"), "{kind}");
    }
}

#[test]
fn a_failed_reflow_leaves_the_graph_as_it_was() {
    let clock = ManualClock::new();
    let config = VizConfig::for_kind(Kind::Spacetree, None).unwrap();
    let mut st = Spacetree::with_clock(config, Box::new(clock.clone()));
    st.load_json(TREE).unwrap();
    st.compute().unwrap();
    st.core_mut().config_mut().node.align = "middle".to_string();

    let before = |st: &Spacetree, id: &str| {
        let n = st.graph().get_node(id).unwrap();
        (n.end_alpha, n.ignore)
    };
    let a1 = before(&st, "a1");
    assert!(st.remove_nodes(&["a1"], fast(OpType::FadeCon)).is_err());
    assert_eq!(before(&st, "a1"), a1);
    assert!(!st.is_busy());
    assert!(st.core().scheduler().is_idle());

    let edge = |st: &Spacetree| {
        let adj = st.graph().get_node("b").unwrap().get_adjacency("b1").unwrap();
        (adj.end_alpha, adj.ignore)
    };
    let b_b1 = edge(&st);
    assert!(st.remove_edges(&[("b", "b1")], fast(OpType::FadeCon)).is_err());
    assert_eq!(edge(&st), b_b1);
    assert!(!st.is_busy());
}

#[test]
fn iterated_removal_takes_one_element_per_step() {
    let clock = ManualClock::new();
    let mut rg = rgraph(&clock);
    let opt = OpOptions::new(OpType::Iter).duration(Duration::from_millis(400));
    assert_eq!(rg.remove_nodes(&["a1", "a2"], opt).unwrap(), Dispatch::Scheduled);

    clock.advance(Duration::from_millis(200));
    rg.tick().unwrap();
    assert!(!rg.graph().has_node("a1"));
    assert!(rg.graph().has_node("a2"));

    rg.run_until_idle().unwrap();
    assert!(!rg.graph().has_node("a2"));
    assert!(!rg.is_busy());
}

#[test]
fn faded_edge_removal_keeps_the_nodes() {
    let clock = ManualClock::new();
    let mut rg = rgraph(&clock);
    assert_eq!(
        rg.remove_edges(&[("r", "c")], fast(OpType::FadeCon)).unwrap(),
        Dispatch::Scheduled
    );
    rg.run_until_idle().unwrap();
    assert!(rg.graph().get_adjacence("r", "c").is_none());
    assert!(rg.graph().has_node("c"));
}

#[test]
fn sum_fades_new_nodes_in() {
    let clock = ManualClock::new();
    let mut rg = rgraph(&clock);
    let more = Input::parse(r#"{"id":"c","children":[{"id":"c1"},{"id":"c2"}]}"#).unwrap();

    assert_eq!(rg.sum(&more, fast(OpType::FadeSeq)).unwrap(), Dispatch::Scheduled);
    let c1 = rg.graph().get_node("c1").unwrap();
    assert_eq!((c1.alpha, c1.end_alpha), (0.0, 1.0));

    rg.run_until_idle().unwrap();
    let c1 = rg.graph().get_node("c1").unwrap();
    assert_eq!(c1.alpha, 1.0);
    assert!(c1.pos.getp().rho > 0.0);
}

#[test]
fn disconnected_sums_stay_out_of_the_layout() {
    let clock = ManualClock::new();
    let mut rg = rgraph(&clock);
    let island = Input::parse(r#"[{"id":"x","adjacencies":["y"]},{"id":"y"}]"#).unwrap();

    assert_eq!(rg.sum(&island, OpOptions::new(OpType::Nothing)).unwrap(), Dispatch::Done);
    rg.compute().unwrap();
    assert!(rg.graph().has_node("x"));
    assert!(!rg.core().traversal().is_reached("x"));
    assert!(rg.core().traversal().is_reached("b1"));
}

#[test]
fn morph_adds_and_removes_to_match_the_target() {
    let clock = ManualClock::new();
    let mut rg = rgraph(&clock);
    let target = Input::parse(
        r#"{"id":"r","children":[{"id":"a","children":[{"id":"a1"}]},{"id":"d"}]}"#,
    )
    .unwrap();

    assert_eq!(rg.morph(&target, fast(OpType::FadeCon)).unwrap(), Dispatch::Scheduled);
    assert!(rg.graph().get_node("b").unwrap().ignore);
    rg.run_until_idle().unwrap();

    let mut ids = rg.graph().node_ids();
    ids.sort();
    assert_eq!(ids, ["a", "a1", "d", "r"]);
    assert_eq!(rg.root(), Some("r"));
    assert_eq!(rg.graph().get_node("d").unwrap().alpha, 1.0);
}

#[test]
fn morph_moves_the_root_when_it_disappears() {
    let clock = ManualClock::new();
    let mut rg = rgraph(&clock);
    let target = Input::parse(r#"{"id":"z","children":[{"id":"a"},{"id":"y"}]}"#).unwrap();

    assert_eq!(
        rg.morph(&target, OpOptions::new(OpType::Replot)).unwrap(),
        Dispatch::Done
    );
    assert_eq!(rg.root(), Some("z"));
    let mut ids = rg.graph().node_ids();
    ids.sort();
    assert_eq!(ids, ["a", "y", "z"]);
    assert!(rg.graph().get_adjacence("a", "z").is_some());
    assert!(rg.scene().unwrap().node("z").is_some());
}
