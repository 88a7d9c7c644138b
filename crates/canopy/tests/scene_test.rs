use canopy::{EdgeShape, Error, Kind, NodeShape, RGraph, Spacetree, Viz};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

const GRAPH: &str = r##"[
    {"id":"r","adjacencies":[{"nodeTo":"a","data":{"$color":"#f00","$type":"arrow"}},"b"]},
    {"id":"a","data":{"$type":"star","$dim":9}},
    {"id":"b"}
]"##;

#[test]
fn overrides_apply_only_when_the_style_is_overridable() {
    let overrides = json!({
        "Node": { "overridable": true },
        "Edge": { "overridable": true }
    });
    let mut rg = RGraph::from_overrides(Some(&overrides)).unwrap();
    rg.load_json(GRAPH).unwrap();
    rg.compute().unwrap();
    rg.plot().unwrap();

    let scene = rg.scene().unwrap();
    let a = scene.node("a").unwrap();
    assert_eq!(a.shape, NodeShape::Star);
    assert_eq!(a.dim, 9.0);
    assert_eq!(scene.node("b").unwrap().shape, NodeShape::Circle);
    let ra = scene.edge("a", "r").unwrap();
    assert_eq!(ra.shape, EdgeShape::Arrow);
    assert_eq!(ra.color, "#f00");
    assert_eq!(scene.edge("r", "b").unwrap().shape, EdgeShape::Line);

    let mut plain = RGraph::from_overrides(None).unwrap();
    plain.load_json(GRAPH).unwrap();
    plain.compute().unwrap();
    plain.plot().unwrap();
    let scene = plain.scene().unwrap();
    assert_eq!(scene.node("a").unwrap().shape, NodeShape::Circle);
    assert_eq!(scene.edge("r", "a").unwrap().color, "#ccb");
}

#[test]
fn unknown_shapes_fail_the_plot() {
    let overrides = json!({ "Node": { "type": "ellipse" } });
    let mut rg = RGraph::from_overrides(Some(&overrides)).unwrap();
    rg.load_json(GRAPH).unwrap();
    rg.compute().unwrap();
    let err = rg.plot().unwrap_err();
    assert!(matches!(err, Error::Unsupported { what: "node type", .. }));

    let overrides = json!({ "Edge": { "type": "hyperline" } });
    let mut st = Spacetree::from_overrides(Some(&overrides)).unwrap();
    st.load_json(r#"{"id":"r","children":[{"id":"a"}]}"#).unwrap();
    st.compute().unwrap();
    // Only the root is drawn, so no edge needs a shape yet.
    st.plot().unwrap();
    assert!(st.scene().unwrap().edges.is_empty());
    assert_eq!(st.core().kind(), Kind::Spacetree);
}

#[test]
fn every_plot_reaches_the_sink() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut rg = RGraph::from_overrides(None).unwrap();
    rg.on_plot(move |scene| sink.borrow_mut().push(scene.frame));
    rg.load_json(GRAPH).unwrap();
    rg.refresh().unwrap();
    rg.refresh().unwrap();
    assert_eq!(*seen.borrow(), [0, 1]);

    let scene = rg.scene().unwrap();
    let text = serde_json::to_value(scene).unwrap();
    assert_eq!(text["kind"], "rgraph");
    assert_eq!(text["nodes"][0]["type"], "circle");
    assert!(text["edges"][0]["lineWidth"].is_number());
}
