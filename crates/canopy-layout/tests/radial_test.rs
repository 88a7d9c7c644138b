use canopy_graph::{All, Graph, GraphOptions, Input, PosProp};
use canopy_layout::{AngularWidths, ChildOrder, NodeDims, RadialOptions};
use std::f64::consts::PI;

const EPS: f64 = 1e-9;

fn load(json: &str) -> Graph {
    Input::parse(json)
        .unwrap()
        .to_graph(GraphOptions::radial())
        .unwrap()
}

#[test]
fn equal_children_split_the_circle_evenly() {
    let mut g = load(
        r#"{"id":"root","children":[
            {"id":"a","data":{"$aw":4}},
            {"id":"b","data":{"$aw":4}},
            {"id":"c","data":{"$aw":4}}
        ]}"#,
    );
    let opts = RadialOptions {
        dims: NodeDims {
            overridable: true,
            ..RadialOptions::default().dims
        },
        ..RadialOptions::default()
    };
    opts.compute_positions(&mut g, "root", &PosProp::ALL).unwrap();

    for id in ["a", "b", "c"] {
        let n = g.get_node(id).unwrap();
        assert!((n.angle_span.width() - 2.0 * PI / 3.0).abs() < EPS, "{id}");
        assert!((n.end_pos.getp().rho - opts.level_distance).abs() < EPS);
        assert_eq!(n.pos, n.start_pos);
    }
    let root = g.get_node("root").unwrap();
    assert_eq!(root.pos.getp().rho, 0.0);
    assert!((root.angle_span.width() - 2.0 * PI).abs() < EPS);

    // Children are centered in consecutive sectors.
    let thetas: Vec<f64> = ["a", "b", "c"]
        .iter()
        .map(|id| g.get_node(id).unwrap().pos.getp().theta)
        .collect();
    assert!((thetas[0] - PI / 3.0).abs() < EPS);
    assert!((thetas[1] - PI).abs() < EPS);
    assert!((thetas[2] - 5.0 * PI / 3.0).abs() < EPS);
}

#[test]
fn wider_subtrees_get_wider_sectors_and_rings_grow_linearly() {
    let mut g = load(
        r#"{"id":"r","children":[
            {"id":"big","children":[{"id":"x"},{"id":"y"},{"id":"z"}]},
            {"id":"small"}
        ]}"#,
    );
    let opts = RadialOptions::default();
    opts.compute_positions(&mut g, "r", &[PosProp::Pos]).unwrap();

    let big = g.get_node("big").unwrap().angle_span.width();
    let small = g.get_node("small").unwrap().angle_span.width();
    assert!(big > small);
    assert!((big + small - 2.0 * PI).abs() < EPS);
    assert!((g.get_node("x").unwrap().pos.getp().rho - 200.0).abs() < EPS);

    // Grandchildren stay within their parent's sector.
    let span = g.get_node("big").unwrap().angle_span;
    for id in ["x", "y", "z"] {
        let s = g.get_node(id).unwrap().angle_span;
        assert!(s.begin >= span.begin - EPS && s.end <= span.end + EPS);
    }
}

#[test]
fn child_order_hint_reorders_one_parent() {
    let mut g = load(r#"{"id":"r","children":[{"id":"a"},{"id":"b"},{"id":"c"}]}"#);
    let mut order = ChildOrder {
        parent: "r".to_string(),
        ..ChildOrder::default()
    };
    order.rank.insert("c".to_string(), 0);
    order.rank.insert("a".to_string(), 1);
    order.rank.insert("b".to_string(), 2);
    let opts = RadialOptions {
        child_order: Some(order),
        ..RadialOptions::default()
    };
    opts.compute_positions(&mut g, "r", &[PosProp::Pos]).unwrap();

    let theta = |id: &str| g.get_node(id).unwrap().pos.getp().theta;
    assert!(theta("c") < theta("a"));
    assert!(theta("a") < theta("b"));
}

#[test]
fn ignored_nodes_are_skipped() {
    let mut g = load(r#"{"id":"r","children":[{"id":"a"},{"id":"b"}]}"#);
    g.get_node_mut("b").unwrap().ignore = true;
    let levels = RadialOptions::default()
        .compute_positions(&mut g, "r", &[PosProp::EndPos])
        .unwrap();
    assert_eq!(levels.depth("b"), -1);
    assert!((g.get_node("a").unwrap().angle_span.width() - 2.0 * PI).abs() < EPS);
}

#[test]
fn missing_root_is_an_error() {
    let mut g = load(r#"{"id":"r"}"#);
    assert!(RadialOptions::default()
        .compute_positions(&mut g, "nope", &[PosProp::Pos])
        .is_err());
}

#[test]
fn tree_angular_width_never_undercuts_own_width() {
    // Depth 1..5 chains and fans with varying $aw.
    for depth in 1..=5usize {
        let mut g = Graph::new(GraphOptions::radial());
        for level in 0..depth {
            for k in 0..3 {
                let parent = format!("n{level}_0");
                let child = format!("n{}_{}", level + 1, k);
                g.add_adjacence(&parent, &child, Default::default());
                let aw = ((level + 1) * (k + 2)) as f64;
                g.get_node_mut(&child)
                    .unwrap()
                    .data
                    .insert("$aw".to_string(), serde_json::json!(aw));
            }
        }
        let dims = NodeDims {
            overridable: true,
            dim: 3.0,
            ..NodeDims::default()
        };
        let mut levels = canopy_graph::util::compute_levels(&g, "n0_0", 0, &All);
        let widths = AngularWidths::compute(&g, &mut levels, "n0_0", &dims);
        for node in g.nodes() {
            assert!(
                widths.tree(&node.id) >= widths.node(&node.id),
                "depth {depth} node {}",
                node.id
            );
        }
        let d1 = g.get_node("n1_1").unwrap();
        assert!((widths.node(&d1.id) - 3.0).abs() < EPS);
    }
}
