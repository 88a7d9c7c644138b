use canopy_graph::{All, Complex, Graph, GraphOptions, Input, PosProp, SkipIgnored};
use canopy_layout::algo::hyperbolic::{self, moebius_graph};
use canopy_layout::{Algorithm, HyperbolicOptions, LayoutStrategy, RadialOptions};

fn deep_tree() -> Graph {
    Input::parse(
        r#"{"id":"r","children":[
            {"id":"a","children":[{"id":"a1","children":[{"id":"a1x"},{"id":"a1y"}]},{"id":"a2"}]},
            {"id":"b","children":[{"id":"b1"}]},
            {"id":"c"}
        ]}"#,
    )
    .unwrap()
    .to_graph(GraphOptions::radial())
    .unwrap()
}

#[test]
fn every_node_lands_inside_the_unit_disk() {
    let mut g = deep_tree();
    let levels = HyperbolicOptions::default()
        .compute_positions(&mut g, "r", &[PosProp::Pos, PosProp::StartPos])
        .unwrap();
    assert_eq!(levels.max_depth(), 3);

    let edge = hyperbolic::edge_length(3);
    for node in g.nodes() {
        let rho = node.pos.getp().rho;
        assert!(rho < 1.0, "{} at {rho}", node.id);
        let expected = if node.id == "r" {
            0.0
        } else {
            hyperbolic::ring_radius(edge, levels.depth(&node.id) - 1)
        };
        assert!((rho - expected).abs() < 1e-9, "{}", node.id);
    }
}

#[test]
fn translation_and_its_inverse_restore_the_layout() {
    let mut g = deep_tree();
    HyperbolicOptions::default()
        .compute_positions(&mut g, "r", &PosProp::ALL)
        .unwrap();
    let before: Vec<Complex> = g.nodes().map(|n| n.pos.getc()).collect();

    let c = g.get_node("a1").unwrap().pos.getc();
    moebius_graph(&mut g, -c, &[PosProp::Pos], None, &All);
    assert!(g.get_node("a1").unwrap().pos.getc().norm() < 1e-9);

    moebius_graph(&mut g, c, &[PosProp::Pos], None, &All);
    for (node, old) in g.nodes().zip(before) {
        assert!((node.pos.getc() - old).norm() < 1e-9, "{}", node.id);
    }
}

#[test]
fn moebius_graph_can_read_from_another_property() {
    let mut g = deep_tree();
    HyperbolicOptions::default()
        .compute_positions(&mut g, "r", &[PosProp::StartPos])
        .unwrap();
    g.get_node_mut("c").unwrap().ignore = true;

    let v = Complex::new(0.2, 0.1);
    moebius_graph(&mut g, v, &[PosProp::EndPos], Some(PosProp::StartPos), &SkipIgnored);

    let root = g.get_node("r").unwrap();
    assert!((root.end_pos.getc() - v).norm() < 1e-9);
    assert_eq!(g.get_node("c").unwrap().end_pos.getc(), Complex::ZERO);
}

#[test]
fn algorithm_dispatch_matches_direct_calls() {
    let mut direct = deep_tree();
    let mut via = deep_tree();
    RadialOptions::default()
        .compute_positions(&mut direct, "r", &[PosProp::Pos])
        .unwrap();
    Algorithm::Radial(RadialOptions::default())
        .compute_positions(&mut via, "r", &[PosProp::Pos])
        .unwrap();
    for (a, b) in direct.nodes().zip(via.nodes()) {
        assert_eq!(a.pos, b.pos);
    }
}
