use canopy_graph::json::tree;
use canopy_graph::{Error, GraphOptions, Input};

#[test]
fn tree_input_builds_parent_child_adjacencies() {
    let input =
        Input::parse(r#"{"id":"A","name":"root","children":[{"id":"B"},{"id":"C","data":{"$aw":3}}]}"#)
            .unwrap();
    assert_eq!(input.root_id(7).unwrap(), "A");

    let g = input.to_graph(GraphOptions::tree()).unwrap();
    assert_eq!(g.node_ids(), vec!["A", "B", "C"]);
    assert!(g.get_adjacence("A", "B").is_some());
    assert!(g.get_adjacence("A", "C").is_some());
    assert!(g.get_adjacence("B", "C").is_none());
    assert_eq!(g.get_node("C").unwrap().data_f64("$aw"), Some(3.0));
    assert_eq!(g.get_node("A").unwrap().name, "root");
}

#[test]
fn graph_input_accepts_simple_and_extended_adjacencies() {
    let input = Input::parse(
        r#"[
            {"id":"1","name":"one","adjacencies":["2",{"nodeTo":"3","data":{"$color":"red"}}]},
            {"id":"2","adjacencies":[]},
            {"id":"3"}
        ]"#,
    )
    .unwrap();
    assert_eq!(input.root_id(0).unwrap(), "1");
    assert_eq!(input.root_id(2).unwrap(), "3");

    let g = input.to_graph(GraphOptions::radial()).unwrap();
    let [a, b] = g.get_adjacence("1", "3").unwrap();
    assert_eq!(a.data.get("$color").and_then(|v| v.as_str()), Some("red"));
    assert_eq!(b.data.get("$color").and_then(|v| v.as_str()), Some("red"));
    assert!(g.get_adjacence("2", "1").is_some());
}

#[test]
fn dangling_adjacency_is_a_structured_error() {
    let input = Input::parse(r#"[{"id":"1","adjacencies":["ghost"]}]"#).unwrap();
    match input.to_graph(GraphOptions::radial()) {
        Err(Error::DanglingReference { node, missing }) => {
            assert_eq!(node, "1");
            assert_eq!(missing, "ghost");
        }
        other => panic!("expected dangling reference, got {other:?}"),
    }
}

#[test]
fn root_index_is_checked() {
    let input = Input::parse(r#"[{"id":"1"}]"#).unwrap();
    assert!(matches!(
        input.root_id(3),
        Err(Error::RootIndexOutOfRange { index: 3, len: 1 })
    ));
    let empty = Input::parse("[]").unwrap();
    assert!(matches!(empty.root_id(0), Err(Error::EmptyGraph)));
}

#[test]
fn tree_utilities() {
    let Input::Tree(mut t) = Input::parse(
        r#"{"id":"r","children":[{"id":"a","children":[{"id":"a1","children":[{"id":"deep"}]}]},{"id":"b"}]}"#,
    )
    .unwrap() else {
        panic!("expected a tree");
    };

    assert_eq!(tree::parent_of(&t, "a1").map(|n| n.id.as_str()), Some("a"));
    assert!(tree::parent_of(&t, "r").is_none());
    assert_eq!(tree::subtree(&t, "a1").map(|n| n.children.len()), Some(1));
    assert!(tree::subtree(&t, "zzz").is_none());

    let leaves: Vec<(&str, usize)> = tree::leaves(&t, Some(3))
        .into_iter()
        .map(|(n, l)| (n.id.as_str(), l))
        .collect();
    assert_eq!(leaves, vec![("b", 2)]);

    let mut upto_one = Vec::new();
    tree::each_level(&t, 0, 1, &mut |n, l| upto_one.push((n.id.clone(), l)));
    assert_eq!(
        upto_one,
        vec![("r".to_string(), 0), ("a".to_string(), 1), ("b".to_string(), 1)]
    );

    tree::prune(&mut t, 1);
    assert!(tree::subtree(&t, "a").unwrap().children.is_empty());
    assert!(tree::subtree(&t, "a1").is_none());
}
