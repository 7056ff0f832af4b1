//! Property tests over arbitrary snapshot trees.

use driftsync::snapshot::{snapshot_from_str, snapshot_to_string, Node};
use driftsync::{plan, PlannerConfig};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn collect(children: Vec<Node>) -> BTreeMap<String, Node> {
    children
        .into_iter()
        .map(|c| (c.name().to_owned(), c))
        .collect()
}

fn arb_child() -> impl Strategy<Value = Node> {
    let leaf = (
        "[a-z]{1,8}",
        0i64..2_000_000_000,
        proptest::option::of("[0-9a-f]{32}"),
    )
        .prop_map(|(name, ts, hash)| Node::file(name, "/snap", ts, hash));
    leaf.prop_recursive(3, 24, 4, |inner| {
        ("[a-z]{1,8}", proptest::collection::vec(inner, 0..4))
            .prop_map(|(name, kids)| Node::directory(name, "/snap", collect(kids)))
    })
}

fn arb_tree() -> impl Strategy<Value = Node> {
    proptest::collection::vec(arb_child(), 0..5)
        .prop_map(|kids| Node::directory("root", "/snap", collect(kids)))
}

proptest! {
    #[test]
    fn prop_roundtrip_preserves_tree(tree in arb_tree()) {
        let encoded = snapshot_to_string(&tree).unwrap();
        let back = snapshot_from_str(&encoded, "prop").unwrap();
        prop_assert_eq!(back, tree);
    }

    #[test]
    fn prop_encoding_is_deterministic(tree in arb_tree()) {
        prop_assert_eq!(
            snapshot_to_string(&tree).unwrap(),
            snapshot_to_string(&tree).unwrap()
        );
    }

    #[test]
    fn prop_self_plan_is_empty(tree in arb_tree()) {
        let ops = plan(&tree, &tree, &PlannerConfig::default()).unwrap();
        prop_assert!(ops.is_empty());
    }

    #[test]
    fn prop_children_keys_match_names(tree in arb_tree()) {
        fn check(node: &Node) -> bool {
            match node.children() {
                None => true,
                Some(children) => children
                    .iter()
                    .all(|(key, child)| key == child.name() && check(child)),
            }
        }
        prop_assert!(check(&tree));
    }
}
