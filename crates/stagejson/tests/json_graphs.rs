// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Shared nodes, cycles and the depth guard.
//
// Identity comes from `Rc<RefCell<T>>`: the serializer tracks it per
// reference mode, the deserializer resolves `ref_<n>` back to the node.

use stagejson::json::{self, DepthPolicy, JsonOptions, ReferenceMode};
use stagejson::Error;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default, stagejson::Value)]
struct Node {
    name: String,
    next: Option<Rc<RefCell<Node>>>,
}

#[derive(Debug, Default, stagejson::Value)]
struct Pair {
    left: Option<Rc<RefCell<Node>>>,
    right: Option<Rc<RefCell<Node>>>,
}

fn node(name: &str) -> Rc<RefCell<Node>> {
    Rc::new(RefCell::new(Node {
        name: name.into(),
        next: None,
    }))
}

/// `a -> b -> a`
fn two_cycle() -> Rc<RefCell<Node>> {
    let a = node("a");
    let b = node("b");
    b.borrow_mut().next = Some(a.clone());
    a.borrow_mut().next = Some(b);
    a
}

fn break_cycle(head: &Rc<RefCell<Node>>) {
    let next = head.borrow_mut().next.take();
    if let Some(next) = next {
        next.borrow_mut().next = None;
    }
}

// ============================================================================
// Reference modes
// ============================================================================

#[test]
fn test_marker_mode_writes_ref_for_repeat() {
    let head = two_cycle();
    let opts = JsonOptions::default().with_reference_mode(ReferenceMode::Marker);
    let text = json::serialize_with(&head, &opts).unwrap();
    assert_eq!(text, r#"{"name":"a","next":{"name":"b","next":ref_0}}"#);
    break_cycle(&head);
}

#[test]
fn test_null_on_repeat_mode() {
    let head = two_cycle();
    let opts = JsonOptions::default().with_reference_mode(ReferenceMode::NullOnRepeat);
    let text = json::serialize_with(&head, &opts).unwrap();
    assert_eq!(text, r#"{"name":"a","next":{"name":"b","next":null}}"#);
    break_cycle(&head);
}

#[test]
fn test_shared_node_without_cycle() {
    let shared = node("s");
    let pair = Pair {
        left: Some(shared.clone()),
        right: Some(shared),
    };

    let plain = json::serialize(&pair).unwrap();
    assert_eq!(plain, r#"{"left":{"name":"s","next":null},"right":{"name":"s","next":null}}"#);

    let opts = JsonOptions::default().with_reference_mode(ReferenceMode::Marker);
    let marked = json::serialize_with(&pair, &opts).unwrap();
    assert_eq!(marked, r#"{"left":{"name":"s","next":null},"right":ref_0}"#);

    let back: Pair = json::deserialize_with(&marked, &opts).unwrap();
    let left = back.left.unwrap();
    let right = back.right.unwrap();
    assert!(Rc::ptr_eq(&left, &right));
    assert_eq!(left.borrow().name, "s");
}

#[test]
fn test_marker_cycle_decodes_to_cycle() {
    let opts = JsonOptions::default().with_reference_mode(ReferenceMode::Marker);
    let text = r#"{"name":"a","next":{"name":"b","next":ref_0}}"#;
    let head: Rc<RefCell<Node>> = json::deserialize_with(text, &opts).unwrap();

    let b = head.borrow().next.clone().unwrap();
    assert_eq!(b.borrow().name, "b");
    let back_to_a = b.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&back_to_a, &head));

    // Same text out again.
    assert_eq!(json::serialize_with(&head, &opts).unwrap(), text);
    drop(back_to_a);
    break_cycle(&head);
}

#[test]
fn test_unknown_reference_is_a_parse_error() {
    let opts = JsonOptions::default().with_reference_mode(ReferenceMode::Marker);
    let err = json::deserialize_with::<Rc<RefCell<Node>>>(r#"{"name":"a","next":ref_3}"#, &opts)
        .unwrap_err();
    let parse = err.parse_error().expect("parse error");
    assert_eq!(parse.kind, stagejson::ParseErrorKind::UnknownReference(3));
    assert_eq!(parse.line, 1);
    assert_eq!(parse.column, 20);
}

#[test]
fn test_reference_into_wrong_destination_is_mismatch() {
    let opts = JsonOptions::default().with_reference_mode(ReferenceMode::Marker);
    let text = r#"[{"name":"a","next":null},ref_0]"#;
    let result = json::deserialize_with::<Vec<std::collections::BTreeMap<String, Option<String>>>>(text, &opts);
    // Plain maps expose no shared content, so nothing was registered.
    assert!(result.unwrap_err().parse_error().is_some());

    let nodes: Vec<Rc<RefCell<Node>>> = json::deserialize_with(text, &opts).unwrap();
    assert!(Rc::ptr_eq(&nodes[0], &nodes[1]));

    #[derive(Debug, Default, stagejson::Value)]
    struct Holder {
        first: Option<Rc<RefCell<Node>>>,
        second: Vec<u8>,
    }
    let wrong = json::deserialize_with::<Holder>(
        r#"{"first":{"name":"a","next":null},"second":ref_0}"#,
        &opts,
    );
    assert!(matches!(wrong, Err(Error::TypeMismatch { .. })));
}

// ============================================================================
// Depth guard
// ============================================================================

/// Four levels of arrays around a single `1`.
fn nested() -> Vec<Vec<Vec<Vec<u8>>>> {
    vec![vec![vec![vec![1]]]]
}

#[test]
fn test_depth_exactly_at_limit_succeeds() {
    let value = nested();
    let opts = JsonOptions::default().with_max_depth(4);
    assert_eq!(json::serialize_with(&value, &opts).unwrap(), "[[[[1]]]]");
    let back: Vec<Vec<Vec<Vec<u8>>>> = json::deserialize_with("[[[[1]]]]", &opts).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_depth_past_limit_raises() {
    let value = nested();
    let opts = JsonOptions::default().with_max_depth(3);
    assert!(matches!(
        json::serialize_with(&value, &opts),
        Err(Error::DepthExceeded { max_depth: 3 })
    ));
    assert!(matches!(
        json::deserialize_with::<Vec<Vec<Vec<Vec<u8>>>>>("[[[[1]]]]", &opts),
        Err(Error::DepthExceeded { max_depth: 3 })
    ));
}

#[test]
fn test_depth_past_limit_truncates() {
    let value = nested();
    let opts = JsonOptions::default()
        .with_max_depth(3)
        .with_depth_policy(DepthPolicy::Truncate);
    assert_eq!(json::serialize_with(&value, &opts).unwrap(), "[[[null]]]");

    // Decoding never truncates.
    assert!(matches!(
        json::deserialize_with::<Vec<Vec<Vec<Vec<u8>>>>>("[[[[1]]]]", &opts),
        Err(Error::DepthExceeded { max_depth: 3 })
    ));
}

#[test]
fn test_cycle_without_reference_mode_hits_depth_guard() {
    let head = two_cycle();

    let raise = JsonOptions::default().with_max_depth(8);
    assert!(matches!(
        json::serialize_with(&head, &raise),
        Err(Error::DepthExceeded { max_depth: 8 })
    ));

    let truncate = raise.clone().with_depth_policy(DepthPolicy::Truncate);
    let text = json::serialize_with(&head, &truncate).unwrap();
    assert_eq!(text.matches("\"name\"").count(), 8);
    assert!(text.ends_with(r#""next":null}}}}}}}}"#));
    break_cycle(&head);
}
