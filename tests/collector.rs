// tests/collector.rs

mod common;
use crate::common::init_tracing;

use procqueue::errors::QueueError;
use procqueue::queue::{ProcessCollector, ProcessState};

fn keys<H>(map: &indexmap::IndexMap<String, H>) -> Vec<&str> {
    map.keys().map(|k| k.as_str()).collect()
}

#[test]
fn added_processes_are_open_in_insertion_order() {
    init_tracing();

    let mut collector = ProcessCollector::new();
    collector.add_processes([("b", 1), ("a", 2)]).unwrap();
    collector.add_processes([("c", 3)]).unwrap();

    assert_eq!(keys(collector.open()), vec!["b", "a", "c"]);
    assert!(collector.running().is_empty());
    assert!(collector.terminated().is_empty());
    assert_eq!(collector.len(), 3);
}

#[test]
fn mark_running_moves_open_to_running() {
    let mut collector = ProcessCollector::new();
    collector.add_processes([("0", "p1")]).unwrap();

    assert!(collector.mark_running("0"));

    assert!(collector.open().is_empty());
    assert_eq!(collector.running().get("0"), Some(&"p1"));
    assert_eq!(collector.state_of("0"), Some(ProcessState::Running));
}

#[test]
fn mark_running_unknown_key_is_noop() {
    let mut collector = ProcessCollector::new();
    collector.add_processes([("0", "p1")]).unwrap();

    assert!(!collector.mark_running("foo"));

    assert_eq!(keys(collector.open()), vec!["0"]);
    assert!(collector.running().is_empty());
    assert_eq!(collector.state_of("foo"), None);
}

#[test]
fn mark_running_twice_is_noop_the_second_time() {
    let mut collector = ProcessCollector::new();
    collector.add_processes([("0", "p1")]).unwrap();

    assert!(collector.mark_running("0"));
    assert!(!collector.mark_running("0"));
    assert_eq!(keys(collector.running()), vec!["0"]);
}

#[test]
fn terminate_after_running() {
    let mut collector = ProcessCollector::new();
    collector.add_processes([("0", "p1")]).unwrap();
    collector.mark_running("0");

    assert!(collector.mark_terminated("0"));

    assert!(collector.open().is_empty());
    assert!(collector.running().is_empty());
    assert_eq!(collector.terminated().get("0"), Some(&"p1"));
    assert!(collector.is_drained());
}

#[test]
fn terminate_without_running_goes_through_running() {
    let mut collector = ProcessCollector::new();
    collector.add_processes([("0", "p1")]).unwrap();

    assert!(collector.mark_terminated("0"));

    assert!(collector.open().is_empty());
    assert!(collector.running().is_empty());
    assert_eq!(keys(collector.terminated()), vec!["0"]);
}

#[test]
fn terminate_unknown_key_is_noop() {
    let mut collector = ProcessCollector::new();
    collector.add_processes([("0", "p1")]).unwrap();

    assert!(!collector.mark_terminated("foo"));

    assert_eq!(keys(collector.open()), vec!["0"]);
    assert!(collector.running().is_empty());
    assert!(collector.terminated().is_empty());
}

#[test]
fn terminate_twice_is_noop_the_second_time() {
    let mut collector = ProcessCollector::new();
    collector.add_processes([("0", "p1")]).unwrap();

    assert!(collector.mark_terminated("0"));
    assert!(!collector.mark_terminated("0"));
    assert_eq!(keys(collector.terminated()), vec!["0"]);
}

#[test]
fn mixed_transitions_keep_partition_and_order() {
    let mut collector = ProcessCollector::new();
    collector
        .add_processes([("1", 1), ("2", 2), ("3", 3), ("4", 4), ("5", 5), ("6", 6)])
        .unwrap();

    collector.mark_running("1");
    collector.mark_terminated("1");
    collector.mark_terminated("2");
    collector.mark_running("3");
    collector.mark_running("4");

    assert_eq!(keys(collector.open()), vec!["5", "6"]);
    assert_eq!(keys(collector.running()), vec!["3", "4"]);
    assert_eq!(keys(collector.terminated()), vec!["1", "2"]);
}

#[test]
fn duplicate_key_rejects_whole_batch() {
    let mut collector = ProcessCollector::new();
    collector.add_processes([("a", 1)]).unwrap();
    collector.mark_terminated("a");

    let err = collector
        .add_processes([("b", 2), ("a", 3)])
        .expect_err("re-registering a terminated key must fail");

    match err {
        QueueError::DuplicateKey(key) => assert_eq!(key, "a"),
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
    // Nothing from the rejected batch was inserted.
    assert!(collector.open().is_empty());
    assert_eq!(collector.terminated().get("a"), Some(&1));
}

#[test]
fn duplicate_key_within_one_batch_is_rejected() {
    let mut collector: ProcessCollector<i32> = ProcessCollector::new();

    let result = collector.add_processes([("x", 1), ("x", 2)]);

    assert!(matches!(result, Err(QueueError::DuplicateKey(ref k)) if k == "x"));
    assert!(collector.is_empty());
}

#[test]
fn empty_key_is_invalid_input() {
    let mut collector: ProcessCollector<i32> = ProcessCollector::new();

    let result = collector.add_processes([("", 1)]);

    assert!(matches!(result, Err(QueueError::InvalidInput(_))));
    assert!(collector.is_empty());
}
