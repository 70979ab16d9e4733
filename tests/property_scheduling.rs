// tests/property_scheduling.rs

use std::collections::HashSet;

use proptest::prelude::*;
use procqueue::queue::{startable, ProcessCollector};

#[derive(Debug, Clone)]
enum Op {
    Running(usize),
    Terminated(usize),
}

fn op_strategy(max_key: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..max_key).prop_map(Op::Running),
        (0..max_key).prop_map(Op::Terminated),
    ]
}

proptest! {
    #[test]
    fn every_key_is_in_exactly_one_set(
        registered in 1..20usize,
        // Indices beyond `registered` exercise unknown-key transitions.
        ops in proptest::collection::vec(op_strategy(25), 0..60),
    ) {
        let mut collector = ProcessCollector::new();
        collector
            .add_processes((0..registered).map(|i| (i.to_string(), i)))
            .unwrap();

        for op in ops {
            match op {
                Op::Running(i) => { collector.mark_running(&i.to_string()); }
                Op::Terminated(i) => { collector.mark_terminated(&i.to_string()); }
            }

            prop_assert_eq!(collector.len(), registered);

            let open: HashSet<_> = collector.open().keys().collect();
            let running: HashSet<_> = collector.running().keys().collect();
            let terminated: HashSet<_> = collector.terminated().keys().collect();
            prop_assert!(open.is_disjoint(&running));
            prop_assert!(open.is_disjoint(&terminated));
            prop_assert!(running.is_disjoint(&terminated));
        }

        // Transitions never swap handles between keys.
        for (key, handle) in collector.terminated() {
            prop_assert_eq!(key, &handle.to_string());
        }
    }

    #[test]
    fn unlimited_admits_every_open_process(open in 0..1000usize, running in 0..1000usize) {
        prop_assert_eq!(startable(open, running, 0), open);
    }

    #[test]
    fn limited_admission_matches_formula(
        open in 0..1000usize,
        running in 0..1000usize,
        limit in 1..100usize,
    ) {
        let expected = (limit as i64 - running as i64).min(open as i64).max(0) as usize;
        let got = startable(open, running, limit);

        prop_assert_eq!(got, expected);
        prop_assert!(got + running <= limit.max(running));
        prop_assert!(got <= open);
    }
}

#[test]
fn admission_examples() {
    assert_eq!(startable(8, 0, 6), 6);
    assert_eq!(startable(2, 6, 6), 0);
    assert_eq!(startable(2, 5, 6), 1);
    assert_eq!(startable(3, 9, 6), 0);
    assert_eq!(startable(8, 6, 0), 8);
    assert_eq!(startable(0, 0, 6), 0);
}
