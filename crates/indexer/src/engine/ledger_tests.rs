// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn info(path: &str) -> BatchInfo {
    BatchInfo {
        simulation_run_id: "r1".into(),
        storage_path: path.to_string(),
        tick_start: 0,
        tick_end: 99,
        written_at_ms: 0,
    }
}

fn token(id: i64) -> AckToken {
    AckToken::new("batches", "g1", id)
}

#[test]
fn single_flush_completes_multiple_batches() {
    let mut ledger = AckLedger::new();
    ledger.push(info("k1"), token(1), 100);
    ledger.push(info("k2"), token(2), 100);
    ledger.push(info("k3"), token(3), 100);

    // 250-tick flush: k1 and k2 fully flushed, k3 half done
    let done = ledger.complete(250);
    let paths: Vec<_> = done.iter().map(|p| p.info.storage_path.as_str()).collect();
    assert_eq!(paths, vec!["k1", "k2"]);
    assert_eq!(ledger.len(), 1);

    // the rest of k3 plus two later batches complete on the next flush
    ledger.push(info("k4"), token(4), 100);
    ledger.push(info("k5"), token(5), 100);
    let done = ledger.complete(250);
    let paths: Vec<_> = done.iter().map(|p| p.info.storage_path.as_str()).collect();
    assert_eq!(paths, vec!["k3", "k4", "k5"]);
    assert!(ledger.is_empty());
}

#[test]
fn partial_flush_completes_nothing() {
    let mut ledger = AckLedger::new();
    ledger.push(info("k1"), token(1), 10);

    assert!(ledger.complete(9).is_empty());
    assert_eq!(ledger.len(), 1);

    // the final tick completes it
    let done = ledger.complete(1);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].remaining, 0);
}

#[test]
fn zero_flush_is_a_no_op() {
    let mut ledger = AckLedger::new();
    ledger.push(info("k1"), token(1), 1);
    assert!(ledger.complete(0).is_empty());
    assert_eq!(ledger.len(), 1);
}

#[test]
fn drain_all_empties_in_order() {
    let mut ledger = AckLedger::new();
    ledger.push(info("k1"), token(1), 5);
    ledger.push(info("k2"), token(2), 5);

    let drained = ledger.drain_all();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].info.storage_path, "k1");
    assert!(ledger.is_empty());
}
