// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn err(n: u64) -> OperationalError {
    OperationalError {
        error_type: kind::BATCH_PROCESSING_FAILED.to_string(),
        message: format!("failure {n}"),
        timestamp_ms: n,
    }
}

#[test]
fn push_and_snapshot_preserve_order() {
    let ring = ErrorRing::new();
    ring.push(err(1));
    ring.push(err(2));

    let snap = ring.snapshot();
    assert_eq!(snap.len(), 2);
    assert_eq!(snap[0].timestamp_ms, 1);
    assert_eq!(snap[1].timestamp_ms, 2);
}

#[test]
fn ring_evicts_oldest_at_capacity() {
    let ring = ErrorRing::new();
    for n in 0..(ERROR_RING_CAPACITY as u64 + 10) {
        ring.push(err(n));
    }

    let snap = ring.snapshot();
    assert_eq!(snap.len(), ERROR_RING_CAPACITY);
    assert_eq!(snap[0].timestamp_ms, 10);
    assert_eq!(snap.last().unwrap().timestamp_ms, ERROR_RING_CAPACITY as u64 + 9);
}

#[test]
fn snapshot_is_detached() {
    let ring = ErrorRing::new();
    ring.push(err(1));
    let snap = ring.snapshot();
    ring.push(err(2));
    assert_eq!(snap.len(), 1);
    assert_eq!(ring.len(), 2);
}
