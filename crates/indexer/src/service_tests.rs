// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn core() -> ServiceCore {
    ServiceCore::new("test-indexer", Vec::new())
}

#[test]
fn starts_stopped_and_healthy() {
    let core = core();
    assert_eq!(core.state(), ServiceState::Stopped);
    assert!(core.is_healthy());
}

#[test]
fn transitions_follow_the_state_machine() {
    let core = core();
    assert!(core.transition_to(ServiceState::Starting));
    assert!(core.transition_to(ServiceState::Running));
    assert!(core.transition_to(ServiceState::Stopping));
    assert!(core.transition_to(ServiceState::Stopped));

    // illegal jump is refused and leaves state untouched
    assert!(!core.transition_to(ServiceState::Running));
    assert_eq!(core.state(), ServiceState::Stopped);
}

#[test]
fn transient_errors_fill_the_ring_and_keep_health() {
    let core = core();
    core.transition_to(ServiceState::Starting);
    core.transition_to(ServiceState::Running);

    core.record_error(viv_core::kind::BATCH_PROCESSING_FAILED, "boom", 5);

    let status = core.status();
    assert!(status.healthy);
    assert_eq!(status.errors.len(), 1);
    assert_eq!(status.errors[0].error_type, "BATCH_PROCESSING_FAILED");
    assert_eq!(status.errors[0].timestamp_ms, 5);
}

#[test]
fn fatal_errors_skip_the_ring_and_poison_health() {
    let core = core();
    core.transition_to(ServiceState::Starting);
    core.transition_to(ServiceState::Running);

    core.record_fatal(viv_core::kind::METADATA_TIMEOUT, "gone", "metadata_failed");

    let status = core.status();
    assert_eq!(status.state, ServiceState::Error);
    assert!(!status.healthy);
    assert!(status.errors.is_empty());
    assert_eq!(status.metrics.get("metadata_failed"), Some(&1));
}

#[test]
fn fatal_from_stopped_keeps_state_but_marks_unhealthy() {
    let core = core();
    core.record_fatal(viv_core::kind::RUN_NOT_FOUND, "no run", "runs_failed");
    // ERROR is only reachable from STARTING/RUNNING
    assert_eq!(core.state(), ServiceState::Stopped);
    assert!(!core.is_healthy());
}

#[test]
fn status_snapshot_is_detached() {
    let core = core();
    let status = core.status();
    core.metrics().increment("ticks_processed");
    assert!(status.metrics.get("ticks_processed").is_none());
}
