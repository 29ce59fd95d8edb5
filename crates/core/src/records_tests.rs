// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::TickBuilder;

#[test]
fn tick_round_trips_through_json() {
    let tick = TickBuilder::new("r1", 7).cells(3).organisms(2).build();

    let json = serde_json::to_string(&tick).unwrap();
    let back: TickData = serde_json::from_str(&json).unwrap();

    assert_eq!(back, tick);
}

#[test]
fn unknown_fields_are_passthrough() {
    // Records from newer producers may carry fields we do not model yet
    let json = r#"{
        "simulation_run_id": "r1",
        "tick_number": 3,
        "capture_time_ms": 12,
        "cells": [],
        "organisms": [],
        "future_field": {"nested": true}
    }"#;

    let tick: TickData = serde_json::from_str(json).unwrap();
    assert_eq!(tick.tick_number, 3);
}

#[test]
fn organism_optional_fields_default() {
    let json = r#"{
        "organism_id": 1,
        "program_id": "p",
        "birth_tick": 0,
        "initial_position": [0, 0],
        "ip": [0, 0],
        "dv": [1, 0],
        "dps": [],
        "energy": 100,
        "registers": [],
        "data_stack": [],
        "call_stack": []
    }"#;

    let org: OrganismState = serde_json::from_str(json).unwrap();
    assert!(org.instruction_trace.is_empty());
    assert!(!org.failed);
    assert!(org.failure_reason.is_none());
}
