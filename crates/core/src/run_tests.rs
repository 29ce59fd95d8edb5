// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use yare::parameterized;

#[parameterized(
    simple = { "20250101-12000000-abc", "sim_20250101_12000000_abc" },
    uppercase = { "RUN-One", "sim_run_one" },
    punctuation = { "a.b/c:d", "sim_a_b_c_d" },
    already_clean = { "run1", "sim_run1" },
)]
fn schema_name_sanitizes(id: &str, expected: &str) {
    assert_eq!(RunId::new(id).schema_name(), expected);
}

#[test]
fn schema_names_collide_iff_sanitized_ids_collide() {
    // Distinct ids that sanitize identically share a schema
    assert_eq!(
        RunId::new("a-b").schema_name(),
        RunId::new("a.b").schema_name()
    );
    assert_ne!(
        RunId::new("a-b").schema_name(),
        RunId::new("a-c").schema_name()
    );
}

#[test]
fn generate_embeds_timestamp() {
    let clock = FakeClock::new();
    // 2021-01-01T00:00:00.250Z
    clock.set_epoch_ms(1_609_459_200_250);

    let id = RunId::generate(&clock);
    assert!(
        id.as_str().starts_with("20210101-00000025-"),
        "unexpected id: {id}"
    );
}

#[test]
fn generate_is_unique_per_call() {
    let clock = FakeClock::new();
    assert_ne!(RunId::generate(&clock), RunId::generate(&clock));
}

#[test]
fn serde_is_transparent() {
    let id = RunId::new("r1");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"r1\"");
    let back: RunId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
