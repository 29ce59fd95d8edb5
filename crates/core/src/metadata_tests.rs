// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    origin = { 0, &[0, 0] },
    last_in_row = { 4, &[0, 4] },
    second_row = { 5, &[1, 0] },
    interior = { 13, &[2, 3] },
    last_cell = { 14, &[2, 4] },
)]
fn coords_from_flat_row_major_3x5(flat: i64, expected: &[i64]) {
    let env = EnvironmentSpec::new(vec![3, 5], vec![false, false]);
    assert_eq!(env.coords_from_flat(flat).unwrap(), expected);
}

#[test]
fn coords_from_flat_three_dimensions() {
    let env = EnvironmentSpec::new(vec![2, 3, 4], vec![true, true, true]);
    // flat = x*12 + y*4 + z
    assert_eq!(env.coords_from_flat(1 * 12 + 2 * 4 + 3).unwrap(), vec![1, 2, 3]);
}

#[test]
fn coords_from_flat_rejects_out_of_range() {
    let env = EnvironmentSpec::new(vec![3, 5], vec![false, false]);
    assert!(env.coords_from_flat(15).is_err());
    assert!(env.coords_from_flat(-1).is_err());
}

#[test]
fn validate_catches_mismatched_lengths() {
    let env = EnvironmentSpec {
        dimensions: 2,
        shape: vec![3, 5],
        toroidal: vec![false],
    };
    assert!(env.validate().is_err());

    let ok = EnvironmentSpec::new(vec![3, 5], vec![false, true]);
    assert!(ok.validate().is_ok());
}

#[test]
fn metadata_round_trips_through_json() {
    let meta = SimulationMetadata {
        simulation_run_id: "r1".into(),
        start_time_ms: 1000,
        initial_seed: -7,
        sampling_interval: 10,
        environment: EnvironmentSpec::new(vec![100, 40], vec![true, false]),
    };

    let json = serde_json::to_string(&meta).unwrap();
    let back: SimulationMetadata = serde_json::from_str(&json).unwrap();
    assert_eq!(back, meta);
}
