// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and fixtures shared by tests across the workspace.

use crate::metadata::{EnvironmentSpec, SimulationMetadata};
use crate::records::{CellState, OrganismState, TickData};
use crate::run::RunId;

/// Builder for [`TickData`] fixtures.
pub struct TickBuilder {
    run_id: RunId,
    tick_number: i64,
    capture_time_ms: u64,
    cells: usize,
    organisms: usize,
}

impl TickBuilder {
    pub fn new(run_id: impl Into<RunId>, tick_number: i64) -> Self {
        Self {
            run_id: run_id.into(),
            tick_number,
            capture_time_ms: 1_000 + tick_number as u64,
            cells: 0,
            organisms: 0,
        }
    }

    pub fn capture_time_ms(mut self, ms: u64) -> Self {
        self.capture_time_ms = ms;
        self
    }

    pub fn cells(mut self, count: usize) -> Self {
        self.cells = count;
        self
    }

    pub fn organisms(mut self, count: usize) -> Self {
        self.organisms = count;
        self
    }

    pub fn build(self) -> TickData {
        let cells = (0..self.cells)
            .map(|i| CellState {
                flat_index: i as i64,
                owner_id: (i % 3) as i64,
                molecule_type: (i % 5) as i32,
                molecule_value: i as i32 * 10,
            })
            .collect();
        let organisms = (0..self.organisms)
            .map(|i| sample_organism(i as i64 + 1, self.tick_number))
            .collect();
        TickData {
            simulation_run_id: self.run_id,
            tick_number: self.tick_number,
            capture_time_ms: self.capture_time_ms,
            cells,
            organisms,
        }
    }
}

/// An organism with plausible runtime state for fixtures.
pub fn sample_organism(organism_id: i64, tick: i64) -> OrganismState {
    OrganismState {
        organism_id,
        program_id: format!("program-{organism_id}"),
        birth_tick: 0,
        initial_position: vec![organism_id, 0],
        ip: vec![organism_id, tick % 7],
        dv: vec![0, 1],
        dps: vec![vec![organism_id, 2]],
        energy: 1_000 - tick,
        registers: vec![tick, organism_id, 0, -1],
        data_stack: vec![42],
        call_stack: Vec::new(),
        instruction_trace: vec![format!("NOP @{tick}")],
        failed: false,
        failure_reason: None,
    }
}

/// A batch of consecutive ticks, each with `cells` cells.
pub fn tick_range(run_id: &str, first: i64, last: i64, cells: usize) -> Vec<TickData> {
    (first..=last)
        .map(|t| TickBuilder::new(run_id, t).cells(cells).build())
        .collect()
}

/// Metadata for a flat 2-D world, enough for the environment indexer.
pub fn sample_metadata(run_id: &str, shape: Vec<i64>) -> SimulationMetadata {
    SimulationMetadata {
        simulation_run_id: run_id.into(),
        start_time_ms: 1_000,
        initial_seed: 7,
        sampling_interval: 1,
        environment: EnvironmentSpec::new(shape.clone(), vec![true; shape.len()]),
    }
}
