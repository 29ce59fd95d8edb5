// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tick simulation records.
//!
//! A tick is the record unit for ingestion: one [`TickData`] per
//! simulation step, uniquely keyed by `(simulation_run_id, tick_number)`.
//! Duplicate keys may arrive through topic redelivery; consumers resolve
//! them by upsert.

use crate::run::RunId;
use serde::{Deserialize, Serialize};

/// State of one environment cell at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState {
    /// Row-major index into the environment grid.
    pub flat_index: i64,
    /// Organism occupying the cell, or 0 for unowned.
    pub owner_id: i64,
    pub molecule_type: i32,
    pub molecule_value: i32,
}

/// One call frame on an organism's call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    /// Instruction pointer to restore on return.
    pub return_ip: Vec<i64>,
    /// Register bank saved at call time.
    pub saved_registers: Vec<i64>,
}

/// Full runtime state of one organism at one tick.
///
/// Carries both the static identity (program, birth tick, initial
/// position) and the per-tick machine state. The static fields repeat
/// in every tick's record; the organism indexer splits them out into
/// the `organisms` table on first sight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganismState {
    pub organism_id: i64,
    pub program_id: String,
    pub birth_tick: i64,
    pub initial_position: Vec<i64>,
    /// Instruction pointer (one coordinate per environment dimension).
    pub ip: Vec<i64>,
    /// Direction vector.
    pub dv: Vec<i64>,
    /// Data pointers.
    pub dps: Vec<Vec<i64>>,
    pub energy: i64,
    pub registers: Vec<i64>,
    pub data_stack: Vec<i64>,
    pub call_stack: Vec<CallFrame>,
    /// Disassembled instructions executed this tick, oldest first.
    #[serde(default)]
    pub instruction_trace: Vec<String>,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// Everything captured for one simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickData {
    pub simulation_run_id: RunId,
    pub tick_number: i64,
    pub capture_time_ms: u64,
    pub cells: Vec<CellState>,
    pub organisms: Vec<OrganismState>,
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
