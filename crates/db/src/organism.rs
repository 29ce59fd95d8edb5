// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Organism capability.
//!
//! Two tables: `organisms` holds static identity (merged on first and
//! every later sight), `organism_states` holds one serialized runtime
//! state per `(organism_id, tick_number)`. State payloads may be
//! zstd-compressed; the `compressed` column records which codec a row
//! used so readers never guess.

use rusqlite::params;
use viv_core::{OrganismState, TickData};

use crate::database::{DbError, RunScope};

const ZSTD_LEVEL: i32 = 3;

/// One row of the `organisms` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganismRow {
    pub organism_id: i64,
    pub program_id: String,
    pub birth_tick: i64,
    pub initial_position: Vec<i64>,
}

/// Upsert capability over the run's organism tables.
#[derive(Clone)]
pub struct OrganismWriter {
    scope: RunScope,
    compress_state: bool,
}

impl OrganismWriter {
    pub(crate) fn new(scope: RunScope, compress_state: bool) -> Self {
        Self { scope, compress_state }
    }

    /// Upsert static rows and per-tick states in one transaction.
    pub fn write_states(&self, ticks: &[TickData]) -> Result<(), DbError> {
        if ticks.is_empty() {
            return Ok(());
        }
        let mut conn = self.scope.connection().lock();
        let tx = conn.transaction()?;
        {
            let mut merge_organism = tx.prepare_cached(
                "INSERT INTO organisms
                     (organism_id, program_id, birth_tick, initial_position)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (organism_id) DO UPDATE SET
                     program_id = excluded.program_id,
                     birth_tick = excluded.birth_tick,
                     initial_position = excluded.initial_position",
            )?;
            let mut upsert_state = tx.prepare_cached(
                "INSERT INTO organism_states
                     (organism_id, tick_number, state, compressed)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (organism_id, tick_number) DO UPDATE SET
                     state = excluded.state,
                     compressed = excluded.compressed",
            )?;
            for tick in ticks {
                for org in &tick.organisms {
                    merge_organism.execute(params![
                        org.organism_id,
                        org.program_id,
                        org.birth_tick,
                        serde_json::to_string(&org.initial_position)?,
                    ])?;
                    let (state, compressed) = self.encode_state(org)?;
                    upsert_state.execute(params![
                        org.organism_id,
                        tick.tick_number,
                        state,
                        compressed as i64,
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn encode_state(&self, org: &OrganismState) -> Result<(Vec<u8>, bool), DbError> {
        let json = serde_json::to_vec(org)?;
        if self.compress_state {
            Ok((zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?, true))
        } else {
            Ok((json, false))
        }
    }
}

pub(crate) fn decode_state(bytes: &[u8], compressed: bool) -> Result<OrganismState, DbError> {
    if compressed {
        let json = zstd::decode_all(bytes)?;
        Ok(serde_json::from_slice(&json)?)
    } else {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
#[path = "organism_tests.rs"]
mod tests;
