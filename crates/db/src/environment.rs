// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment cell capability.

use rusqlite::params;
use viv_core::{EnvironmentSpec, TickData};

use crate::database::{DbError, RunScope};

/// One row of the `environment_cells` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRow {
    pub tick_number: i64,
    pub flat_index: i64,
    pub coords: Vec<i64>,
    pub owner_id: i64,
    pub molecule_type: i32,
    pub molecule_value: i32,
}

/// Upsert capability over the run's `environment_cells` table.
#[derive(Clone)]
pub struct EnvironmentWriter {
    scope: RunScope,
}

impl EnvironmentWriter {
    pub(crate) fn new(scope: RunScope) -> Self {
        Self { scope }
    }

    /// Upsert every cell of every tick in one transaction.
    ///
    /// Flat indexes are translated to coordinates with the run's
    /// environment shape (row-major, last dimension fastest). Either
    /// the whole input lands or none of it does.
    pub fn write_cells(&self, ticks: &[TickData], env: &EnvironmentSpec) -> Result<(), DbError> {
        if ticks.is_empty() {
            return Ok(());
        }
        let mut conn = self.scope.connection().lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO environment_cells
                     (tick_number, flat_index, coords, owner_id,
                      molecule_type, molecule_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (tick_number, flat_index) DO UPDATE SET
                     coords = excluded.coords,
                     owner_id = excluded.owner_id,
                     molecule_type = excluded.molecule_type,
                     molecule_value = excluded.molecule_value",
            )?;
            for tick in ticks {
                for cell in &tick.cells {
                    let coords = env.coords_from_flat(cell.flat_index)?;
                    stmt.execute(params![
                        tick.tick_number,
                        cell.flat_index,
                        serde_json::to_string(&coords)?,
                        cell.owner_id,
                        cell.molecule_type,
                        cell.molecule_value
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
