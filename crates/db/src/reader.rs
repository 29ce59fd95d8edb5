// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-scoped read capability backing the external read API.

use rusqlite::{params, OptionalExtension};
use viv_core::{OrganismState, SimulationMetadata};

use crate::database::{DbError, RunScope};
use crate::environment::CellRow;
use crate::metadata::METADATA_KEY;
use crate::organism::{decode_state, OrganismRow};

/// Read view over one run's schema.
#[derive(Clone)]
pub struct RunReader {
    scope: RunScope,
}

impl RunReader {
    pub(crate) fn new(scope: RunScope) -> Self {
        Self { scope }
    }

    /// The run's metadata row, if written.
    pub fn read_metadata(&self) -> Result<Option<SimulationMetadata>, DbError> {
        let value = {
            let conn = self.scope.connection().lock();
            conn.query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![METADATA_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?
        };
        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Smallest and largest indexed tick across all per-tick tables.
    pub fn tick_range(&self) -> Result<Option<(i64, i64)>, DbError> {
        let conn = self.scope.connection().lock();
        let range = conn
            .query_row(
                "SELECT MIN(tick_number), MAX(tick_number) FROM (
                     SELECT tick_number FROM environment_cells
                     UNION ALL
                     SELECT tick_number FROM organism_states
                 )",
                [],
                |row| {
                    let min: Option<i64> = row.get(0)?;
                    let max: Option<i64> = row.get(1)?;
                    Ok(min.zip(max))
                },
            )
            .optional()?
            .flatten();
        Ok(range)
    }

    /// Cells at one tick whose coordinates fall inside `bounds`
    /// (inclusive `(min, max)` per dimension; missing dimensions are
    /// unbounded).
    pub fn environment_region(
        &self,
        tick: i64,
        bounds: &[(i64, i64)],
    ) -> Result<Vec<CellRow>, DbError> {
        let rows = {
            let conn = self.scope.connection().lock();
            let mut stmt = conn.prepare_cached(
                "SELECT tick_number, flat_index, coords, owner_id,
                        molecule_type, molecule_value
                 FROM environment_cells
                 WHERE tick_number = ?1
                 ORDER BY flat_index",
            )?;
            let mapped = stmt.query_map(params![tick], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i32>(4)?,
                    row.get::<_, i32>(5)?,
                ))
            })?;
            let mut rows = Vec::new();
            for r in mapped {
                rows.push(r?);
            }
            rows
        };

        let mut cells = Vec::new();
        for (tick_number, flat_index, coords_json, owner_id, molecule_type, molecule_value) in rows
        {
            let coords: Vec<i64> = serde_json::from_str(&coords_json)?;
            let inside = coords
                .iter()
                .zip(bounds)
                .all(|(c, (lo, hi))| c >= lo && c <= hi);
            if inside {
                cells.push(CellRow {
                    tick_number,
                    flat_index,
                    coords,
                    owner_id,
                    molecule_type,
                    molecule_value,
                });
            }
        }
        Ok(cells)
    }

    /// Static row plus decoded runtime state at one tick.
    pub fn organism_details(
        &self,
        organism_id: i64,
        tick: i64,
    ) -> Result<Option<(OrganismRow, OrganismState)>, DbError> {
        let conn = self.scope.connection().lock();
        let Some(static_row) = conn
            .query_row(
                "SELECT organism_id, program_id, birth_tick, initial_position
                 FROM organisms WHERE organism_id = ?1",
                params![organism_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?
        else {
            return Ok(None);
        };

        let Some((state, compressed)) = conn
            .query_row(
                "SELECT state, compressed FROM organism_states
                 WHERE organism_id = ?1 AND tick_number = ?2",
                params![organism_id, tick],
                |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)? != 0)),
            )
            .optional()?
        else {
            return Ok(None);
        };

        let row = OrganismRow {
            organism_id: static_row.0,
            program_id: static_row.1,
            birth_tick: static_row.2,
            initial_position: serde_json::from_str(&static_row.3)?,
        };
        Ok(Some((row, decode_state(&state, compressed)?)))
    }

    /// Distinct ticks present in `environment_cells` (tests and status).
    pub fn environment_tick_count(&self) -> Result<u64, DbError> {
        let conn = self.scope.connection().lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT tick_number) FROM environment_cells",
            [],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Rows at one tick in `environment_cells` (tests and status).
    pub fn environment_cell_count(&self, tick: i64) -> Result<u64, DbError> {
        let conn = self.scope.connection().lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM environment_cells WHERE tick_number = ?1",
            params![tick],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
