// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata row capability.
//!
//! One row per run, `key = 'simulation_info'`, value is the metadata
//! serialized as JSON. Written once by the metadata indexer; polled by
//! every batch indexer's metadata gate before tick processing starts.

use rusqlite::{params, OptionalExtension};
use viv_core::SimulationMetadata;

use crate::database::{DbError, RunScope};

/// Key of the single metadata row.
pub const METADATA_KEY: &str = "simulation_info";

/// Upsert capability over the run's `metadata` table.
#[derive(Clone)]
pub struct MetadataWriter {
    scope: RunScope,
}

impl MetadataWriter {
    pub(crate) fn new(scope: RunScope) -> Self {
        Self { scope }
    }

    /// Insert or replace the run's metadata row.
    pub fn insert_metadata(&self, meta: &SimulationMetadata) -> Result<(), DbError> {
        let value = serde_json::to_string(meta)?;
        let conn = self.scope.connection().lock();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            params![METADATA_KEY, value],
        )?;
        Ok(())
    }
}

/// Read capability over the run's `metadata` table.
#[derive(Clone)]
pub struct MetadataReader {
    scope: RunScope,
}

impl MetadataReader {
    pub(crate) fn new(scope: RunScope) -> Self {
        Self { scope }
    }

    /// The run's metadata, or `None` while the row has not landed yet.
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
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
