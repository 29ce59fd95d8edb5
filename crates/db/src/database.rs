// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database backend and run-scoped handles.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use viv_core::{Clock, RunId};

use crate::environment::EnvironmentWriter;
use crate::metadata::{MetadataReader, MetadataWriter};
use crate::organism::OrganismWriter;
use crate::reader::RunReader;
use crate::schema;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Metadata(#[from] viv_core::MetadataError),
}

/// Shared relational backend rooted at one directory.
///
/// Holds a catalog of known runs plus one connection per open run
/// schema. Connections are cached so every [`RunScope`] for the same
/// run shares a connection (writes from different services serialize on
/// its mutex, one transaction per flush).
pub struct Database<C: Clock> {
    root: PathBuf,
    catalog: Mutex<Connection>,
    scopes: Mutex<HashMap<String, Arc<Mutex<Connection>>>>,
    clock: C,
}

impl<C: Clock> Database<C> {
    /// Open (creating if needed) a database backend rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, clock: C) -> Result<Self, DbError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let catalog = Connection::open(root.join("catalog.db"))?;
        catalog.execute_batch(schema::CATALOG)?;
        Ok(Self {
            root,
            catalog: Mutex::new(catalog),
            scopes: Mutex::new(HashMap::new()),
            clock,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run-scoped handle, creating the run's schema on first use.
    ///
    /// Idempotent and safe under concurrent start of several indexers
    /// for the same run.
    pub fn run_scope(&self, run_id: &RunId) -> Result<RunScope, DbError> {
        let schema_name = run_id.schema_name();

        let conn = {
            let mut scopes = self.scopes.lock();
            match scopes.get(&schema_name) {
                Some(conn) => Arc::clone(conn),
                None => {
                    let path = self.root.join(format!("{schema_name}.db"));
                    let conn = Connection::open(&path)?;
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                    schema::create_run_tables(&conn)?;
                    debug!(run = run_id.as_str(), schema = %schema_name, "run schema ready");
                    let conn = Arc::new(Mutex::new(conn));
                    scopes.insert(schema_name.clone(), Arc::clone(&conn));
                    conn
                }
            }
        };

        self.catalog.lock().execute(
            "INSERT OR IGNORE INTO runs (run_id, schema_name, created_at_ms)
             VALUES (?1, ?2, ?3)",
            params![run_id.as_str(), schema_name, self.clock.epoch_ms() as i64],
        )?;

        Ok(RunScope { run_id: run_id.clone(), schema_name, conn })
    }

    /// Most recently registered run, if any.
    pub fn latest_run_id(&self) -> Result<Option<RunId>, DbError> {
        let catalog = self.catalog.lock();
        let run = catalog
            .query_row(
                "SELECT run_id FROM runs
                 ORDER BY created_at_ms DESC, run_id DESC LIMIT 1",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(run.map(RunId::new))
    }

    /// All runs known to the catalog, newest first.
    pub fn run_ids(&self) -> Result<Vec<RunId>, DbError> {
        let catalog = self.catalog.lock();
        let mut stmt = catalog.prepare(
            "SELECT run_id FROM runs ORDER BY created_at_ms DESC, run_id DESC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut runs = Vec::new();
        for row in rows {
            runs.push(RunId::new(row?));
        }
        Ok(runs)
    }
}

/// Immutable handle over one run's schema.
///
/// Every capability minted from it is inherently scoped to the run and
/// cannot be re-pointed.
#[derive(Clone)]
pub struct RunScope {
    run_id: RunId,
    schema_name: String,
    conn: Arc<Mutex<Connection>>,
}

impl RunScope {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub(crate) fn connection(&self) -> &Arc<Mutex<Connection>> {
        &self.conn
    }

    /// Metadata upsert capability (`db-metadata-write`).
    pub fn metadata_writer(&self) -> MetadataWriter {
        MetadataWriter::new(self.clone())
    }

    /// Metadata poll capability used by the metadata prerequisite gate.
    pub fn metadata_reader(&self) -> MetadataReader {
        MetadataReader::new(self.clone())
    }

    /// Environment cell upsert capability (`db-env-write`).
    pub fn environment_writer(&self) -> EnvironmentWriter {
        EnvironmentWriter::new(self.clone())
    }

    /// Organism upsert capability (`db-organism-write`).
    pub fn organism_writer(&self, compress_state: bool) -> OrganismWriter {
        OrganismWriter::new(self.clone(), compress_state)
    }

    /// Read capability over the whole run schema (`db-read`).
    pub fn reader(&self) -> RunReader {
        RunReader::new(self.clone())
    }
}

#[cfg(test)]
#[path = "database_tests.rs"]
mod tests;
