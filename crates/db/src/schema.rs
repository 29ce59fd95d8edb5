// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run table definitions.
//!
//! Everything is `IF NOT EXISTS` so schema creation is safe under
//! concurrent start of multiple indexers writing to the same run.

use rusqlite::Connection;

/// Tables of one run schema. Coordinate-valued columns are JSON arrays,
/// which keeps the layout dimension-agnostic.
const RUN_TABLES: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS environment_cells (
    tick_number    INTEGER NOT NULL,
    flat_index     INTEGER NOT NULL,
    coords         TEXT NOT NULL,
    owner_id       INTEGER NOT NULL,
    molecule_type  INTEGER NOT NULL,
    molecule_value INTEGER NOT NULL,
    PRIMARY KEY (tick_number, flat_index)
);

CREATE TABLE IF NOT EXISTS organisms (
    organism_id      INTEGER PRIMARY KEY,
    program_id       TEXT NOT NULL,
    birth_tick       INTEGER NOT NULL,
    initial_position TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organism_states (
    organism_id INTEGER NOT NULL,
    tick_number INTEGER NOT NULL,
    state       BLOB NOT NULL,
    compressed  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (organism_id, tick_number)
);
CREATE INDEX IF NOT EXISTS idx_organism_states_tick
    ON organism_states(tick_number);
";

/// Root-level catalog mapping run ids to their schemas.
pub(crate) const CATALOG: &str = "
CREATE TABLE IF NOT EXISTS runs (
    run_id        TEXT PRIMARY KEY,
    schema_name   TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL
);
";

pub(crate) fn create_run_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(RUN_TABLES)
}
