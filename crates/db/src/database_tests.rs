// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tempfile::tempdir;
use viv_core::FakeClock;

fn database(dir: &tempfile::TempDir) -> (Database<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let db = Database::open(dir.path(), clock.clone()).unwrap();
    (db, clock)
}

#[test]
fn run_scope_creates_schema_file() {
    let dir = tempdir().unwrap();
    let (db, _) = database(&dir);

    let scope = db.run_scope(&"Run-1".into()).unwrap();
    assert_eq!(scope.schema_name(), "sim_run_1");
    assert!(dir.path().join("sim_run_1.db").exists());
}

#[test]
fn run_scope_is_idempotent_and_shares_connection() {
    let dir = tempdir().unwrap();
    let (db, _) = database(&dir);

    let a = db.run_scope(&"r1".into()).unwrap();
    let b = db.run_scope(&"r1".into()).unwrap();

    // both scopes observe writes through either handle
    a.metadata_writer()
        .insert_metadata(&viv_core::test_support::sample_metadata("r1", vec![4, 4]))
        .unwrap();
    assert!(b.metadata_reader().read_metadata().unwrap().is_some());
}

#[test]
fn latest_run_id_orders_by_registration_time() {
    let dir = tempdir().unwrap();
    let (db, clock) = database(&dir);

    db.run_scope(&"first".into()).unwrap();
    clock.advance(Duration::from_millis(10));
    db.run_scope(&"second".into()).unwrap();

    assert_eq!(db.latest_run_id().unwrap(), Some("second".into()));
    assert_eq!(db.run_ids().unwrap().len(), 2);
}

#[test]
fn latest_run_id_empty_catalog() {
    let dir = tempdir().unwrap();
    let (db, _) = database(&dir);
    assert!(db.latest_run_id().unwrap().is_none());
}

#[test]
fn reregistering_a_run_keeps_first_created_time() {
    let dir = tempdir().unwrap();
    let (db, clock) = database(&dir);

    db.run_scope(&"r1".into()).unwrap();
    clock.advance(Duration::from_millis(10));
    db.run_scope(&"r2".into()).unwrap();
    clock.advance(Duration::from_millis(10));
    // a second indexer opening r1 later must not make it "latest"
    db.run_scope(&"r1".into()).unwrap();

    assert_eq!(db.latest_run_id().unwrap(), Some("r2".into()));
}
