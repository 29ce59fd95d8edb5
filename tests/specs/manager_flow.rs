//! Whole-pipeline specs: manifest to indexed rows.

use crate::prelude::*;
use viv_manager::{Manifest, ServiceManager};

fn manifest_text(root: &std::path::Path) -> String {
    format!(
        r#"
[resources.main-topic]
kind = "topic"
path = "{root}/topic.db"

[resources.blob-store]
kind = "storage"
path = "{root}/blobs"

[resources.main-db]
kind = "database"
path = "{root}/db"

[[services]]
name = "metadata-indexer"
kind = "metadata"

[services.config]
run_id = "r1"
topic_poll_timeout_ms = 5000

[[services.bindings]]
port = "metadata-topic"
resource = "main-topic"
usage = "topic-read"

[services.bindings.options]
consumer_group = "metadata"

[[services.bindings]]
port = "blobs"
resource = "blob-store"
usage = "storage-read"

[[services.bindings]]
port = "db"
resource = "main-db"
usage = "db-metadata-write"

[[services]]
name = "env-indexer"
kind = "environment"

[services.config]
run_id = "r1"
topic_poll_timeout_ms = 100
insert_batch_size = 10
flush_timeout_ms = 1000

[[services.bindings]]
port = "batch-topic"
resource = "main-topic"
usage = "topic-read"

[services.bindings.options]
consumer_group = "env"

[[services.bindings]]
port = "blobs"
resource = "blob-store"
usage = "storage-read"

[[services.bindings]]
port = "db"
resource = "main-db"
usage = "db-env-write"

[[services]]
name = "organism-indexer"
kind = "organism"

[services.config]
run_id = "r1"
topic_poll_timeout_ms = 100

[[services.bindings]]
port = "batch-topic"
resource = "main-topic"
usage = "topic-read"

[services.bindings.options]
consumer_group = "organism"

[[services.bindings]]
port = "blobs"
resource = "blob-store"
usage = "storage-read"

[[services.bindings]]
port = "db"
resource = "main-db"
usage = "db-organism-write"
"#,
        root = root.display()
    )
}

#[tokio::test(start_paused = true)]
async fn manifest_pipeline_indexes_a_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let run: RunId = "r1".into();

    // producer side, sharing the manifest's backends
    let storage =
        viv_storage::BatchStorage::open(dir.path().join("blobs"), clock.clone()).unwrap();
    let topic =
        Arc::new(viv_topic::TopicBackend::open(dir.path().join("topic.db"), clock.clone()).unwrap());

    let meta = viv_core::test_support::sample_metadata("r1", vec![10, 10]);
    let key = storage.write_metadata(&meta).unwrap();
    topic
        .writer::<MetadataInfo>(METADATA_TOPIC, run.clone())
        .send(&MetadataInfo {
            simulation_run_id: run.clone(),
            storage_key: key,
            written_at_ms: clock.epoch_ms(),
        })
        .unwrap();

    let batch_writer = topic.writer::<BatchInfo>(BATCH_TOPIC, run.clone());
    for t in 0..20i64 {
        let ticks =
            vec![viv_core::test_support::TickBuilder::new("r1", t).cells(2).organisms(1).build()];
        let path = storage.write_batch(&ticks, t, t).unwrap();
        batch_writer
            .send(&BatchInfo {
                simulation_run_id: run.clone(),
                storage_path: path,
                tick_start: t,
                tick_end: t,
                written_at_ms: clock.epoch_ms(),
            })
            .unwrap();
    }

    // consumer side: the whole pipeline from the manifest
    let manifest = Manifest::parse(&manifest_text(dir.path())).unwrap();
    let manager = ServiceManager::build(&manifest, clock.clone()).unwrap();
    manager.start_all().await.unwrap();

    let db = viv_db::Database::open(dir.path().join("db"), clock.clone()).unwrap();
    let reader = db.run_scope(&run).unwrap().reader();

    // metadata lands first, then both batch indexers drain the topic
    wait_for(|| reader.read_metadata().unwrap().is_some()).await;
    wait_for(|| reader.environment_tick_count().unwrap() == 20).await;
    wait_for(|| reader.organism_details(1, 19).unwrap().is_some()).await;

    // the metadata indexer has already stopped itself; the roll-up
    // reports the worst state present rather than RUNNING
    let statuses = manager.all_service_status();
    assert_eq!(statuses["metadata-indexer"].state, ServiceState::Stopped);
    assert_eq!(statuses["env-indexer"].state, ServiceState::Running);
    assert_eq!(statuses["organism-indexer"].state, ServiceState::Running);
    assert_eq!(manager.pipeline_status(), ServiceState::Stopped);

    manager.stop_all().await;
    assert_eq!(manager.pipeline_status(), ServiceState::Stopped);
    assert!(manager.all_service_status().values().all(|s| s.healthy));

    // read API shapes: latest run, tick range, region, organism details
    assert_eq!(db.latest_run_id().unwrap(), Some(run.clone()));
    assert_eq!(reader.tick_range().unwrap(), Some((0, 19)));
    let region = reader.environment_region(7, &[(0, 0), (0, 9)]).unwrap();
    assert_eq!(region.len(), 2);
}
