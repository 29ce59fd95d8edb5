//! Shared fixture for pipeline specs.

pub use std::sync::Arc;
pub use std::time::Duration;

use tempfile::{tempdir, TempDir};
use viv_core::test_support::{sample_metadata, tick_range};
pub use viv_core::{
    BatchInfo, Clock, FakeClock, IndexerConfig, MetadataInfo, RunId, ServiceState, BATCH_TOPIC,
    METADATA_TOPIC,
};
use viv_db::{Database, RunReader};
use viv_storage::BatchStorage;
pub use viv_indexer::{EngineResources, EnvironmentIndexer, MetadataIndexer, Service};
use viv_topic::{ReaderOptions, TopicBackend};

/// How long a spec waits (virtual time) before declaring failure.
pub const SPEC_WAIT: Duration = Duration::from_secs(60);

/// One simulated pipeline: shared backends plus a run under test.
pub struct Pipeline {
    pub clock: FakeClock,
    pub topic: Arc<TopicBackend<FakeClock>>,
    pub storage: Arc<BatchStorage<FakeClock>>,
    pub database: Arc<Database<FakeClock>>,
    pub run: RunId,
    _dirs: (TempDir, TempDir),
}

impl Pipeline {
    pub fn new(run: &str) -> Self {
        let clock = FakeClock::new();
        clock.set_epoch_ms(1_000_000);
        let storage_dir = tempdir().expect("tempdir");
        let db_dir = tempdir().expect("tempdir");
        Self {
            storage: Arc::new(
                BatchStorage::open(storage_dir.path(), clock.clone()).expect("storage"),
            ),
            topic: Arc::new(TopicBackend::in_memory(clock.clone()).expect("topic")),
            database: Arc::new(Database::open(db_dir.path(), clock.clone()).expect("database")),
            clock,
            run: run.into(),
            _dirs: (storage_dir, db_dir),
        }
    }

    /// Resources for an indexer on the given topic and consumer group.
    pub fn resources(&self, topic_name: &str, group: &str) -> EngineResources<FakeClock> {
        EngineResources {
            topic: Arc::clone(&self.topic),
            topic_name: topic_name.to_string(),
            reader_options: ReaderOptions::group(group),
            storage: self.storage.reader(),
            database: Arc::clone(&self.database),
        }
    }

    /// Config pinned to the run under test, with a short poll budget.
    pub fn config(&self) -> IndexerConfig {
        IndexerConfig {
            run_id: Some(self.run.to_string()),
            topic_poll_timeout_ms: 100,
            ..Default::default()
        }
    }

    /// Write the metadata row directly, bypassing the metadata indexer.
    pub fn seed_metadata(&self, shape: Vec<i64>) {
        self.database
            .run_scope(&self.run)
            .expect("run scope")
            .metadata_writer()
            .insert_metadata(&sample_metadata(self.run.as_str(), shape))
            .expect("insert metadata");
    }

    /// Producer side: blob first, then the notification.
    pub fn publish_ticks(&self, first: i64, last: i64, cells: usize) -> String {
        let ticks = tick_range(self.run.as_str(), first, last, cells);
        let path = self.storage.write_batch(&ticks, first, last).expect("write batch");
        self.publish_info(&path, first, last);
        path
    }

    /// Re-announce an existing blob (redelivery of the same content).
    pub fn publish_info(&self, path: &str, first: i64, last: i64) {
        self.topic
            .writer::<BatchInfo>(BATCH_TOPIC, self.run.clone())
            .send(&BatchInfo {
                simulation_run_id: self.run.clone(),
                storage_path: path.to_string(),
                tick_start: first,
                tick_end: last,
                written_at_ms: self.clock.epoch_ms(),
            })
            .expect("send batch info");
    }

    /// Producer side for metadata: blob plus notification.
    pub fn publish_metadata(&self, shape: Vec<i64>) {
        let meta = sample_metadata(self.run.as_str(), shape);
        let key = self.storage.write_metadata(&meta).expect("write metadata");
        self.topic
            .writer::<MetadataInfo>(METADATA_TOPIC, self.run.clone())
            .send(&MetadataInfo {
                simulation_run_id: self.run.clone(),
                storage_key: key,
                written_at_ms: self.clock.epoch_ms(),
            })
            .expect("send metadata info");
    }

    pub fn db_reader(&self) -> RunReader {
        self.database.run_scope(&self.run).expect("run scope").reader()
    }

    pub fn unacked(&self, topic_name: &str, group: &str) -> u64 {
        self.topic
            .unacked_count(topic_name, &self.run, group)
            .expect("unacked count")
    }
}

/// Wait (in virtual time) for a condition to hold.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(SPEC_WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within the spec wait budget");
}
