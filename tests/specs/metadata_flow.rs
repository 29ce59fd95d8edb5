//! Metadata bootstrap specs: single-message lifecycle and gating.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn metadata_indexer_unblocks_a_waiting_batch_indexer() {
    let p = Pipeline::new("r1");

    // the batch indexer starts first and blocks on the metadata gate
    let env = EnvironmentIndexer::new(
        "env-indexer",
        p.config(),
        Vec::new(),
        p.resources(BATCH_TOPIC, "env"),
        p.clock.clone(),
    );
    env.start().await.unwrap();
    p.publish_ticks(0, 2, 1);

    // metadata arrives through the pipeline, not a backdoor write
    p.publish_metadata(vec![10, 10]);
    let meta_indexer = MetadataIndexer::new(
        "metadata-indexer",
        p.config(),
        Vec::new(),
        p.resources(METADATA_TOPIC, "metadata"),
        p.clock.clone(),
    );
    meta_indexer.start().await.unwrap();

    // the metadata indexer finishes its single message and stops itself
    wait_for(|| meta_indexer.status().state == ServiceState::Stopped).await;
    assert_eq!(meta_indexer.status().metrics.get("metadata_indexed"), Some(&1));

    // the gate opens and the batch indexer drains its topic
    let reader = p.db_reader();
    wait_for(|| reader.environment_tick_count().unwrap() == 3).await;
    env.stop().await.unwrap();

    let meta = reader.read_metadata().unwrap().unwrap();
    assert_eq!(meta.simulation_run_id, p.run);
    assert_eq!(meta.environment.shape, vec![10, 10]);
    assert_eq!(p.unacked(METADATA_TOPIC, "metadata"), 0);
}

#[tokio::test(start_paused = true)]
async fn metadata_round_trip_matches_what_was_published() {
    let p = Pipeline::new("r1");
    p.publish_metadata(vec![32, 16]);

    let indexer = MetadataIndexer::new(
        "metadata-indexer",
        p.config(),
        Vec::new(),
        p.resources(METADATA_TOPIC, "metadata"),
        p.clock.clone(),
    );
    indexer.start().await.unwrap();
    wait_for(|| indexer.status().state == ServiceState::Stopped).await;

    let stored = p.db_reader().read_metadata().unwrap().unwrap();
    let original = p.storage.read_metadata(&p.run).unwrap();
    assert_eq!(stored, original);
}
