//! Tick ingestion specs: buffering, ack ordering, drain, idempotency.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn tick_by_tick_run_lands_every_tick() {
    let p = Pipeline::new("r1");
    p.seed_metadata(vec![10, 10]);
    p.publish_ticks(0, 4, 1);

    let indexer = EnvironmentIndexer::new(
        "env-indexer",
        p.config(),
        Vec::new(),
        p.resources(BATCH_TOPIC, "env"),
        p.clock.clone(),
    );
    indexer.start().await.unwrap();

    let reader = p.db_reader();
    wait_for(|| reader.environment_tick_count().unwrap() == 5).await;
    indexer.stop().await.unwrap();

    let metrics = indexer.status().metrics;
    assert_eq!(metrics.get("batches_processed"), Some(&1));
    assert_eq!(metrics.get("ticks_processed"), Some(&5));
    // no buffering configured: one flush per tick
    assert_eq!(metrics.get("flush_count"), Some(&5));
    assert_eq!(p.unacked(BATCH_TOPIC, "env"), 0);
}

#[tokio::test(start_paused = true)]
async fn buffered_flushes_ack_batches_across_boundaries() {
    let p = Pipeline::new("r1");
    p.seed_metadata(vec![100, 100]);
    let config = IndexerConfig {
        insert_batch_size: Some(250),
        flush_timeout_ms: 10_000,
        ..p.config()
    };

    for i in 0..5i64 {
        p.publish_ticks(i * 100, i * 100 + 99, 1);
    }

    let indexer = EnvironmentIndexer::new(
        "env-indexer",
        config,
        Vec::new(),
        p.resources(BATCH_TOPIC, "env"),
        p.clock.clone(),
    );
    indexer.start().await.unwrap();

    let reader = p.db_reader();
    wait_for(|| reader.environment_tick_count().unwrap() == 500).await;
    indexer.stop().await.unwrap();

    let metrics = indexer.status().metrics;
    assert_eq!(metrics.get("batches_processed"), Some(&5));
    assert_eq!(metrics.get("ticks_processed"), Some(&500));
    // 500 ticks at a 250 threshold: exactly two size-triggered flushes
    assert_eq!(metrics.get("flush_count"), Some(&2));
    assert_eq!(p.unacked(BATCH_TOPIC, "env"), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_drains_the_buffer_and_acks_the_tail() {
    let p = Pipeline::new("r1");
    p.seed_metadata(vec![100, 100]);
    let config = IndexerConfig {
        insert_batch_size: Some(250),
        flush_timeout_ms: 60_000,
        ..p.config()
    };

    p.publish_ticks(0, 99, 1); // 100 ticks
    p.publish_ticks(100, 249, 1); // 150 ticks
    p.publish_ticks(250, 299, 1); // 50 ticks

    let indexer = EnvironmentIndexer::new(
        "env-indexer",
        config,
        Vec::new(),
        p.resources(BATCH_TOPIC, "env"),
        p.clock.clone(),
    );
    indexer.start().await.unwrap();

    // the first flush (exactly 250) completes the first two batches
    wait_for(|| indexer.status().metrics.get("batches_processed") == Some(&2)).await;
    assert_eq!(p.unacked(BATCH_TOPIC, "env"), 1);

    // stop: the remaining 50 buffered ticks flush and the third acks
    indexer.stop().await.unwrap();

    let metrics = indexer.status().metrics;
    assert_eq!(metrics.get("batches_processed"), Some(&3));
    assert_eq!(metrics.get("ticks_processed"), Some(&300));
    assert_eq!(metrics.get("buffer_size"), Some(&0));
    assert_eq!(p.unacked(BATCH_TOPIC, "env"), 0);
    assert_eq!(p.db_reader().environment_tick_count().unwrap(), 300);
}

#[tokio::test(start_paused = true)]
async fn redelivering_a_batch_changes_nothing() {
    let p = Pipeline::new("r1");
    p.seed_metadata(vec![10, 10]);
    let path = p.publish_ticks(0, 4, 3);

    let indexer = EnvironmentIndexer::new(
        "env-indexer",
        p.config(),
        Vec::new(),
        p.resources(BATCH_TOPIC, "env"),
        p.clock.clone(),
    );
    indexer.start().await.unwrap();
    wait_for(|| indexer.status().metrics.get("batches_processed") == Some(&1)).await;

    let reader = p.db_reader();
    let before = reader.environment_region(2, &[(0, 9), (0, 9)]).unwrap();

    // the producer re-announces the same blob (duplicate delivery)
    p.publish_info(&path, 0, 4);
    wait_for(|| indexer.status().metrics.get("batches_processed") == Some(&2)).await;
    indexer.stop().await.unwrap();

    // same keys, same rows: the upsert absorbed the duplicate
    assert_eq!(reader.environment_tick_count().unwrap(), 5);
    assert_eq!(reader.environment_cell_count(2).unwrap(), 3);
    assert_eq!(reader.environment_region(2, &[(0, 9), (0, 9)]).unwrap(), before);
}
