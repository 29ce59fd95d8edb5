//! Competing-consumer specs: one group, two indexers, no double work.

use crate::prelude::*;

#[tokio::test(start_paused = true)]
async fn two_indexers_in_one_group_split_the_partition() {
    let p = Pipeline::new("r1");
    p.seed_metadata(vec![10, 10]);
    for t in 0..50 {
        p.publish_ticks(t, t, 1);
    }

    let a = EnvironmentIndexer::new(
        "env-a",
        p.config(),
        Vec::new(),
        p.resources(BATCH_TOPIC, "g1"),
        p.clock.clone(),
    );
    let b = EnvironmentIndexer::new(
        "env-b",
        p.config(),
        Vec::new(),
        p.resources(BATCH_TOPIC, "g1"),
        p.clock.clone(),
    );
    a.start().await.unwrap();
    b.start().await.unwrap();

    let reader = p.db_reader();
    wait_for(|| reader.environment_tick_count().unwrap() == 50).await;
    wait_for(|| p.unacked(BATCH_TOPIC, "g1") == 0).await;
    a.stop().await.unwrap();
    b.stop().await.unwrap();

    let acks_a = a.status().metrics.get("batches_processed").copied().unwrap_or(0);
    let acks_b = b.status().metrics.get("batches_processed").copied().unwrap_or(0);

    // every message acked exactly once across the group
    assert_eq!(acks_a + acks_b, 50);
    // both members did real work
    assert!(acks_a > 0, "consumer a processed nothing");
    assert!(acks_b > 0, "consumer b processed nothing");
    // and the database holds each tick exactly once
    assert_eq!(reader.environment_tick_count().unwrap(), 50);
    assert_eq!(reader.tick_range().unwrap(), Some((0, 49)));
}

#[tokio::test(start_paused = true)]
async fn independent_groups_each_see_every_message() {
    let p = Pipeline::new("r1");
    p.seed_metadata(vec![10, 10]);
    for t in 0..10 {
        p.publish_ticks(t, t, 1);
    }

    let env = EnvironmentIndexer::new(
        "env",
        p.config(),
        Vec::new(),
        p.resources(BATCH_TOPIC, "env-group"),
        p.clock.clone(),
    );
    let shadow = EnvironmentIndexer::new(
        "shadow",
        p.config(),
        Vec::new(),
        p.resources(BATCH_TOPIC, "shadow-group"),
        p.clock.clone(),
    );
    env.start().await.unwrap();
    shadow.start().await.unwrap();

    wait_for(|| env.status().metrics.get("batches_processed") == Some(&10)).await;
    wait_for(|| shadow.status().metrics.get("batches_processed") == Some(&10)).await;
    env.stop().await.unwrap();
    shadow.stop().await.unwrap();

    // different groups consume independently: ten acks each
    assert_eq!(p.unacked(BATCH_TOPIC, "env-group"), 0);
    assert_eq!(p.unacked(BATCH_TOPIC, "shadow-group"), 0);
}
