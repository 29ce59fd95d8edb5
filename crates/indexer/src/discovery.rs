// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-id discovery.
//!
//! Post-mortem mode uses the configured id directly. Tail mode polls
//! storage for a run whose first write happened after the indexer
//! started, so an indexer brought up alongside the simulation attaches
//! to the run the simulation is about to produce.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use viv_core::{Clock, IndexerConfig, RunId};
use viv_storage::StorageReader;

use crate::error::IndexerError;

/// Resolve the run this indexer should attach to.
pub async fn discover_run_id<C: Clock>(
    config: &IndexerConfig,
    storage: &StorageReader<C>,
    clock: &C,
    cancel: &CancellationToken,
) -> Result<RunId, IndexerError> {
    if let Some(id) = &config.run_id {
        return Ok(RunId::new(id.clone()));
    }

    let since = clock.epoch_ms();
    let deadline = tokio::time::Instant::now() + config.max_poll_duration();

    loop {
        let mut runs = storage.list_run_ids(since)?;
        if !runs.is_empty() {
            // deterministic pick when several runs raced into existence
            runs.sort();
            let run = runs.remove(0);
            info!(run = run.as_str(), "discovered new simulation run");
            return Ok(run);
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(IndexerError::RunDiscoveryTimeout {
                waited_ms: config.max_poll_duration_ms,
            });
        }
        debug!("no new run yet, polling again");
        let nap = config.poll_interval().min(deadline - now);
        tokio::select! {
            _ = cancel.cancelled() => return Err(IndexerError::Cancelled),
            _ = tokio::time::sleep(nap) => {}
        }
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
