// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata prerequisite.
//!
//! Batch indexers must not process ticks before the run's metadata row
//! exists: the environment indexer needs the grid shape to translate
//! flat indexes, and readers treat metadata presence as the signal that
//! a run is queryable.

use tokio_util::sync::CancellationToken;
use tracing::debug;
use viv_core::{IndexerConfig, RunId, SimulationMetadata};
use viv_db::MetadataReader;

use crate::error::IndexerError;

/// Poll the run's metadata row until it lands or the budget runs out.
pub async fn wait_for_metadata(
    reader: &MetadataReader,
    config: &IndexerConfig,
    run_id: &RunId,
    cancel: &CancellationToken,
) -> Result<SimulationMetadata, IndexerError> {
    let deadline = tokio::time::Instant::now() + config.metadata_max_poll_duration();

    loop {
        if let Some(meta) = reader.read_metadata()? {
            return Ok(meta);
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(IndexerError::MetadataTimeout {
                run_id: run_id.to_string(),
                waited_ms: config.metadata_max_poll_duration_ms,
            });
        }
        debug!(run = run_id.as_str(), "metadata not yet present, polling");
        let nap = config.metadata_poll_interval().min(deadline - now);
        tokio::select! {
            _ = cancel.cancelled() => return Err(IndexerError::Cancelled),
            _ = tokio::time::sleep(nap) => {}
        }
    }
}

#[cfg(test)]
#[path = "metadata_gate_tests.rs"]
mod tests;
