// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Indexer configuration keys.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration consumed by every indexer service.
///
/// All durations are milliseconds in the manifest. `insert_batch_size`
/// absent means tick-by-tick flushing (no buffering component).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Post-mortem mode when set; tail mode otherwise.
    pub run_id: Option<String>,
    /// Run-discovery polling cadence (tail mode).
    pub poll_interval_ms: u64,
    /// Run-discovery budget before `RUN_NOT_FOUND`.
    pub max_poll_duration_ms: u64,
    /// Metadata-prerequisite polling cadence.
    pub metadata_poll_interval_ms: u64,
    /// Metadata-prerequisite budget before `METADATA_TIMEOUT`.
    pub metadata_max_poll_duration_ms: u64,
    /// Per-call topic poll blocking budget.
    pub topic_poll_timeout_ms: u64,
    /// Flush size threshold; `None` forces tick-by-tick flushing.
    pub insert_batch_size: Option<usize>,
    /// Flush age threshold for buffered ticks.
    pub flush_timeout_ms: u64,
    /// Redeliveries tolerated before a message moves to the DLQ.
    pub max_retries: u32,
    /// Compress serialized organism runtime state before writing.
    pub compress_state: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            run_id: None,
            poll_interval_ms: 500,
            max_poll_duration_ms: 60_000,
            metadata_poll_interval_ms: 250,
            metadata_max_poll_duration_ms: 30_000,
            topic_poll_timeout_ms: 1_000,
            insert_batch_size: None,
            flush_timeout_ms: 5_000,
            max_retries: 3,
            compress_state: false,
        }
    }
}

impl IndexerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_duration(&self) -> Duration {
        Duration::from_millis(self.max_poll_duration_ms)
    }

    pub fn metadata_poll_interval(&self) -> Duration {
        Duration::from_millis(self.metadata_poll_interval_ms)
    }

    pub fn metadata_max_poll_duration(&self) -> Duration {
        Duration::from_millis(self.metadata_max_poll_duration_ms)
    }

    pub fn topic_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.topic_poll_timeout_ms)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    /// Whether the buffering component is active.
    pub fn buffering(&self) -> bool {
        self.insert_batch_size.is_some()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
