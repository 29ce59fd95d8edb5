// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic notification payloads.
//!
//! Producers write a blob to storage first, then publish one of these
//! to the topic. Indexers resolve the storage path back to records.

use crate::run::RunId;
use serde::{Deserialize, Serialize};

/// Topic carrying [`BatchInfo`] notifications.
pub const BATCH_TOPIC: &str = "batches";
/// Topic carrying [`MetadataInfo`] notifications.
pub const METADATA_TOPIC: &str = "metadata";

/// Notification that a tick batch blob is readable in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub simulation_run_id: RunId,
    /// Storage path handle, opaque to consumers.
    pub storage_path: String,
    pub tick_start: i64,
    pub tick_end: i64,
    pub written_at_ms: u64,
}

impl BatchInfo {
    /// Structural validity: a batch must cover a non-empty tick range.
    pub fn is_well_formed(&self) -> bool {
        self.tick_start <= self.tick_end
    }

    /// Whether a tick number lies inside the declared range.
    pub fn contains_tick(&self, tick: i64) -> bool {
        (self.tick_start..=self.tick_end).contains(&tick)
    }
}

/// Notification that a run's metadata blob is readable in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataInfo {
    pub simulation_run_id: RunId,
    pub storage_key: String,
    pub written_at_ms: u64,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
