// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dead-letter tracking.
//!
//! Retry counts are kept in memory per storage path, as redeliveries
//! always carry the same path. Once a path has failed `max_retries`
//! times the message is republished to the shadow DLQ topic and the
//! original becomes safe to ack.

use std::collections::HashMap;
use tracing::warn;
use viv_core::{BatchInfo, Clock};
use viv_topic::TopicWriter;

use crate::error::IndexerError;

/// Outcome of recording one failure.
#[derive(Debug, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Leave the message unacked; topic redelivery retries it.
    Retry { failures: u32 },
    /// Republished to the DLQ; ack the original.
    DeadLettered,
}

pub struct DeadLetter<C: Clock> {
    writer: TopicWriter<BatchInfo, C>,
    max_retries: u32,
    failures: HashMap<String, u32>,
}

impl<C: Clock> DeadLetter<C> {
    pub fn new(writer: TopicWriter<BatchInfo, C>, max_retries: u32) -> Self {
        Self { writer, max_retries, failures: HashMap::new() }
    }

    /// Record a processing failure for this batch.
    pub fn note_failure(&mut self, info: &BatchInfo) -> Result<FailureDisposition, IndexerError> {
        let count = self
            .failures
            .entry(info.storage_path.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);
        if *count < self.max_retries {
            Ok(FailureDisposition::Retry { failures: *count })
        } else {
            self.move_to_dlq(info)?;
            Ok(FailureDisposition::DeadLettered)
        }
    }

    /// Send a batch straight to the DLQ, bypassing the retry budget.
    pub fn move_to_dlq(&mut self, info: &BatchInfo) -> Result<(), IndexerError> {
        warn!(
            path = %info.storage_path,
            dlq = self.writer.topic(),
            "moving batch to dead-letter queue"
        );
        self.writer.send(info)?;
        self.failures.remove(&info.storage_path);
        Ok(())
    }

    /// Successful processing clears the path's failure history.
    pub fn note_success(&mut self, info: &BatchInfo) {
        self.failures.remove(&info.storage_path);
    }
}

#[cfg(test)]
#[path = "dlq_tests.rs"]
mod tests;
