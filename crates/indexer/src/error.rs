// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Indexer-side error type.

use thiserror::Error;

/// Errors raised inside an indexer worker.
///
/// Only `RunDiscoveryTimeout`, `MetadataTimeout`, and `FatalWrite` are
/// terminal; batch-level failures stay inside the processing loop and
/// surface through the retry/DLQ path.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("topic error: {0}")]
    Topic(#[from] viv_topic::TopicError),
    #[error("storage error: {0}")]
    Storage(#[from] viv_storage::StorageError),
    #[error("database error: {0}")]
    Database(#[from] viv_db::DbError),
    #[error("no new simulation run appeared within {waited_ms}ms")]
    RunDiscoveryTimeout { waited_ms: u64 },
    #[error("metadata for run {run_id} did not appear within {waited_ms}ms")]
    MetadataTimeout { run_id: String, waited_ms: u64 },
    #[error("non-retriable database write: {0}")]
    FatalWrite(String),
    #[error("batch {storage_path} violates its declared bounds: {reason}")]
    InvalidBatch { storage_path: String, reason: String },
    #[error("worker cancelled")]
    Cancelled,
}

impl IndexerError {
    /// Whether this error must transition the service to ERROR.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IndexerError::RunDiscoveryTimeout { .. }
                | IndexerError::MetadataTimeout { .. }
                | IndexerError::FatalWrite(_)
        )
    }
}
