// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-backed blob store.
//!
//! Writes go to a temp file in the target directory followed by an
//! atomic rename, so concurrent readers see either nothing or the whole
//! blob. A `run.created` marker written on a run's first write carries
//! the timestamp used by `list_run_ids`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use viv_core::{Clock, RunId, SimulationMetadata, TickData};

use super::codec;
use super::layout::{self, BATCHES_DIR, CREATED_MARKER};

/// Errors from blob store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("cannot write an empty batch")]
    EmptyBatch,
    #[error("batch records disagree on run id: {expected} vs {found}")]
    MixedRuns { expected: RunId, found: RunId },
}

/// Blob store rooted at one directory.
pub struct BatchStorage<C: Clock> {
    root: PathBuf,
    clock: C,
}

impl<C: Clock> BatchStorage<C> {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, clock: C) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, clock })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a single blob at `path` (relative to the root).
    pub fn write_message<T: Serialize>(&self, path: &str, msg: &T) -> Result<(), StorageError> {
        let bytes = codec::encode(msg)?;
        self.write_atomic(path, &bytes)?;
        if let Some(run) = path.split('/').next() {
            self.touch_created_marker(run)?;
        }
        Ok(())
    }

    /// Read a single blob at `path` (relative to the root).
    pub fn read_message<T: DeserializeOwned>(&self, path: &str) -> Result<T, StorageError> {
        let bytes = match fs::read(self.root.join(path)) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        codec::decode(&bytes)
    }

    /// Write a run's metadata blob, returning its storage key.
    pub fn write_metadata(&self, meta: &SimulationMetadata) -> Result<String, StorageError> {
        let path = layout::metadata_path(&meta.simulation_run_id);
        self.write_message(&path, meta)?;
        Ok(path)
    }

    /// Read a run's metadata blob.
    pub fn read_metadata(&self, run_id: &RunId) -> Result<SimulationMetadata, StorageError> {
        self.read_message(&layout::metadata_path(run_id))
    }

    /// Write a batch of ticks, returning the storage path to publish.
    ///
    /// The run id comes from the records; every record must agree. The
    /// sequence suffix disambiguates repeated writes of the same range.
    pub fn write_batch(
        &self,
        ticks: &[TickData],
        first_tick: i64,
        last_tick: i64,
    ) -> Result<String, StorageError> {
        let run_id = match ticks.first() {
            Some(t) => t.simulation_run_id.clone(),
            None => return Err(StorageError::EmptyBatch),
        };
        for tick in ticks {
            if tick.simulation_run_id != run_id {
                return Err(StorageError::MixedRuns {
                    expected: run_id,
                    found: tick.simulation_run_id.clone(),
                });
            }
        }

        let seq = self.next_batch_seq(&run_id, first_tick, last_tick)?;
        let path = layout::batch_path(&run_id, first_tick, last_tick, seq);
        let bytes = codec::encode(&ticks)?;
        self.write_atomic(&path, &bytes)?;
        self.touch_created_marker(run_id.as_str())?;
        debug!(run = %run_id, path = %path, ticks = ticks.len(), "batch written");
        Ok(path)
    }

    /// Read a batch blob back into tick records.
    pub fn read_batch(&self, path: &str) -> Result<Vec<TickData>, StorageError> {
        self.read_message(path)
    }

    /// Run ids whose first write happened at or after `since_epoch_ms`.
    ///
    /// Order unspecified. Directories without a readable marker are
    /// skipped with a warning rather than failing discovery.
    pub fn list_run_ids(&self, since_epoch_ms: u64) -> Result<Vec<RunId>, StorageError> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(run) = name.to_str() else { continue };
            let marker = entry.path().join(CREATED_MARKER);
            let created_ms = match fs::read_to_string(&marker) {
                Ok(s) => match s.trim().parse::<u64>() {
                    Ok(ms) => ms,
                    Err(_) => {
                        warn!(run, "unparseable run.created marker, skipping");
                        continue;
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if created_ms >= since_epoch_ms {
                runs.push(RunId::new(run));
            }
        }
        Ok(runs)
    }

    /// Read-only capability over this store.
    pub fn reader(self: &Arc<Self>) -> StorageReader<C> {
        StorageReader { inner: Arc::clone(self) }
    }

    /// Write capability over this store.
    pub fn writer(self: &Arc<Self>) -> StorageWriter<C> {
        StorageWriter { inner: Arc::clone(self) }
    }

    fn write_atomic(&self, rel: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Write the first-write marker once per run.
    fn touch_created_marker(&self, run: &str) -> Result<(), StorageError> {
        let marker = self.root.join(run).join(CREATED_MARKER);
        if marker.exists() {
            return Ok(());
        }
        if let Some(parent) = marker.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&marker, self.clock.epoch_ms().to_string())?;
        Ok(())
    }

    /// Next free sequence number for a `<first>_<last>` range.
    fn next_batch_seq(
        &self,
        run_id: &RunId,
        first_tick: i64,
        last_tick: i64,
    ) -> Result<u64, StorageError> {
        let dir = self.root.join(run_id.as_str()).join(BATCHES_DIR);
        let prefix = format!("{first_tick}_{last_tick}_");
        let mut next = 0u64;
        match fs::read_dir(&dir) {
            Ok(entries) => {
                for entry in entries {
                    let entry = entry?;
                    let name = entry.file_name();
                    let Some(name) = name.to_str() else { continue };
                    if !name.starts_with(&prefix) {
                        continue;
                    }
                    if let Some(seq) = layout::batch_seq(name) {
                        next = next.max(seq + 1);
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(next)
    }
}

/// Read-only view handed to indexers under a `storage-read` binding.
pub struct StorageReader<C: Clock> {
    inner: Arc<BatchStorage<C>>,
}

impl<C: Clock> Clone for StorageReader<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Clock> StorageReader<C> {
    pub fn read_message<T: DeserializeOwned>(&self, path: &str) -> Result<T, StorageError> {
        self.inner.read_message(path)
    }

    pub fn read_metadata(&self, run_id: &RunId) -> Result<SimulationMetadata, StorageError> {
        self.inner.read_metadata(run_id)
    }

    pub fn read_batch(&self, path: &str) -> Result<Vec<TickData>, StorageError> {
        self.inner.read_batch(path)
    }

    pub fn list_run_ids(&self, since_epoch_ms: u64) -> Result<Vec<RunId>, StorageError> {
        self.inner.list_run_ids(since_epoch_ms)
    }
}

/// Write view handed to producers under a `storage-write` binding.
pub struct StorageWriter<C: Clock> {
    inner: Arc<BatchStorage<C>>,
}

impl<C: Clock> Clone for StorageWriter<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<C: Clock> StorageWriter<C> {
    pub fn write_message<T: Serialize>(&self, path: &str, msg: &T) -> Result<(), StorageError> {
        self.inner.write_message(path, msg)
    }

    pub fn write_metadata(&self, meta: &SimulationMetadata) -> Result<String, StorageError> {
        self.inner.write_metadata(meta)
    }

    pub fn write_batch(
        &self,
        ticks: &[TickData],
        first_tick: i64,
        last_tick: i64,
    ) -> Result<String, StorageError> {
        self.inner.write_batch(ticks, first_tick, last_tick)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
