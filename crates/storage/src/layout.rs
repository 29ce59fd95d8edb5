// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout of the blob store.
//!
//! ```text
//! <root>/<run_id>/run.created                       first-write timestamp
//! <root>/<run_id>/metadata.bin                      run metadata blob
//! <root>/<run_id>/batches/<first>_<last>_<seq>.bin  tick batch blobs
//! ```
//!
//! Paths handed to producers are relative to the root; consumers treat
//! them as opaque handles.

use viv_core::RunId;

pub const METADATA_FILE: &str = "metadata.bin";
pub const BATCHES_DIR: &str = "batches";
pub const CREATED_MARKER: &str = "run.created";

/// Relative path of a run's metadata blob.
pub fn metadata_path(run_id: &RunId) -> String {
    format!("{}/{METADATA_FILE}", run_id)
}

/// Relative path of a tick batch blob.
pub fn batch_path(run_id: &RunId, first_tick: i64, last_tick: i64, seq: u64) -> String {
    format!("{}/{BATCHES_DIR}/{first_tick}_{last_tick}_{seq}.bin", run_id)
}

/// Sequence number parsed from a batch file name, if it is one of ours.
pub(crate) fn batch_seq(file_name: &str) -> Option<u64> {
    let stem = file_name.strip_suffix(".bin")?;
    let mut parts = stem.splitn(3, '_');
    parts.next()?.parse::<i64>().ok()?;
    parts.next()?.parse::<i64>().ok()?;
    parts.next()?.parse::<u64>().ok()
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
