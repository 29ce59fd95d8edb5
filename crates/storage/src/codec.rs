// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blob codec: zstd-compressed JSON.
//!
//! The field contracts are fixed by viv-core's serde derives; the byte
//! layout here is an implementation detail of this store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::store::StorageError;

/// Compression level for blobs. Level 3 is the zstd default trade-off.
const ZSTD_LEVEL: i32 = 3;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let json = serde_json::to_vec(value)?;
    Ok(zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    let json = zstd::decode_all(bytes)?;
    Ok(serde_json::from_slice(&json)?)
}
