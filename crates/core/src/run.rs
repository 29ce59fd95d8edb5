// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulation run identity.
//!
//! A run id is an opaque string, conventionally `YYYYMMDD-HHMMSSmm-<uuid>`.
//! Every run owns exactly one database schema; the schema name is derived
//! deterministically from the id, so schema names collide iff run ids
//! collide after sanitization.

use crate::clock::Clock;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Prefix for every run-scoped database schema.
pub const SCHEMA_PREFIX: &str = "sim_";

/// Unique identifier for one execution of the simulation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Create a RunId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh run id stamped with the clock's current time.
    ///
    /// Format: `YYYYMMDD-HHMMSSmm-<uuid>` where `mm` is hundredths of a
    /// second. The uuid suffix keeps ids unique even when two runs start
    /// within the same hundredth.
    pub fn generate(clock: &impl Clock) -> Self {
        let ms = clock.epoch_ms();
        let stamp = match Utc.timestamp_millis_opt(ms as i64).single() {
            Some(dt) => format!("{}{:02}", dt.format("%Y%m%d-%H%M%S"), (ms % 1000) / 10),
            None => ms.to_string(),
        };
        Self(format!("{}-{}", stamp, uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Database schema name for this run: `sim_` + lowercased id with
    /// every non-alphanumeric byte replaced by `_`.
    pub fn schema_name(&self) -> String {
        let sanitized: String = self
            .0
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{SCHEMA_PREFIX}{sanitized}")
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for RunId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RunId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for RunId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
