// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource binding declarations.
//!
//! A binding pairs a service port with a named shared resource under a
//! usage contract. The manager resolves bindings to live capability
//! handles at service construction; this module holds only the
//! declarative side.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Narrow role under which a shared backend is exposed to a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UsageKind {
    TopicRead,
    TopicWrite,
    StorageRead,
    StorageWrite,
    DbMetadataWrite,
    DbEnvironmentWrite,
    DbOrganismWrite,
    DbRead,
}

/// Error for unrecognized usage strings.
#[derive(Debug, Error)]
#[error("unknown usage kind: {0}")]
pub struct UnknownUsage(String);

impl UsageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UsageKind::TopicRead => "topic-read",
            UsageKind::TopicWrite => "topic-write",
            UsageKind::StorageRead => "storage-read",
            UsageKind::StorageWrite => "storage-write",
            UsageKind::DbMetadataWrite => "db-metadata-write",
            UsageKind::DbEnvironmentWrite => "db-env-write",
            UsageKind::DbOrganismWrite => "db-organism-write",
            UsageKind::DbRead => "db-read",
        }
    }
}

impl FromStr for UsageKind {
    type Err = UnknownUsage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topic-read" => Ok(UsageKind::TopicRead),
            "topic-write" => Ok(UsageKind::TopicWrite),
            "storage-read" => Ok(UsageKind::StorageRead),
            "storage-write" => Ok(UsageKind::StorageWrite),
            "db-metadata-write" => Ok(UsageKind::DbMetadataWrite),
            "db-env-write" => Ok(UsageKind::DbEnvironmentWrite),
            "db-organism-write" => Ok(UsageKind::DbOrganismWrite),
            "db-read" => Ok(UsageKind::DbRead),
            other => Err(UnknownUsage(other.to_string())),
        }
    }
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for UsageKind {
    type Error = UnknownUsage;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<UsageKind> for String {
    fn from(u: UsageKind) -> Self {
        u.as_str().to_string()
    }
}

/// Per-binding options consumed by the resolved capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingOptions {
    /// Competing-consumer group for topic reads.
    pub consumer_group: Option<String>,
    /// Pin the binding to a specific run (post-mortem indexing).
    pub simulation_run_id: Option<String>,
    /// Claim lease length for topic reads.
    pub claim_timeout_ms: Option<u64>,
}

/// Declaration of one port → resource pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBinding {
    /// Port name the service looks up (e.g. `batch-topic`).
    pub port: String,
    /// Resource name in the manifest (e.g. `main-db`).
    pub resource: String,
    pub usage: UsageKind,
    #[serde(default)]
    pub options: BindingOptions,
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
