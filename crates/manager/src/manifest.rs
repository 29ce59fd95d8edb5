// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline manifest.
//!
//! ```toml
//! [resources.main-topic]
//! kind = "topic"
//! path = "/var/lib/viv/topic.db"
//!
//! [resources.blob-store]
//! kind = "storage"
//! path = "/var/lib/viv/blobs"
//!
//! [resources.main-db]
//! kind = "database"
//! path = "/var/lib/viv/db"
//!
//! [[services]]
//! name = "env-indexer"
//! kind = "environment"
//!
//! [services.config]
//! insert_batch_size = 250
//!
//! [[services.bindings]]
//! port = "batch-topic"
//! resource = "main-topic"
//! usage = "topic-read"
//!
//! [services.bindings.options]
//! consumer_group = "env"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use viv_core::{IndexerConfig, ResourceBinding};

/// Errors from manifest loading.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate service name: {0}")]
    DuplicateService(String),
}

/// What a shared resource is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Topic,
    Storage,
    Database,
}

/// One shared backend declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub kind: ResourceKind,
    /// Filesystem root (storage, database) or database file (topic).
    pub path: PathBuf,
}

/// Which indexer to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Metadata,
    Environment,
    Organism,
    Dummy,
}

/// One service declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    pub name: String,
    pub kind: ServiceKind,
    #[serde(default)]
    pub config: IndexerConfig,
    #[serde(default)]
    pub bindings: Vec<ResourceBinding>,
}

/// The whole pipeline declaration. Service order is start order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDef>,
    #[serde(default)]
    pub services: Vec<ServiceDef>,
}

impl Manifest {
    /// Parse a manifest from TOML text.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(text)?;
        manifest.check_unique_names()?;
        Ok(manifest)
    }

    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    fn check_unique_names(&self) -> Result<(), ManifestError> {
        let mut seen = std::collections::HashSet::new();
        for service in &self.services {
            if !seen.insert(service.name.as_str()) {
                return Err(ManifestError::DuplicateService(service.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
