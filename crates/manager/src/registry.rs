// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource registry: owns the shared backends.
//!
//! Backends are opened once from the manifest and shared by every
//! service bound to them. The registry checks that a binding's usage
//! kind matches the backend's type before a service is even
//! constructed, so misdeclared manifests fail at build time rather
//! than mid-run.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use viv_core::{Clock, ResourceBinding, UsageKind};
use viv_db::Database;
use viv_storage::BatchStorage;
use viv_topic::TopicBackend;

use crate::manifest::{ResourceDef, ResourceKind};

/// Errors from registry construction and binding resolution.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("resource {resource} is a {actual:?}, but binding {port} asks for usage {usage}")]
    UsageMismatch {
        resource: String,
        actual: ResourceKind,
        port: String,
        usage: UsageKind,
    },
    #[error("failed to open topic backend: {0}")]
    Topic(#[from] viv_topic::TopicError),
    #[error("failed to open storage backend: {0}")]
    Storage(#[from] viv_storage::StorageError),
    #[error("failed to open database backend: {0}")]
    Database(#[from] viv_db::DbError),
}

enum Backend<C: Clock> {
    Topic(Arc<TopicBackend<C>>),
    Storage(Arc<BatchStorage<C>>),
    Database(Arc<Database<C>>),
}

impl<C: Clock> Backend<C> {
    fn kind(&self) -> ResourceKind {
        match self {
            Backend::Topic(_) => ResourceKind::Topic,
            Backend::Storage(_) => ResourceKind::Storage,
            Backend::Database(_) => ResourceKind::Database,
        }
    }
}

/// The shared backends, keyed by manifest resource name.
pub struct ResourceRegistry<C: Clock> {
    backends: BTreeMap<String, Backend<C>>,
}

impl<C: Clock> ResourceRegistry<C> {
    /// Open every declared backend.
    pub fn from_manifest(
        resources: &BTreeMap<String, ResourceDef>,
        clock: &C,
    ) -> Result<Self, RegistryError> {
        let mut backends = BTreeMap::new();
        for (name, def) in resources {
            let backend = match def.kind {
                ResourceKind::Topic => {
                    Backend::Topic(Arc::new(TopicBackend::open(&def.path, clock.clone())?))
                }
                ResourceKind::Storage => {
                    Backend::Storage(Arc::new(BatchStorage::open(&def.path, clock.clone())?))
                }
                ResourceKind::Database => {
                    Backend::Database(Arc::new(Database::open(&def.path, clock.clone())?))
                }
            };
            info!(resource = name.as_str(), kind = ?def.kind, path = %def.path.display(), "resource opened");
            backends.insert(name.clone(), backend);
        }
        Ok(Self { backends })
    }

    /// Topic backend behind a `topic-read`/`topic-write` binding.
    pub fn topic(&self, binding: &ResourceBinding) -> Result<Arc<TopicBackend<C>>, RegistryError> {
        match self.lookup(binding)? {
            Backend::Topic(backend) if topic_usage(binding.usage) => Ok(Arc::clone(backend)),
            backend => Err(self.mismatch(binding, backend)),
        }
    }

    /// Storage backend behind a `storage-read`/`storage-write` binding.
    pub fn storage(
        &self,
        binding: &ResourceBinding,
    ) -> Result<Arc<BatchStorage<C>>, RegistryError> {
        match self.lookup(binding)? {
            Backend::Storage(backend) if storage_usage(binding.usage) => Ok(Arc::clone(backend)),
            backend => Err(self.mismatch(binding, backend)),
        }
    }

    /// Database backend behind a `db-*` binding.
    pub fn database(&self, binding: &ResourceBinding) -> Result<Arc<Database<C>>, RegistryError> {
        match self.lookup(binding)? {
            Backend::Database(backend) if db_usage(binding.usage) => Ok(Arc::clone(backend)),
            backend => Err(self.mismatch(binding, backend)),
        }
    }

    fn lookup(&self, binding: &ResourceBinding) -> Result<&Backend<C>, RegistryError> {
        self.backends
            .get(&binding.resource)
            .ok_or_else(|| RegistryError::UnknownResource(binding.resource.clone()))
    }

    fn mismatch(&self, binding: &ResourceBinding, backend: &Backend<C>) -> RegistryError {
        RegistryError::UsageMismatch {
            resource: binding.resource.clone(),
            actual: backend.kind(),
            port: binding.port.clone(),
            usage: binding.usage,
        }
    }
}

fn topic_usage(usage: UsageKind) -> bool {
    matches!(usage, UsageKind::TopicRead | UsageKind::TopicWrite)
}

fn storage_usage(usage: UsageKind) -> bool {
    matches!(usage, UsageKind::StorageRead | UsageKind::StorageWrite)
}

fn db_usage(usage: UsageKind) -> bool {
    matches!(
        usage,
        UsageKind::DbMetadataWrite
            | UsageKind::DbEnvironmentWrite
            | UsageKind::DbOrganismWrite
            | UsageKind::DbRead
    )
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
