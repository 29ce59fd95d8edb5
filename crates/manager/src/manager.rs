// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service manager: builds and supervises the pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use viv_core::{
    Clock, IndexerConfig, ResourceBinding, ServiceState, ServiceStatus, UsageKind, BATCH_TOPIC,
    METADATA_TOPIC,
};
use viv_indexer::{
    DummyIndexer, EngineResources, EnvironmentIndexer, MetadataIndexer, OrganismIndexer, Service,
    ServiceError,
};
use viv_topic::ReaderOptions;

use crate::manifest::{Manifest, ServiceDef, ServiceKind};
use crate::registry::{RegistryError, ResourceRegistry};

/// Errors from pipeline assembly and supervision.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("service {service} has no binding with usage {usage}")]
    BindingMissing { service: String, usage: String },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Owns every service and the registry behind them.
///
/// Services start in manifest order and stop in reverse; backends stay
/// alive until the manager itself is dropped, after every dependent
/// service has stopped.
pub struct ServiceManager<C: Clock> {
    registry: Arc<ResourceRegistry<C>>,
    services: Vec<Arc<dyn Service>>,
}

impl<C: Clock> std::fmt::Debug for ServiceManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceManager")
            .field("services", &self.services.len())
            .finish_non_exhaustive()
    }
}

impl<C: Clock> ServiceManager<C> {
    /// Build the whole pipeline from a manifest.
    ///
    /// Every binding is resolved here; a missing or mismatched binding
    /// fails construction before any service starts.
    pub fn build(manifest: &Manifest, clock: C) -> Result<Self, ManagerError> {
        let registry = Arc::new(ResourceRegistry::from_manifest(&manifest.resources, &clock)?);
        let mut services: Vec<Arc<dyn Service>> = Vec::with_capacity(manifest.services.len());
        for def in &manifest.services {
            services.push(build_service(def, &registry, &clock)?);
        }
        Ok(Self { registry, services })
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry<C>> {
        &self.registry
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    /// Start every service in declared order.
    pub async fn start_all(&self) -> Result<(), ManagerError> {
        for service in &self.services {
            info!(service = service.name(), "starting");
            service.start().await?;
        }
        Ok(())
    }

    /// Stop every service in reverse order. Keeps going past stop
    /// failures so one stuck worker cannot wedge the whole shutdown.
    pub async fn stop_all(&self) {
        for service in self.services.iter().rev() {
            info!(service = service.name(), "stopping");
            if let Err(e) = service.stop().await {
                warn!(service = service.name(), error = %e, "stop failed");
            }
        }
    }

    pub fn service_status(&self, name: &str) -> Option<ServiceStatus> {
        self.services
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.status())
    }

    pub fn all_service_status(&self) -> BTreeMap<String, ServiceStatus> {
        self.services
            .iter()
            .map(|s| (s.name().to_string(), s.status()))
            .collect()
    }

    /// Roll-up state: RUNNING iff every service is RUNNING, else the
    /// worst state present.
    pub fn pipeline_status(&self) -> ServiceState {
        let mut worst = ServiceState::Running;
        for service in &self.services {
            let state = service.status().state;
            if state.severity() > worst.severity() {
                worst = state;
            }
        }
        worst
    }
}

/// Instantiate one service from its manifest entry.
fn build_service<C: Clock>(
    def: &ServiceDef,
    registry: &ResourceRegistry<C>,
    clock: &C,
) -> Result<Arc<dyn Service>, ManagerError> {
    let topic_binding = require_binding(def, &[UsageKind::TopicRead])?;
    let storage_binding = require_binding(def, &[UsageKind::StorageRead])?;
    let db_binding = require_binding(def, db_usages(def.kind))?;

    let topic_name = match def.kind {
        ServiceKind::Metadata => METADATA_TOPIC,
        _ => BATCH_TOPIC,
    };
    let mut reader_options = ReaderOptions::group(
        topic_binding
            .options
            .consumer_group
            .clone()
            .unwrap_or_else(|| def.name.clone()),
    );
    if let Some(claim_ms) = topic_binding.options.claim_timeout_ms {
        reader_options = reader_options.claim_timeout_ms(claim_ms);
    }

    let resources = EngineResources {
        topic: registry.topic(topic_binding)?,
        topic_name: topic_name.to_string(),
        reader_options,
        storage: registry.storage(storage_binding)?.reader(),
        database: registry.database(db_binding)?,
    };

    // a binding may pin the run id when the service config does not
    let mut config: IndexerConfig = def.config.clone();
    if config.run_id.is_none() {
        config.run_id = topic_binding.options.simulation_run_id.clone();
    }

    let bindings = def.bindings.clone();
    let name = def.name.clone();
    let service: Arc<dyn Service> = match def.kind {
        ServiceKind::Metadata => Arc::new(MetadataIndexer::new(
            name,
            config,
            bindings,
            resources,
            clock.clone(),
        )),
        ServiceKind::Environment => Arc::new(EnvironmentIndexer::new(
            name,
            config,
            bindings,
            resources,
            clock.clone(),
        )),
        ServiceKind::Organism => Arc::new(OrganismIndexer::new(
            name,
            config,
            bindings,
            resources,
            clock.clone(),
        )),
        ServiceKind::Dummy => Arc::new(DummyIndexer::new(
            name,
            config,
            bindings,
            resources,
            clock.clone(),
        )),
    };
    Ok(service)
}

fn db_usages(kind: ServiceKind) -> &'static [UsageKind] {
    match kind {
        ServiceKind::Metadata => &[UsageKind::DbMetadataWrite],
        ServiceKind::Environment => &[UsageKind::DbEnvironmentWrite],
        ServiceKind::Organism => &[UsageKind::DbOrganismWrite],
        // the dummy indexer only reads the metadata prerequisite
        ServiceKind::Dummy => &[
            UsageKind::DbRead,
            UsageKind::DbMetadataWrite,
            UsageKind::DbEnvironmentWrite,
            UsageKind::DbOrganismWrite,
        ],
    }
}

fn require_binding<'a>(
    def: &'a ServiceDef,
    usages: &[UsageKind],
) -> Result<&'a ResourceBinding, ManagerError> {
    def.bindings
        .iter()
        .find(|b| usages.contains(&b.usage))
        .ok_or_else(|| ManagerError::BindingMissing {
            service: def.name.clone(),
            usage: usages
                .iter()
                .map(|u| u.as_str())
                .collect::<Vec<_>>()
                .join("|"),
        })
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
