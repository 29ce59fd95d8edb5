// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata indexer: single-message lifecycle.
//!
//! One metadata notification per run: poll it, read the blob, create
//! the run schema, upsert the metadata row, ack, stop. A poll timeout
//! or a database failure after the read is fatal and leaves the
//! message unacked.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use viv_core::{
    kind, Clock, IndexerConfig, MetadataInfo, ResourceBinding, ServiceState, ServiceStatus,
    SimulationMetadata,
};

use crate::discovery::discover_run_id;
use crate::engine::EngineResources;
use crate::error::IndexerError;
use crate::service::{Service, ServiceCore, ServiceError, WorkerHandle};

/// Indexer that lands a run's metadata row, then stops.
pub struct MetadataIndexer<C: Clock> {
    core: Arc<ServiceCore>,
    config: IndexerConfig,
    clock: C,
    resources: EngineResources<C>,
    worker: WorkerHandle,
}

impl<C: Clock> MetadataIndexer<C> {
    pub fn new(
        name: impl Into<String>,
        config: IndexerConfig,
        bindings: Vec<ResourceBinding>,
        resources: EngineResources<C>,
        clock: C,
    ) -> Self {
        Self {
            core: Arc::new(ServiceCore::new(name, bindings)),
            config,
            clock,
            resources,
            worker: WorkerHandle::new(),
        }
    }

    pub fn core(&self) -> &Arc<ServiceCore> {
        &self.core
    }

    async fn index_metadata(
        core: &Arc<ServiceCore>,
        config: &IndexerConfig,
        clock: &C,
        resources: &EngineResources<C>,
        cancel: &CancellationToken,
    ) -> Result<(), IndexerError> {
        let run_id = discover_run_id(config, &resources.storage, clock, cancel).await?;
        let reader = resources.topic.reader::<MetadataInfo>(
            resources.topic_name.clone(),
            run_id.clone(),
            resources.reader_options.clone(),
        );

        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(IndexerError::Cancelled),
            polled = reader.poll(config.topic_poll_timeout()) => polled?,
        };
        let Some(msg) = polled else {
            return Err(IndexerError::MetadataTimeout {
                run_id: run_id.to_string(),
                waited_ms: config.topic_poll_timeout_ms,
            });
        };

        let meta: SimulationMetadata = resources.storage.read_message(&msg.payload.storage_key)?;
        meta.environment
            .validate()
            .map_err(|e| IndexerError::FatalWrite(e.to_string()))?;

        let scope = resources.database.run_scope(&run_id)?;
        scope.metadata_writer().insert_metadata(&meta)?;
        reader.ack(&msg.ack_token)?;

        core.metrics().increment("metadata_indexed");
        info!(
            service = core.name(),
            run = run_id.as_str(),
            schema = scope.schema_name(),
            "metadata indexed"
        );
        Ok(())
    }
}

#[async_trait]
impl<C: Clock> Service for MetadataIndexer<C> {
    fn name(&self) -> &str {
        self.core.name()
    }

    async fn start(&self) -> Result<(), ServiceError> {
        if !self.core.transition_to(ServiceState::Starting) {
            return Ok(());
        }
        let core = Arc::clone(&self.core);
        let config = self.config.clone();
        let clock = self.clock.clone();
        let resources = self.resources.clone();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            match Self::index_metadata(&core, &config, &clock, &resources, &worker_cancel).await {
                Ok(()) => {
                    // single-message run is complete; stop ourselves
                    core.transition_to(ServiceState::Stopping);
                    core.transition_to(ServiceState::Stopped);
                }
                Err(IndexerError::Cancelled) => {}
                Err(e @ IndexerError::RunDiscoveryTimeout { .. }) => {
                    core.record_fatal(kind::RUN_NOT_FOUND, e.to_string(), "runs_failed");
                }
                Err(e @ IndexerError::MetadataTimeout { .. }) => {
                    core.record_fatal(kind::METADATA_TIMEOUT, e.to_string(), "metadata_failed");
                }
                Err(e) => {
                    core.record_fatal(kind::FATAL_WRITE, e.to_string(), "metadata_failed");
                }
            }
        });
        self.worker.attach(task, cancel);
        self.core.transition_to(ServiceState::Running);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        if !self.core.transition_to(ServiceState::Stopping) {
            return Ok(());
        }
        let result = self.worker.shutdown(self.core.name()).await;
        self.core.transition_to(ServiceState::Stopped);
        result
    }

    fn status(&self) -> ServiceStatus {
        self.core.status()
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
