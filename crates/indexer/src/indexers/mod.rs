// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The indexer services.
//!
//! [`BatchIndexer`] is the generic engine-backed service; the
//! environment, organism, and dummy indexers are thin specializations
//! that plug a sink into it. The metadata indexer has its own
//! single-message lifecycle and lives in [`metadata`].

pub mod dummy;
pub mod environment;
pub mod metadata;
pub mod organism;

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use viv_core::{Clock, IndexerConfig, ResourceBinding, ServiceState, ServiceStatus};

use crate::engine::{BatchEngine, EngineResources};
use crate::service::{Service, ServiceCore, ServiceError, WorkerHandle};
use crate::sink::TickSink;

/// Builds a fresh sink for each worker start.
pub type SinkFactory = Box<dyn Fn() -> Box<dyn TickSink> + Send + Sync>;

/// Engine-backed indexer service: one worker task running a
/// [`BatchEngine`] over a sink from the factory.
pub struct BatchIndexer<C: Clock> {
    core: Arc<ServiceCore>,
    config: IndexerConfig,
    clock: C,
    resources: EngineResources<C>,
    make_sink: SinkFactory,
    worker: WorkerHandle,
}

impl<C: Clock> BatchIndexer<C> {
    pub fn new(
        name: impl Into<String>,
        config: IndexerConfig,
        bindings: Vec<ResourceBinding>,
        resources: EngineResources<C>,
        clock: C,
        make_sink: SinkFactory,
    ) -> Self {
        Self {
            core: Arc::new(ServiceCore::new(name, bindings)),
            config,
            clock,
            resources,
            make_sink,
            worker: WorkerHandle::new(),
        }
    }

    /// Shared core, for status plumbing in tests.
    pub fn core(&self) -> &Arc<ServiceCore> {
        &self.core
    }
}

#[async_trait]
impl<C: Clock> Service for BatchIndexer<C> {
    fn name(&self) -> &str {
        self.core.name()
    }

    async fn start(&self) -> Result<(), ServiceError> {
        if !self.core.transition_to(ServiceState::Starting) {
            return Ok(());
        }
        let engine = BatchEngine::new(
            Arc::clone(&self.core),
            self.config.clone(),
            self.clock.clone(),
            self.resources.clone(),
            (self.make_sink)(),
        );
        let cancel = CancellationToken::new();
        self.worker.attach(tokio::spawn(engine.run(cancel.clone())), cancel);
        self.core.transition_to(ServiceState::Running);
        info!(service = self.core.name(), "indexer started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        if !self.core.transition_to(ServiceState::Stopping) {
            return Ok(());
        }
        let result = self.worker.shutdown(self.core.name()).await;
        self.core.transition_to(ServiceState::Stopped);
        info!(service = self.core.name(), "indexer stopped");
        result
    }

    fn status(&self) -> ServiceStatus {
        self.core.status()
    }
}
