// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dummy indexer for pipeline smoke tests.
//!
//! Runs the full engine (discovery, metadata prerequisite, topic loop,
//! acks) but persists nothing, so a deployment can verify plumbing
//! end-to-end without touching the tick tables.

use async_trait::async_trait;
use viv_core::{Clock, IndexerConfig, ResourceBinding, ServiceStatus, TickData};

use super::{BatchIndexer, EngineResources};
use crate::error::IndexerError;
use crate::service::{Service, ServiceError};
use crate::sink::{RunContext, TickSink};

/// Sink that accepts every tick and writes nothing.
#[derive(Default)]
pub struct DummySink;

impl TickSink for DummySink {
    fn prepare(&mut self, _ctx: &RunContext) -> Result<(), IndexerError> {
        Ok(())
    }

    fn flush_ticks(&mut self, _ticks: &[TickData]) -> Result<(), IndexerError> {
        Ok(())
    }
}

/// Service wrapper: a [`BatchIndexer`] with a [`DummySink`].
pub struct DummyIndexer<C: Clock>(BatchIndexer<C>);

impl<C: Clock> DummyIndexer<C> {
    pub fn new(
        name: impl Into<String>,
        config: IndexerConfig,
        bindings: Vec<ResourceBinding>,
        resources: EngineResources<C>,
        clock: C,
    ) -> Self {
        Self(BatchIndexer::new(
            name,
            config,
            bindings,
            resources,
            clock,
            Box::new(|| Box::new(DummySink)),
        ))
    }
}

#[async_trait]
impl<C: Clock> Service for DummyIndexer<C> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn start(&self) -> Result<(), ServiceError> {
        self.0.start().await
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.0.stop().await
    }

    fn status(&self) -> ServiceStatus {
        self.0.status()
    }
}
