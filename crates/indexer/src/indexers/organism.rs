// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Organism indexer: static rows plus per-tick runtime states.

use async_trait::async_trait;
use viv_core::{Clock, IndexerConfig, ResourceBinding, ServiceStatus, TickData};
use viv_db::OrganismWriter;

use super::{BatchIndexer, EngineResources};
use crate::error::IndexerError;
use crate::service::{Service, ServiceError};
use crate::sink::{RunContext, TickSink};

/// Sink merging organism identity and upserting runtime states.
pub struct OrganismSink {
    writer: Option<OrganismWriter>,
    compress_state: bool,
}

impl OrganismSink {
    pub fn new(compress_state: bool) -> Self {
        Self { writer: None, compress_state }
    }
}

impl TickSink for OrganismSink {
    fn prepare(&mut self, ctx: &RunContext) -> Result<(), IndexerError> {
        self.writer = Some(ctx.scope.organism_writer(self.compress_state));
        Ok(())
    }

    fn flush_ticks(&mut self, ticks: &[TickData]) -> Result<(), IndexerError> {
        let Some(writer) = &self.writer else {
            return Err(IndexerError::FatalWrite("sink used before prepare".to_string()));
        };
        writer.write_states(ticks)?;
        Ok(())
    }
}

/// Service wrapper: a [`BatchIndexer`] with an [`OrganismSink`].
pub struct OrganismIndexer<C: Clock>(BatchIndexer<C>);

impl<C: Clock> OrganismIndexer<C> {
    pub fn new(
        name: impl Into<String>,
        config: IndexerConfig,
        bindings: Vec<ResourceBinding>,
        resources: EngineResources<C>,
        clock: C,
    ) -> Self {
        let compress_state = config.compress_state;
        Self(BatchIndexer::new(
            name,
            config,
            bindings,
            resources,
            clock,
            Box::new(move || Box::new(OrganismSink::new(compress_state))),
        ))
    }
}

#[async_trait]
impl<C: Clock> Service for OrganismIndexer<C> {
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

#[cfg(test)]
#[path = "organism_tests.rs"]
mod tests;
