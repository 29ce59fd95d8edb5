// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment indexer: cell states into `environment_cells`.

use async_trait::async_trait;
use viv_core::{Clock, EnvironmentSpec, IndexerConfig, ResourceBinding, ServiceStatus, TickData};
use viv_db::EnvironmentWriter;

use super::{BatchIndexer, EngineResources};
use crate::error::IndexerError;
use crate::service::{Service, ServiceError};
use crate::sink::{RunContext, TickSink};

/// Sink translating flat indexes into coordinates and upserting cells.
#[derive(Default)]
pub struct EnvironmentSink {
    writer: Option<EnvironmentWriter>,
    environment: Option<EnvironmentSpec>,
}

impl EnvironmentSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickSink for EnvironmentSink {
    fn prepare(&mut self, ctx: &RunContext) -> Result<(), IndexerError> {
        let Some(meta) = &ctx.metadata else {
            return Err(IndexerError::FatalWrite(
                "environment indexer needs run metadata for the grid shape".to_string(),
            ));
        };
        meta.environment
            .validate()
            .map_err(|e| IndexerError::FatalWrite(e.to_string()))?;
        self.environment = Some(meta.environment.clone());
        self.writer = Some(ctx.scope.environment_writer());
        Ok(())
    }

    fn flush_ticks(&mut self, ticks: &[TickData]) -> Result<(), IndexerError> {
        let (Some(writer), Some(env)) = (&self.writer, &self.environment) else {
            return Err(IndexerError::FatalWrite("sink used before prepare".to_string()));
        };
        writer.write_cells(ticks, env)?;
        Ok(())
    }
}

/// Service wrapper: a [`BatchIndexer`] with an [`EnvironmentSink`].
pub struct EnvironmentIndexer<C: Clock>(BatchIndexer<C>);

impl<C: Clock> EnvironmentIndexer<C> {
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
            Box::new(|| Box::new(EnvironmentSink::new())),
        ))
    }
}

#[async_trait]
impl<C: Clock> Service for EnvironmentIndexer<C> {
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
#[path = "environment_tests.rs"]
mod tests;
