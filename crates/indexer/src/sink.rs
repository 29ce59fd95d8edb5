// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialization hook for the batch engine.
//!
//! A sink is the narrow surface a specialization implements: prepare
//! run-scoped writers once the run is known, then persist slices of
//! ticks. The engine owns buffering, ack bookkeeping, and retries; the
//! sink owns what a tick means for its aspect.

use viv_core::{RunId, SimulationMetadata, TickData};
use viv_db::RunScope;

use crate::error::IndexerError;

/// Everything a sink gets to know about the resolved run.
pub struct RunContext {
    pub run_id: RunId,
    pub scope: RunScope,
    /// Present iff the sink declared the metadata prerequisite.
    pub metadata: Option<SimulationMetadata>,
}

/// Aspect-specific persistence behind the batch engine.
pub trait TickSink: Send + 'static {
    /// Whether the engine must wait for the run's metadata row before
    /// any tick is processed.
    fn requires_metadata(&self) -> bool {
        true
    }

    /// Idempotent writer/table setup in the run's schema. Failures
    /// here are fatal for the service.
    fn prepare(&mut self, ctx: &RunContext) -> Result<(), IndexerError>;

    /// Persist every input tick atomically, or fail leaving the
    /// database untouched. Repeats of the same tick key must not
    /// produce duplicates. Empty input is a no-op.
    fn flush_ticks(&mut self, ticks: &[TickData]) -> Result<(), IndexerError>;
}
