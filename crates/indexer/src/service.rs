// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service trait and the shared lifecycle/status core.
//!
//! The core serializes state transitions behind one mutex; metric and
//! error-ring writes happen outside it. Fatal errors bump a `*_failed`
//! counter and flip the service to ERROR but stay out of the
//! user-visible ring, which is reserved for transient errors.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use viv_core::{
    ErrorRing, Metrics, OperationalError, ResourceBinding, ServiceState, ServiceStatus,
};

/// How long `stop()` waits for the worker before abandoning it.
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// Errors from service lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service {name} has no binding for required port {port}")]
    BindingMissing { name: String, port: String },
    #[error("worker for {name} did not stop within the grace period")]
    StopTimeout { name: String },
}

/// Uniform start/stop/status surface over every pipeline service.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Begin the worker. No-op unless the service is STOPPED.
    async fn start(&self) -> Result<(), ServiceError>;

    /// Signal the worker, final-drain, and stop. No-op when already
    /// STOPPED or ERROR.
    async fn stop(&self) -> Result<(), ServiceError>;

    fn status(&self) -> ServiceStatus;
}

/// State, metrics, and error bookkeeping shared by every service.
pub struct ServiceCore {
    name: String,
    state: Mutex<ServiceState>,
    metrics: Metrics,
    errors: ErrorRing,
    fatal: AtomicBool,
    bindings: Vec<ResourceBinding>,
}

impl ServiceCore {
    pub fn new(name: impl Into<String>, bindings: Vec<ResourceBinding>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ServiceState::Stopped),
            metrics: Metrics::new(),
            errors: ErrorRing::new(),
            fatal: AtomicBool::new(false),
            bindings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn state(&self) -> ServiceState {
        *self.state.lock()
    }

    /// Attempt a state transition; false when the state machine forbids it.
    pub fn transition_to(&self, next: ServiceState) -> bool {
        let mut state = self.state.lock();
        if !state.can_transition_to(next) {
            return false;
        }
        *state = next;
        true
    }

    /// `RUNNING` or `STOPPED` with no fatal error recorded.
    pub fn is_healthy(&self) -> bool {
        let state = self.state();
        matches!(state, ServiceState::Running | ServiceState::Stopped)
            && !self.fatal.load(Ordering::Relaxed)
    }

    /// Record a transient, recoverable error in the ring.
    pub fn record_error(&self, error_type: &str, message: impl Into<String>, timestamp_ms: u64) {
        let message = message.into();
        warn!(service = %self.name, kind = error_type, %message, "operational error");
        self.errors.push(OperationalError {
            error_type: error_type.to_string(),
            message,
            timestamp_ms,
        });
    }

    /// Record a fatal error: bump `failed_metric`, log, flip to ERROR.
    ///
    /// Deliberately does not touch the error ring.
    pub fn record_fatal(&self, error_type: &str, message: impl Into<String>, failed_metric: &str) {
        let message = message.into();
        error!(service = %self.name, kind = error_type, %message, "fatal error");
        self.metrics.increment(failed_metric);
        self.fatal.store(true, Ordering::Relaxed);
        let mut state = self.state.lock();
        if state.can_transition_to(ServiceState::Error) {
            *state = ServiceState::Error;
        }
    }

    /// Snapshot for status endpoints; copies, never aliases.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            state: self.state(),
            healthy: self.is_healthy(),
            metrics: self.metrics.snapshot(),
            errors: self.errors.snapshot(),
            bindings: self.bindings.clone(),
        }
    }
}

/// Cancellation token plus join handle for a service's worker task.
#[derive(Default)]
pub struct WorkerHandle {
    cancel: Mutex<CancellationToken>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly spawned worker and its cancel token.
    pub fn attach(&self, task: JoinHandle<()>, cancel: CancellationToken) {
        *self.cancel.lock() = cancel;
        *self.task.lock() = Some(task);
    }

    /// Signal the worker and wait out the grace period.
    ///
    /// The worker is abandoned (aborted) if it ignores the signal.
    pub async fn shutdown(&self, name: &str) -> Result<(), ServiceError> {
        self.cancel.lock().cancel();
        let task = self.task.lock().take();
        if let Some(mut task) = task {
            if tokio::time::timeout(STOP_GRACE, &mut task).await.is_err() {
                warn!(service = name, "worker ignored stop signal, aborting");
                task.abort();
                return Err(ServiceError::StopTimeout { name: name.to_string() });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
