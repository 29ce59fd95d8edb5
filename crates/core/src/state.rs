// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service lifecycle states and the reported status shape.

use crate::binding::ResourceBinding;
use crate::error::OperationalError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of a service.
///
/// `Stopped → Starting → Running → Stopping → Stopped`; `Error` is
/// terminal and reachable from `Starting` or `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

impl ServiceState {
    /// Whether the state machine permits moving to `next` from here.
    pub fn can_transition_to(self, next: ServiceState) -> bool {
        use ServiceState::*;
        matches!(
            (self, next),
            (Stopped, Starting)
                | (Starting, Running)
                | (Starting, Error)
                | (Running, Stopping)
                | (Running, Error)
                | (Stopping, Stopped)
        )
    }

    /// No further transitions leave this state.
    pub fn is_terminal(self) -> bool {
        self == ServiceState::Error
    }

    /// Ordering for pipeline roll-up: higher severity wins.
    pub fn severity(self) -> u8 {
        match self {
            ServiceState::Running => 0,
            ServiceState::Stopped => 1,
            ServiceState::Starting => 2,
            ServiceState::Stopping => 3,
            ServiceState::Error => 4,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Stopped => "STOPPED",
            ServiceState::Starting => "STARTING",
            ServiceState::Running => "RUNNING",
            ServiceState::Stopping => "STOPPING",
            ServiceState::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

/// Point-in-time status report for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub state: ServiceState,
    pub healthy: bool,
    pub metrics: BTreeMap<String, i64>,
    /// Recent non-fatal errors, oldest first.
    pub errors: Vec<OperationalError>,
    pub bindings: Vec<ResourceBinding>,
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
