// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run metadata: written once per run, before any tick data is queryable.

use crate::run::RunId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from metadata validation.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("environment dimensions mismatch: dimensions={dimensions}, shape has {shape_len}, toroidal has {toroidal_len}")]
    DimensionMismatch {
        dimensions: usize,
        shape_len: usize,
        toroidal_len: usize,
    },
    #[error("flat index {index} out of range for shape {shape:?}")]
    IndexOutOfRange { index: i64, shape: Vec<i64> },
}

/// Geometry of the simulated environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    pub dimensions: usize,
    /// Extent per dimension, outermost first.
    pub shape: Vec<i64>,
    /// Whether each dimension wraps.
    pub toroidal: Vec<bool>,
}

impl EnvironmentSpec {
    pub fn new(shape: Vec<i64>, toroidal: Vec<bool>) -> Self {
        Self { dimensions: shape.len(), shape, toroidal }
    }

    /// Check the three parallel fields agree.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if self.dimensions != self.shape.len() || self.dimensions != self.toroidal.len() {
            return Err(MetadataError::DimensionMismatch {
                dimensions: self.dimensions,
                shape_len: self.shape.len(),
                toroidal_len: self.toroidal.len(),
            });
        }
        Ok(())
    }

    /// Total cell count of the grid.
    pub fn cell_count(&self) -> i64 {
        self.shape.iter().product()
    }

    /// Translate a row-major flat index into per-dimension coordinates.
    ///
    /// The last dimension varies fastest. Errors if the index falls
    /// outside the grid.
    pub fn coords_from_flat(&self, flat_index: i64) -> Result<Vec<i64>, MetadataError> {
        if flat_index < 0 || flat_index >= self.cell_count() {
            return Err(MetadataError::IndexOutOfRange {
                index: flat_index,
                shape: self.shape.clone(),
            });
        }
        let mut coords = vec![0i64; self.shape.len()];
        let mut rest = flat_index;
        for (i, extent) in self.shape.iter().enumerate().rev() {
            coords[i] = rest % extent;
            rest /= extent;
        }
        Ok(coords)
    }
}

/// Static description of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetadata {
    pub simulation_run_id: RunId,
    pub start_time_ms: u64,
    pub initial_seed: i64,
    /// Ticks between captures.
    pub sampling_interval: u64,
    pub environment: EnvironmentSpec,
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
