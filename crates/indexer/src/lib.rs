// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! viv-indexer: the indexing services.
//!
//! Every indexer is a long-running service with a single worker task:
//! resolve the run, wait for the run's metadata when required, then
//! consume batch notifications from the topic, load the referenced
//! blobs from storage, and commit tick records to the run's schema.
//! At-least-once delivery from the topic is upgraded to exactly-once
//! effect by idempotent flushes and ack-after-durability.

pub mod discovery;
pub mod engine;
pub mod error;
pub mod indexers;
pub mod service;
pub mod sink;

pub use engine::{BatchEngine, EngineResources};
pub use error::IndexerError;
pub use indexers::dummy::DummyIndexer;
pub use indexers::environment::EnvironmentIndexer;
pub use indexers::metadata::MetadataIndexer;
pub use indexers::organism::OrganismIndexer;
pub use indexers::BatchIndexer;
pub use service::{Service, ServiceCore, ServiceError, STOP_GRACE};
pub use sink::{RunContext, TickSink};
