// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-scoped competing-consumer read capability.

use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use viv_core::{Clock, RunId};

use crate::backend::{TopicBackend, TopicError, DEFAULT_CLAIM_TIMEOUT_MS};
use crate::message::{AckToken, TopicMessage};

/// How often a blocked poll re-checks the backend.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Reader construction options, typically from binding options.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub consumer_group: String,
    pub claim_timeout_ms: u64,
}

impl ReaderOptions {
    pub fn group(consumer_group: impl Into<String>) -> Self {
        Self {
            consumer_group: consumer_group.into(),
            claim_timeout_ms: DEFAULT_CLAIM_TIMEOUT_MS,
        }
    }

    pub fn claim_timeout_ms(mut self, ms: u64) -> Self {
        self.claim_timeout_ms = ms;
        self
    }
}

/// Typed consume handle bound to one topic, run partition, and group.
///
/// Each reader instance is one competing consumer: polls race against
/// other members of the same group, and every claimed message is
/// reserved to this consumer until acked or the lease expires.
pub struct TopicReader<T, C: Clock> {
    backend: Arc<TopicBackend<C>>,
    topic: String,
    run_id: RunId,
    consumer_group: String,
    consumer_id: String,
    claim_timeout_ms: u64,
    _payload: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned, C: Clock> TopicReader<T, C> {
    pub(crate) fn new(
        backend: Arc<TopicBackend<C>>,
        topic: String,
        run_id: RunId,
        options: ReaderOptions,
    ) -> Self {
        Self {
            backend,
            topic,
            run_id,
            consumer_group: options.consumer_group,
            consumer_id: uuid::Uuid::new_v4().to_string(),
            claim_timeout_ms: options.claim_timeout_ms,
            _payload: PhantomData,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }

    /// Claim the next message without blocking.
    pub fn try_poll(&self) -> Result<Option<TopicMessage<T>>, TopicError> {
        let raw = self.backend.claim_next(
            &self.topic,
            &self.run_id,
            &self.consumer_group,
            &self.consumer_id,
            self.claim_timeout_ms,
        )?;
        let Some(raw) = raw else { return Ok(None) };
        let payload: T = serde_json::from_slice(&raw.payload)?;
        Ok(Some(TopicMessage {
            payload,
            message_id: raw.message_id,
            enqueue_time_ms: raw.enqueue_time_ms,
            consumer_id: self.consumer_id.clone(),
            attempts: raw.attempts,
            ack_token: AckToken {
                topic: self.topic.clone(),
                consumer_group: self.consumer_group.clone(),
                message_id: raw.message_id,
            },
        }))
    }

    /// Block up to `timeout` for the next message; `None` on timeout.
    ///
    /// Cancel-safe: dropping the future between backend checks releases
    /// nothing (no claim was made) or leaves an already-claimed message
    /// to its lease.
    pub async fn poll(&self, timeout: Duration) -> Result<Option<TopicMessage<T>>, TopicError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // yield first so a hot partition cannot starve sibling
            // consumers on the same runtime
            tokio::task::yield_now().await;
            if let Some(msg) = self.try_poll()? {
                return Ok(Some(msg));
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Mark a delivery consumed for this group.
    pub fn ack(&self, token: &AckToken) -> Result<bool, TopicError> {
        self.backend.ack(token)
    }

    /// Messages in this partition not yet acked by this group.
    pub fn unacked(&self) -> Result<u64, TopicError> {
        self.backend
            .unacked_count(&self.topic, &self.run_id, &self.consumer_group)
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
