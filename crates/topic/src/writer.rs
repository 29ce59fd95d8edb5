// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-scoped topic write capability.

use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use viv_core::{Clock, RunId};

use crate::backend::{TopicBackend, TopicError};

/// Typed publish handle bound to one topic and run partition.
pub struct TopicWriter<T, C: Clock> {
    backend: Arc<TopicBackend<C>>,
    topic: String,
    run_id: RunId,
    _payload: PhantomData<fn(T)>,
}

impl<T, C: Clock> Clone for TopicWriter<T, C> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            topic: self.topic.clone(),
            run_id: self.run_id.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T: Serialize, C: Clock> TopicWriter<T, C> {
    pub(crate) fn new(backend: Arc<TopicBackend<C>>, topic: String, run_id: RunId) -> Self {
        Self { backend, topic, run_id, _payload: PhantomData }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// At-least-once publish; returns after the message is durable.
    pub fn send(&self, payload: &T) -> Result<i64, TopicError> {
        let bytes = serde_json::to_vec(payload)?;
        self.backend.send_raw(&self.topic, &self.run_id, &bytes)
    }
}
