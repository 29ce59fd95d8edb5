// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivered message shape and ack tokens.

/// Opaque handle identifying one delivery for acknowledgement.
///
/// Carries everything the backend needs to mark the message consumed
/// for the polling consumer's group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AckToken {
    pub(crate) topic: String,
    pub(crate) consumer_group: String,
    pub(crate) message_id: i64,
}

impl AckToken {
    /// Build a token from its coordinates. Normally tokens arrive on
    /// delivered messages; constructing one by hand is for tests and
    /// requeue tooling.
    pub fn new(
        topic: impl Into<String>,
        consumer_group: impl Into<String>,
        message_id: i64,
    ) -> Self {
        Self {
            topic: topic.into(),
            consumer_group: consumer_group.into(),
            message_id,
        }
    }

    /// Server-assigned message id, for logging.
    pub fn message_id(&self) -> i64 {
        self.message_id
    }
}

/// One message delivered to a consumer.
#[derive(Debug, Clone)]
pub struct TopicMessage<T> {
    pub payload: T,
    pub message_id: i64,
    pub enqueue_time_ms: u64,
    /// Consumer instance the claim was issued to.
    pub consumer_id: String,
    /// Delivery attempts for this group, including this one.
    pub attempts: u32,
    pub ack_token: AckToken,
}
