// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed topic state.
//!
//! Two tables: `messages` is the append-only log (one row per send,
//! monotone `message_id` gives within-partition FIFO); `deliveries`
//! tracks per-consumer-group claim/ack state. A message is eligible for
//! a group when it has no delivery row, or its claim lease has expired
//! without an ack. The eligibility check at claim time doubles as the
//! redelivery scan.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use viv_core::{Clock, RunId};

use crate::message::AckToken;
use crate::reader::{ReaderOptions, TopicReader};
use crate::writer::TopicWriter;

/// Lease length applied when a reader does not configure one.
pub const DEFAULT_CLAIM_TIMEOUT_MS: u64 = 30_000;

/// Errors from topic operations.
#[derive(Debug, Error)]
pub enum TopicError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("payload serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    message_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    topic           TEXT NOT NULL,
    run_id          TEXT NOT NULL,
    payload         BLOB NOT NULL,
    enqueue_time_ms INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_partition
    ON messages(topic, run_id, message_id);

CREATE TABLE IF NOT EXISTS deliveries (
    topic             TEXT NOT NULL,
    consumer_group    TEXT NOT NULL,
    message_id        INTEGER NOT NULL,
    state             TEXT NOT NULL,
    consumer_id       TEXT,
    lease_deadline_ms INTEGER NOT NULL DEFAULT 0,
    attempts          INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (topic, consumer_group, message_id)
);
";

/// A claimed message before payload decoding.
pub(crate) struct RawMessage {
    pub message_id: i64,
    pub payload: Vec<u8>,
    pub enqueue_time_ms: u64,
    pub attempts: u32,
}

/// Shared topic store. One per backing database file.
pub struct TopicBackend<C: Clock> {
    conn: Mutex<Connection>,
    clock: C,
}

impl<C: Clock> TopicBackend<C> {
    /// Open (creating if needed) the topic database at `path`.
    pub fn open(path: impl AsRef<Path>, clock: C) -> Result<Self, TopicError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn), clock })
    }

    /// In-memory backend for tests; state dies with the value.
    pub fn in_memory(clock: C) -> Result<Self, TopicError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn), clock })
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }

    /// Write capability scoped to one topic and run partition.
    pub fn writer<T: Serialize>(
        self: &Arc<Self>,
        topic: impl Into<String>,
        run_id: RunId,
    ) -> TopicWriter<T, C> {
        TopicWriter::new(Arc::clone(self), topic.into(), run_id)
    }

    /// Read capability scoped to one topic, run partition, and group.
    pub fn reader<T: DeserializeOwned>(
        self: &Arc<Self>,
        topic: impl Into<String>,
        run_id: RunId,
        options: ReaderOptions,
    ) -> TopicReader<T, C> {
        TopicReader::new(Arc::clone(self), topic.into(), run_id, options)
    }

    /// Durably append a message; returns its server-assigned id.
    pub(crate) fn send_raw(
        &self,
        topic: &str,
        run_id: &RunId,
        payload: &[u8],
    ) -> Result<i64, TopicError> {
        let now = self.clock.epoch_ms();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (topic, run_id, payload, enqueue_time_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![topic, run_id.as_str(), payload, now as i64],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Claim the oldest eligible message in the partition, if any.
    ///
    /// Eligible: never delivered to this group, or claimed with an
    /// expired lease and not acked. The claim records the consumer and
    /// bumps the attempt counter atomically.
    pub(crate) fn claim_next(
        &self,
        topic: &str,
        run_id: &RunId,
        consumer_group: &str,
        consumer_id: &str,
        claim_timeout_ms: u64,
    ) -> Result<Option<RawMessage>, TopicError> {
        let now = self.clock.epoch_ms() as i64;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let candidate = tx
            .query_row(
                "SELECT m.message_id, m.payload, m.enqueue_time_ms,
                        COALESCE(d.attempts, 0)
                 FROM messages m
                 LEFT JOIN deliveries d
                   ON d.topic = m.topic
                  AND d.consumer_group = ?3
                  AND d.message_id = m.message_id
                 WHERE m.topic = ?1
                   AND m.run_id = ?2
                   AND (d.message_id IS NULL
                        OR (d.state = 'claimed' AND d.lease_deadline_ms <= ?4))
                 ORDER BY m.message_id
                 LIMIT 1",
                params![topic, run_id.as_str(), consumer_group, now],
                |row| {
                    Ok(RawMessage {
                        message_id: row.get(0)?,
                        payload: row.get(1)?,
                        enqueue_time_ms: row.get::<_, i64>(2)? as u64,
                        attempts: row.get::<_, u32>(3)?,
                    })
                },
            )
            .optional()?;

        let Some(mut msg) = candidate else {
            tx.commit()?;
            return Ok(None);
        };

        let deadline = now + claim_timeout_ms as i64;
        tx.execute(
            "INSERT INTO deliveries
                 (topic, consumer_group, message_id, state, consumer_id,
                  lease_deadline_ms, attempts)
             VALUES (?1, ?2, ?3, 'claimed', ?4, ?5, ?6)
             ON CONFLICT (topic, consumer_group, message_id) DO UPDATE SET
                 state = 'claimed',
                 consumer_id = excluded.consumer_id,
                 lease_deadline_ms = excluded.lease_deadline_ms,
                 attempts = excluded.attempts",
            params![
                topic,
                consumer_group,
                msg.message_id,
                consumer_id,
                deadline,
                msg.attempts + 1
            ],
        )?;
        tx.commit()?;

        msg.attempts += 1;
        debug!(
            topic,
            run = run_id.as_str(),
            group = consumer_group,
            message_id = msg.message_id,
            attempts = msg.attempts,
            "message claimed"
        );
        Ok(Some(msg))
    }

    /// Mark a delivery consumed for its group.
    ///
    /// Returns false when the row was already acked (duplicate ack after
    /// redelivery); that is not an error.
    pub fn ack(&self, token: &AckToken) -> Result<bool, TopicError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE deliveries SET state = 'acked'
             WHERE topic = ?1 AND consumer_group = ?2 AND message_id = ?3
               AND state != 'acked'",
            params![token.topic, token.consumer_group, token.message_id],
        )?;
        Ok(changed > 0)
    }

    /// Messages in the partition (any delivery state).
    pub fn message_count(&self, topic: &str, run_id: &RunId) -> Result<u64, TopicError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE topic = ?1 AND run_id = ?2",
            params![topic, run_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Messages in the partition not yet acked by the group.
    pub fn unacked_count(
        &self,
        topic: &str,
        run_id: &RunId,
        consumer_group: &str,
    ) -> Result<u64, TopicError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*)
             FROM messages m
             LEFT JOIN deliveries d
               ON d.topic = m.topic
              AND d.consumer_group = ?3
              AND d.message_id = m.message_id
             WHERE m.topic = ?1 AND m.run_id = ?2
               AND (d.state IS NULL OR d.state != 'acked')",
            params![topic, run_id.as_str(), consumer_group],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// Claimed-and-unexpired messages for the group.
    pub fn in_flight_count(
        &self,
        topic: &str,
        run_id: &RunId,
        consumer_group: &str,
    ) -> Result<u64, TopicError> {
        let now = self.clock.epoch_ms() as i64;
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*)
             FROM messages m
             JOIN deliveries d
               ON d.topic = m.topic
              AND d.consumer_group = ?3
              AND d.message_id = m.message_id
             WHERE m.topic = ?1 AND m.run_id = ?2
               AND d.state = 'claimed' AND d.lease_deadline_ms > ?4",
            params![topic, run_id.as_str(), consumer_group, now],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
