// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch-indexer engine.
//!
//! One worker task per indexer: resolve the run, wait for metadata when
//! the sink requires it, prepare the sink, then loop on the topic.
//! Ticks buffer across batches; a flush drains the buffer front, and
//! every message whose ticks are all durable is acked. Nothing is ever
//! acked on an error path, so an unacked message redelivers after its
//! claim lease and idempotent flushes absorb the repeat.

mod buffer;
mod dlq;
mod ledger;
mod metadata_gate;

pub use buffer::TickBuffer;
pub use dlq::{DeadLetter, FailureDisposition};
pub use ledger::{AckLedger, PendingAck};
pub use metadata_gate::wait_for_metadata;

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use viv_core::{kind, BatchInfo, Clock, IndexerConfig, RunId, TickData};
use viv_db::Database;
use viv_storage::StorageReader;
use viv_topic::{dlq_topic, ReaderOptions, TopicBackend, TopicMessage, TopicReader};

use crate::discovery::discover_run_id;
use crate::error::IndexerError;
use crate::service::ServiceCore;
use crate::sink::{RunContext, TickSink};

/// Shared backends an engine binds to its run at startup.
pub struct EngineResources<C: Clock> {
    pub topic: Arc<TopicBackend<C>>,
    /// Topic carrying `BatchInfo` notifications.
    pub topic_name: String,
    pub reader_options: ReaderOptions,
    pub storage: StorageReader<C>,
    pub database: Arc<Database<C>>,
}

impl<C: Clock> Clone for EngineResources<C> {
    fn clone(&self) -> Self {
        Self {
            topic: Arc::clone(&self.topic),
            topic_name: self.topic_name.clone(),
            reader_options: self.reader_options.clone(),
            storage: self.storage.clone(),
            database: Arc::clone(&self.database),
        }
    }
}

/// The engine owned by one indexer worker.
pub struct BatchEngine<C: Clock> {
    core: Arc<ServiceCore>,
    config: IndexerConfig,
    clock: C,
    resources: EngineResources<C>,
    sink: Box<dyn TickSink>,
    buffer: TickBuffer,
    ledger: AckLedger,
    /// `insert_batch_size`, or 1 when buffering is absent (tick-by-tick).
    flush_threshold: usize,
    last_flush_at: Instant,
}

impl<C: Clock> BatchEngine<C> {
    pub fn new(
        core: Arc<ServiceCore>,
        config: IndexerConfig,
        clock: C,
        resources: EngineResources<C>,
        sink: Box<dyn TickSink>,
    ) -> Self {
        let flush_threshold = config.insert_batch_size.unwrap_or(1).max(1);
        let last_flush_at = clock.now();
        Self {
            core,
            config,
            clock,
            resources,
            sink,
            buffer: TickBuffer::new(),
            ledger: AckLedger::new(),
            flush_threshold,
            last_flush_at,
        }
    }

    /// Worker entry point. Consumes the engine; terminal errors land in
    /// the service core as fatal records.
    pub async fn run(mut self, cancel: CancellationToken) {
        match self.run_inner(&cancel).await {
            Ok(()) | Err(IndexerError::Cancelled) => {}
            Err(e @ IndexerError::RunDiscoveryTimeout { .. }) => {
                self.core.record_fatal(kind::RUN_NOT_FOUND, e.to_string(), "runs_failed");
            }
            Err(e @ IndexerError::MetadataTimeout { .. }) => {
                self.core
                    .record_fatal(kind::METADATA_TIMEOUT, e.to_string(), "metadata_failed");
            }
            Err(e) => {
                self.core.record_fatal(kind::FATAL_WRITE, e.to_string(), "writes_failed");
            }
        }
    }

    async fn run_inner(&mut self, cancel: &CancellationToken) -> Result<(), IndexerError> {
        let run_id =
            discover_run_id(&self.config, &self.resources.storage, &self.clock, cancel).await?;
        let scope = self.resources.database.run_scope(&run_id)?;

        let metadata = if self.sink.requires_metadata() {
            Some(
                wait_for_metadata(&scope.metadata_reader(), &self.config, &run_id, cancel)
                    .await?,
            )
        } else {
            None
        };

        let ctx = RunContext { run_id: run_id.clone(), scope, metadata };
        self.sink.prepare(&ctx).map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                IndexerError::FatalWrite(e.to_string())
            }
        })?;
        self.core.metrics().increment("runs_processed");
        info!(
            service = self.core.name(),
            run = run_id.as_str(),
            topic = %self.resources.topic_name,
            "indexing run"
        );

        let reader = self.resources.topic.reader::<BatchInfo>(
            self.resources.topic_name.clone(),
            run_id.clone(),
            self.resources.reader_options.clone(),
        );
        let mut dlq = DeadLetter::new(
            self.resources
                .topic
                .writer::<BatchInfo>(dlq_topic(&self.resources.topic_name), run_id.clone()),
            self.config.max_retries,
        );

        loop {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                polled = reader.poll(self.config.topic_poll_timeout()) => polled,
            };
            match polled {
                Ok(Some(msg)) => self.handle_message(&reader, &mut dlq, msg)?,
                Ok(None) => self.check_buffer_age(&reader, &mut dlq)?,
                Err(e) => {
                    // the backend is shared; report and keep polling
                    self.core.record_error(
                        kind::BATCH_PROCESSING_FAILED,
                        format!("topic poll failed: {e}"),
                        self.clock.epoch_ms(),
                    );
                }
            }
        }

        self.final_drain(&reader, &mut dlq);
        Ok(())
    }

    /// Process one delivered notification.
    fn handle_message(
        &mut self,
        reader: &TopicReader<BatchInfo, C>,
        dlq: &mut DeadLetter<C>,
        msg: TopicMessage<BatchInfo>,
    ) -> Result<(), IndexerError> {
        self.core.metrics().increment("polled_messages");
        let info = msg.payload.clone();
        debug!(
            service = self.core.name(),
            path = %info.storage_path,
            attempts = msg.attempts,
            "batch notification received"
        );

        if let Err(reason) = validate_info(&info, reader.run_id()) {
            self.reject_batch(reader, dlq, &info, &msg.ack_token, &reason);
            return Ok(());
        }

        let ticks = match self.resources.storage.read_batch(&info.storage_path) {
            Ok(ticks) => ticks,
            Err(e) => {
                self.batch_failure(reader, dlq, &info, &msg.ack_token, &e.to_string());
                return Ok(());
            }
        };

        if let Err(reason) = validate_ticks(&info, &ticks, reader.run_id()) {
            self.reject_batch(reader, dlq, &info, &msg.ack_token, &reason);
            return Ok(());
        }

        if ticks.is_empty() {
            // nothing to persist; the notification itself is complete
            self.ack_one(reader, dlq, &info, &msg.ack_token);
            return Ok(());
        }

        self.ledger.push(info, msg.ack_token, ticks.len());
        for tick in ticks {
            self.buffer.push(tick, self.clock.now());
            if self.buffer.len() >= self.flush_threshold
                && !self.flush_and_ack(self.flush_threshold, reader, dlq)?
            {
                // flush failed and took this message's ledger entry with
                // it; the rest of its ticks come back via redelivery
                break;
            }
        }
        self.update_gauges();
        Ok(())
    }

    /// Timeout tick: flush the whole buffer once it is old enough.
    fn check_buffer_age(
        &mut self,
        reader: &TopicReader<BatchInfo, C>,
        dlq: &mut DeadLetter<C>,
    ) -> Result<(), IndexerError> {
        let now = self.clock.now();
        self.core.metrics().set(
            "last_flush_age_ms",
            now.saturating_duration_since(self.last_flush_at).as_millis() as i64,
        );
        if let Some(age) = self.buffer.age(now) {
            if age >= self.config.flush_timeout() {
                debug!(
                    service = self.core.name(),
                    buffered = self.buffer.len(),
                    "flushing on buffer age"
                );
                self.flush_and_ack(self.buffer.len(), reader, dlq)?;
            }
        }
        Ok(())
    }

    /// Drain `n` ticks through the sink; ack every message the flush
    /// completed. `Ok(false)` reports a non-fatal flush failure (buffer
    /// and ledger were reset); errors are fatal sink failures only.
    fn flush_and_ack(
        &mut self,
        n: usize,
        reader: &TopicReader<BatchInfo, C>,
        dlq: &mut DeadLetter<C>,
    ) -> Result<bool, IndexerError> {
        let ticks = self.buffer.drain(n);
        if ticks.is_empty() {
            return Ok(true);
        }

        match self.sink.flush_ticks(&ticks) {
            Ok(()) => {
                let now = self.clock.now();
                self.core.metrics().increment("flush_count");
                self.core.metrics().add("ticks_processed", ticks.len() as i64);
                self.core.metrics().set(
                    "last_flush_age_ms",
                    now.saturating_duration_since(self.last_flush_at).as_millis() as i64,
                );
                self.last_flush_at = now;

                for entry in self.ledger.complete(ticks.len()) {
                    self.ack_one(reader, dlq, &entry.info, &entry.token);
                }
                self.update_gauges();
                Ok(true)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                // the flush rolled back; everything pending must come
                // around again through redelivery or the DLQ
                self.core.record_error(
                    kind::BATCH_PROCESSING_FAILED,
                    format!("flush of {} ticks failed: {e}", ticks.len()),
                    self.clock.epoch_ms(),
                );
                for entry in self.ledger.drain_all() {
                    self.fail_entry(reader, dlq, &entry.info, &entry.token);
                }
                self.buffer.clear();
                self.update_gauges();
                Ok(false)
            }
        }
    }

    /// `stop()`-time drain: flush the remainder and ack what completes.
    fn final_drain(&mut self, reader: &TopicReader<BatchInfo, C>, dlq: &mut DeadLetter<C>) {
        if self.buffer.is_empty() {
            self.update_gauges();
            return;
        }
        debug!(
            service = self.core.name(),
            buffered = self.buffer.len(),
            pending = self.ledger.len(),
            "final drain"
        );
        if let Err(e) = self.flush_and_ack(self.buffer.len(), reader, dlq) {
            // fatal during shutdown: give up the remainder, it stays unacked
            warn!(service = self.core.name(), error = %e, "final drain failed");
            self.buffer.clear();
            self.ledger.drain_all();
            self.update_gauges();
        }
    }

    /// Ack one fully-processed message.
    fn ack_one(
        &self,
        reader: &TopicReader<BatchInfo, C>,
        dlq: &mut DeadLetter<C>,
        info: &BatchInfo,
        token: &viv_topic::AckToken,
    ) {
        dlq.note_success(info);
        match reader.ack(token) {
            Ok(_) => {
                self.core.metrics().increment("batches_processed");
            }
            Err(e) => {
                // the message will redeliver; the idempotent flush
                // absorbs the repeat
                self.core.record_error(
                    kind::BATCH_PROCESSING_FAILED,
                    format!("ack of {} failed: {e}", info.storage_path),
                    self.clock.epoch_ms(),
                );
            }
        }
    }

    /// Count a failure against the retry budget; dead-letter and ack
    /// once the budget is spent.
    fn fail_entry(
        &self,
        reader: &TopicReader<BatchInfo, C>,
        dlq: &mut DeadLetter<C>,
        info: &BatchInfo,
        token: &viv_topic::AckToken,
    ) {
        match dlq.note_failure(info) {
            Ok(FailureDisposition::Retry { failures }) => {
                self.core.metrics().increment("batches_failed");
                self.core.metrics().increment("retry_count");
                debug!(
                    service = self.core.name(),
                    path = %info.storage_path,
                    failures,
                    "batch left unacked for redelivery"
                );
            }
            Ok(FailureDisposition::DeadLettered) => {
                self.core.metrics().increment("dlq_moved");
                if let Err(e) = reader.ack(token) {
                    self.core.record_error(
                        kind::BATCH_PROCESSING_FAILED,
                        format!("ack after dead-letter failed: {e}"),
                        self.clock.epoch_ms(),
                    );
                }
            }
            Err(e) => {
                // DLQ publish failed; leave unacked so redelivery retries
                self.core.record_error(
                    kind::BATCH_PROCESSING_FAILED,
                    format!("dead-letter publish failed: {e}"),
                    self.clock.epoch_ms(),
                );
            }
        }
    }

    /// Read or record-bounds failure for a batch that is still intact.
    fn batch_failure(
        &mut self,
        reader: &TopicReader<BatchInfo, C>,
        dlq: &mut DeadLetter<C>,
        info: &BatchInfo,
        token: &viv_topic::AckToken,
        message: &str,
    ) {
        self.core.record_error(
            kind::BATCH_PROCESSING_FAILED,
            format!("{}: {message}", info.storage_path),
            self.clock.epoch_ms(),
        );
        self.fail_entry(reader, dlq, info, token);
    }

    /// Structurally invalid batch: straight to the DLQ, no retry budget.
    fn reject_batch(
        &mut self,
        reader: &TopicReader<BatchInfo, C>,
        dlq: &mut DeadLetter<C>,
        info: &BatchInfo,
        token: &viv_topic::AckToken,
        reason: &str,
    ) {
        self.core.metrics().increment("batches_failed");
        self.core.record_error(
            kind::INVALID_BATCH,
            format!("{}: {reason}", info.storage_path),
            self.clock.epoch_ms(),
        );
        match dlq.move_to_dlq(info) {
            Ok(()) => {
                self.core.metrics().increment("dlq_moved");
                if let Err(e) = reader.ack(token) {
                    self.core.record_error(
                        kind::BATCH_PROCESSING_FAILED,
                        format!("ack after dead-letter failed: {e}"),
                        self.clock.epoch_ms(),
                    );
                }
            }
            Err(e) => {
                self.core.record_error(
                    kind::BATCH_PROCESSING_FAILED,
                    format!("dead-letter publish failed: {e}"),
                    self.clock.epoch_ms(),
                );
            }
        }
    }

    fn update_gauges(&self) {
        self.core.metrics().set("buffer_size", self.buffer.len() as i64);
        self.core.metrics().set("pending_acks", self.ledger.len() as i64);
    }
}

/// Notification-level validity: declared range ordered, run matches the
/// partition this indexer is bound to.
fn validate_info(info: &BatchInfo, run_id: &RunId) -> Result<(), String> {
    if !info.is_well_formed() {
        return Err(format!(
            "tick_start {} > tick_end {}",
            info.tick_start, info.tick_end
        ));
    }
    if info.simulation_run_id != *run_id {
        return Err(format!(
            "batch belongs to run {}, indexer is bound to {}",
            info.simulation_run_id, run_id
        ));
    }
    Ok(())
}

/// Record-level validity: every tick inside the declared bounds and on
/// the declared run.
fn validate_ticks(info: &BatchInfo, ticks: &[TickData], run_id: &RunId) -> Result<(), String> {
    for tick in ticks {
        if tick.simulation_run_id != *run_id {
            return Err(format!(
                "tick {} carries run {}",
                tick.tick_number, tick.simulation_run_id
            ));
        }
        if !info.contains_tick(tick.tick_number) {
            return Err(format!(
                "tick {} outside declared range [{}, {}]",
                tick.tick_number, info.tick_start, info.tick_end
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
