//! Submission coordinator: existence checks and record-then-enqueue submits.
//!
//! Submit writes the dedup index first and the queue second. There is no
//! rollback: when the enqueue fails after the record landed, the key stays
//! marked as submitted with no task behind it, and the caller is told the
//! whole submission failed. Check and submit are not atomic across callers;
//! two callers may both see `NotExists` and both submit the same key.

use std::sync::Arc;

use chrono::Utc;
use opentelemetry::KeyValue;
use tracing::{Instrument, debug, error, info};
use uuid::Uuid;

use crate::backend::{Backends, DedupIndex, QueuePublisher};
use crate::error::{Error, Result};
use crate::model::{Existence, PayloadFormat, QueuePayload, SubmitReceipt, Submission};
use crate::telemetry::metrics;
use crate::telemetry::submission::{record_step, start_submission_span};

/// Orchestrates the dedup index and the queue for the request handlers.
#[derive(Clone)]
pub struct Coordinator {
    index: Arc<dyn DedupIndex>,
    publisher: Arc<dyn QueuePublisher>,
    format: PayloadFormat,
}

impl Coordinator {
    pub fn new(
        index: Arc<dyn DedupIndex>,
        publisher: Arc<dyn QueuePublisher>,
        format: PayloadFormat,
    ) -> Self {
        Self {
            index,
            publisher,
            format,
        }
    }

    pub fn from_backends(backends: &Backends, format: PayloadFormat) -> Self {
        Self::new(
            Arc::clone(&backends.index),
            Arc::clone(&backends.publisher),
            format,
        )
    }

    /// Best-effort hint whether `key` was already submitted. Read-only.
    pub async fn check_existence(&self, key: &str) -> Result<Existence> {
        if key.is_empty() {
            count_check("invalid");
            return Err(Error::InvalidRequest("Key is required".to_string()));
        }

        match self.index.exists(key).await {
            Ok(found) => {
                let existence = Existence::from(found);
                count_check(match existence {
                    Existence::Exists => "exists",
                    Existence::NotExists => "not_exists",
                });
                debug!(key, ?existence, "existence checked");
                Ok(existence)
            }
            Err(e) => {
                count_check("error");
                count_backend_error(&e, "exists");
                error!(key, "Redis error: {e}");
                Err(e)
            }
        }
    }

    /// Record `key` in the index, then enqueue the message.
    ///
    /// Empty inputs fail before any backend call. A failed record skips the
    /// enqueue. A failed enqueue leaves the record in place.
    pub async fn submit(&self, key: &str, message: &str) -> Result<SubmitReceipt> {
        let submission = match Submission::new(key, message) {
            Ok(s) => s,
            Err(e) => {
                count_submit("invalid");
                return Err(e);
            }
        };

        let span = start_submission_span(&submission.key);
        self.submit_validated(submission)
            .instrument(span)
            .await
    }

    async fn submit_validated(&self, submission: Submission) -> Result<SubmitReceipt> {
        let span = tracing::Span::current();
        let id = Uuid::new_v4();
        let submitted_at = Utc::now();

        // Encode before touching either backend so a serialization failure
        // has no side effects.
        let payload = QueuePayload::encode(&submission, self.format, id, submitted_at)?;

        if let Err(e) = self
            .index
            .record(&submission.key, &submission.message)
            .await
        {
            count_submit("store_error");
            count_backend_error(&e, "record");
            error!("Redis error: {e}");
            return Err(e);
        }
        record_step(&span, "recorded");

        if let Err(e) = self.publisher.enqueue(&payload).await {
            count_submit("queue_error");
            count_backend_error(&e, "enqueue");
            error!("RabbitMQ error: {e}; key remains recorded without a queued task");
            return Err(e);
        }
        record_step(&span, "enqueued");

        count_submit("ok");
        info!(submission_id = %id, "submission accepted");
        Ok(SubmitReceipt {
            id,
            key: submission.key,
            submitted_at,
        })
    }
}

fn count_check(outcome: &'static str) {
    metrics::check_requests().add(1, &[KeyValue::new("outcome", outcome)]);
}

fn count_submit(result: &'static str) {
    metrics::submit_requests().add(1, &[KeyValue::new("result", result)]);
}

fn count_backend_error(err: &Error, operation: &'static str) {
    let backend = err.backend().map(|b| b.as_str()).unwrap_or("unknown");
    metrics::backend_errors().add(
        1,
        &[
            KeyValue::new("backend", backend),
            KeyValue::new("operation", operation),
        ],
    );
}
