//! Core data model.
//!
//! A submission is a caller-supplied key plus an opaque message. The key is
//! recorded in the dedup index; the message travels to the durable queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// The two backing services the gateway coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Key-value store used as the dedup index (Redis).
    Store,
    /// Broker holding the durable work queue (RabbitMQ).
    Queue,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Queue => "queue",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Product names are part of the HTTP contract.
        match self {
            Self::Store => write!(f, "Redis"),
            Self::Queue => write!(f, "RabbitMQ"),
        }
    }
}

/// Lifecycle of one backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// A validated (key, message) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub key: String,
    pub message: String,
}

impl Submission {
    /// Build a submission, rejecting an empty key or message.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let message = message.into();
        if key.is_empty() {
            return Err(Error::InvalidRequest("Key is required".to_string()));
        }
        if message.is_empty() {
            return Err(Error::InvalidRequest("Message is required".to_string()));
        }
        Ok(Self { key, message })
    }
}

/// Result of an existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Exists,
    NotExists,
}

impl From<bool> for Existence {
    fn from(exists: bool) -> Self {
        if exists { Self::Exists } else { Self::NotExists }
    }
}

/// Returned when both the index write and the enqueue succeeded.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub id: Uuid,
    pub key: String,
    pub submitted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queue payloads
// ---------------------------------------------------------------------------

/// How a submission is serialized onto the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    /// JSON envelope carrying the key alongside the message.
    #[default]
    Envelope,
    /// The message bytes only; consumers cannot see the key.
    Raw,
}

impl std::str::FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "envelope" => Ok(Self::Envelope),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown payload format: {other}")),
        }
    }
}

/// The JSON body published in [`PayloadFormat::Envelope`] mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub id: Uuid,
    pub key: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

/// Bytes handed to the queue publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePayload {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

impl QueuePayload {
    pub fn encode(
        submission: &Submission,
        format: PayloadFormat,
        id: Uuid,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self> {
        match format {
            PayloadFormat::Raw => Ok(Self {
                body: submission.message.as_bytes().to_vec(),
                content_type: "text/plain",
            }),
            PayloadFormat::Envelope => {
                let envelope = TaskEnvelope {
                    id,
                    key: submission.key.clone(),
                    message: submission.message.clone(),
                    submitted_at,
                };
                Ok(Self {
                    body: serde_json::to_vec(&envelope)?,
                    content_type: "application/json",
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Unhealthy,
}

/// Aggregate liveness of both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub store: Health,
    pub queue: Health,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.store == Health::Healthy && self.queue == Health::Healthy
    }

    /// First unhealthy backend, store before queue.
    pub fn first_failure(&self) -> Option<Backend> {
        if self.store == Health::Unhealthy {
            Some(Backend::Store)
        } else if self.queue == Health::Unhealthy {
            Some(Backend::Queue)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_rejects_empty_fields() {
        assert!(matches!(
            Submission::new("", "payload"),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            Submission::new("job-1", ""),
            Err(Error::InvalidRequest(_))
        ));
        assert!(Submission::new("job-1", "payload").is_ok());
    }

    #[test]
    fn raw_payload_is_message_only() {
        let sub = Submission::new("job-1", "crawl https://example.com").unwrap();
        let payload =
            QueuePayload::encode(&sub, PayloadFormat::Raw, Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(payload.body, b"crawl https://example.com");
        assert_eq!(payload.content_type, "text/plain");
    }

    #[test]
    fn envelope_payload_carries_key() {
        let sub = Submission::new("job-1", "crawl").unwrap();
        let id = Uuid::new_v4();
        let payload = QueuePayload::encode(&sub, PayloadFormat::Envelope, id, Utc::now()).unwrap();
        let envelope: TaskEnvelope = serde_json::from_slice(&payload.body).unwrap();
        assert_eq!(envelope.id, id);
        assert_eq!(envelope.key, "job-1");
        assert_eq!(envelope.message, "crawl");
        assert_eq!(payload.content_type, "application/json");
    }

    #[test]
    fn payload_format_parses_case_insensitively() {
        assert_eq!("RAW".parse::<PayloadFormat>(), Ok(PayloadFormat::Raw));
        assert_eq!(
            "envelope".parse::<PayloadFormat>(),
            Ok(PayloadFormat::Envelope)
        );
        assert!("xml".parse::<PayloadFormat>().is_err());
    }

    #[test]
    fn health_report_prefers_store_failure() {
        let report = HealthReport {
            store: Health::Unhealthy,
            queue: Health::Unhealthy,
        };
        assert_eq!(report.first_failure(), Some(Backend::Store));
        assert!(!report.is_healthy());
    }
}
