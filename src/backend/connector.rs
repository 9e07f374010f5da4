//! Startup connection supervision with bounded, evenly spaced retries.

use std::future::Future;
use std::time::Duration;

use opentelemetry::KeyValue;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::model::{Backend, ConnectionState};
use crate::telemetry::metrics;

/// Fixed-interval retry policy for bootstrap. No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub interval: Duration,
    /// Upper bound on one attempt; a hung attempt counts as failed.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

/// Establishes one backend connection and tracks its [`ConnectionState`].
pub struct Connector {
    backend: Backend,
    policy: RetryPolicy,
    state: Mutex<ConnectionState>,
}

impl Connector {
    pub fn new(backend: Backend, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    /// Run `attempt` until it succeeds or the policy is exhausted.
    ///
    /// Each attempt must both connect and verify liveness, within
    /// `attempt_timeout`. On success the handle is returned and the state is
    /// `Ready`; after the last failed attempt the state is `Failed` and
    /// [`Error::Fatal`] is returned without a trailing sleep.
    pub async fn connect<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max = self.policy.max_attempts;
        for n in 1..=max {
            self.set_state(ConnectionState::Connecting);
            let outcome = match tokio::time::timeout(self.policy.attempt_timeout, attempt()).await
            {
                Ok(result) => result,
                Err(_) => Err(Error::BackendUnavailable {
                    backend: self.backend,
                    reason: format!("timed out after {:?}", self.policy.attempt_timeout),
                }),
            };

            match outcome {
                Ok(handle) => {
                    self.set_state(ConnectionState::Ready);
                    record_attempt(self.backend, "ok");
                    info!(backend = %self.backend, attempt = n, "connected to {}", self.backend);
                    return Ok(handle);
                }
                Err(e) => {
                    record_attempt(self.backend, "error");
                    error!(backend = %self.backend, attempt = n, "failed to connect to {}: {e}", self.backend);
                    if n < max {
                        self.set_state(ConnectionState::Disconnected);
                        tokio::time::sleep(self.policy.interval).await;
                    }
                }
            }
        }

        self.set_state(ConnectionState::Failed);
        error!(backend = %self.backend, attempts = max, "could not connect to {} after {max} attempts", self.backend);
        Err(Error::Fatal {
            backend: self.backend,
            attempts: max,
        })
    }
}

fn record_attempt(backend: Backend, result: &'static str) {
    metrics::bootstrap_attempts().add(
        1,
        &[
            KeyValue::new("backend", backend.as_str()),
            KeyValue::new("result", result),
        ],
    );
}
