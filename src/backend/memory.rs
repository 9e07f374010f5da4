//! In-memory backends with failure injection.
//!
//! Used by tests and for running the gateway without Redis or RabbitMQ.
//! Call counters let callers assert which side effects were attempted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{DedupIndex, QueuePublisher};
use crate::error::{Error, Result};
use crate::model::{ConnectionState, QueuePayload};

/// Hash-map dedup index.
#[derive(Default)]
pub struct MemoryIndex {
    entries: Mutex<HashMap<String, String>>,
    down: AtomicBool,
    fail_writes: AtomicBool,
    exists_calls: AtomicUsize,
    record_calls: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a lost connection: every call fails.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Make `record` fail while reads keep working.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    fn check_up(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(Error::store("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DedupIndex for MemoryIndex {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        Ok(self.entries.lock().contains_key(key))
    }

    async fn record(&self, key: &str, value: &str) -> Result<()> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::store("write failed"));
        }
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.check_up()
    }
}

/// Vec-backed queue that keeps every accepted payload in order.
pub struct MemoryQueue {
    published: Mutex<Vec<QueuePayload>>,
    state: Mutex<ConnectionState>,
    reject: AtomicBool,
    enqueue_calls: AtomicUsize,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            state: Mutex::new(ConnectionState::Ready),
            reject: AtomicBool::new(false),
            enqueue_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the connection state. Anything but `Ready` fails publishes.
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    /// Nack every publish while set.
    pub fn reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<QueuePayload> {
        self.published.lock().clone()
    }

    pub fn enqueue_calls(&self) -> usize {
        self.enqueue_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueuePublisher for MemoryQueue {
    async fn enqueue(&self, payload: &QueuePayload) -> Result<()> {
        self.enqueue_calls.fetch_add(1, Ordering::SeqCst);
        let state = *self.state.lock();
        if state != ConnectionState::Ready {
            return Err(Error::queue(format!("channel not open ({state})")));
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(Error::PublishRejected("nacked".to_string()));
        }
        self.published.lock().push(payload.clone());
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.lock()
    }
}
