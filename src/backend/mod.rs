//! Backing-service clients and the bootstrap connector.
//!
//! The coordinator and health monitor only see the [`DedupIndex`] and
//! [`QueuePublisher`] traits; Redis and RabbitMQ implementations live in
//! submodules, alongside in-memory doubles for tests and local runs.

pub mod amqp;
pub mod connector;
pub mod memory;
pub mod redis;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::model::{Backend, ConnectionState, QueuePayload};

use self::amqp::AmqpPublisher;
use self::connector::{Connector, RetryPolicy};
use self::redis::RedisIndex;

/// Existence index over submitted keys.
///
/// Implementations must be safe for concurrent use by many requests.
#[async_trait]
pub trait DedupIndex: Send + Sync {
    /// Whether `key` has been recorded. No side effects.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Record `key` with `value`, overwriting any prior value.
    async fn record(&self, key: &str, value: &str) -> Result<()>;

    /// Lightweight liveness round trip.
    async fn ping(&self) -> Result<()>;
}

/// Publisher onto the single pre-declared durable queue.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Hand `payload` to the broker. Returns once the broker accepted it.
    async fn enqueue(&self, payload: &QueuePayload) -> Result<()>;

    /// Current state of the underlying connection, without a round trip.
    fn connection_state(&self) -> ConnectionState;
}

/// Live handles to both backends, established once at startup.
#[derive(Clone)]
pub struct Backends {
    pub index: Arc<dyn DedupIndex>,
    pub publisher: Arc<dyn QueuePublisher>,
}

/// Connect to the store, then the queue, each under the bootstrap retry policy.
///
/// Returns [`crate::error::Error::Fatal`] as soon as either backend exhausts
/// its attempts; the queue is not tried when the store failed.
pub async fn bootstrap(config: &Config) -> Result<Backends> {
    let redis_url = config.redis.url();
    let io_timeout = config.bootstrap.attempt_timeout;
    let amqp_uri = config.rabbitmq.uri();
    let queue_name = config.rabbitmq.queue.as_str();

    let backends = bootstrap_with(
        config.bootstrap,
        || RedisIndex::connect(&redis_url, io_timeout),
        || AmqpPublisher::connect(&amqp_uri, queue_name),
    )
    .await?;

    info!(queue = queue_name, "backends ready");
    Ok(backends)
}

/// Bootstrap with arbitrary connect functions, store first.
pub async fn bootstrap_with<I, P, FI, FutI, FP, FutP>(
    policy: RetryPolicy,
    connect_store: FI,
    connect_queue: FP,
) -> Result<Backends>
where
    I: DedupIndex + 'static,
    P: QueuePublisher + 'static,
    FI: FnMut() -> FutI,
    FutI: Future<Output = Result<I>>,
    FP: FnMut() -> FutP,
    FutP: Future<Output = Result<P>>,
{
    let index = Connector::new(Backend::Store, policy)
        .connect(connect_store)
        .await?;
    let publisher = Connector::new(Backend::Queue, policy)
        .connect(connect_queue)
        .await?;

    Ok(Backends {
        index: Arc::new(index),
        publisher: Arc::new(publisher),
    })
}
