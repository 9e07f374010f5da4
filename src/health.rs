//! On-demand liveness of both backends.

use std::sync::Arc;

use tracing::error;

use crate::backend::{Backends, DedupIndex, QueuePublisher};
use crate::model::{ConnectionState, Health, HealthReport};

/// Reports backend health. Never reconnects; a restart is the remedy.
#[derive(Clone)]
pub struct HealthMonitor {
    index: Arc<dyn DedupIndex>,
    publisher: Arc<dyn QueuePublisher>,
}

impl HealthMonitor {
    pub fn new(index: Arc<dyn DedupIndex>, publisher: Arc<dyn QueuePublisher>) -> Self {
        Self { index, publisher }
    }

    pub fn from_backends(backends: &Backends) -> Self {
        Self::new(
            Arc::clone(&backends.index),
            Arc::clone(&backends.publisher),
        )
    }

    /// Ping the store; read the queue connection state without a round trip.
    pub async fn report(&self) -> HealthReport {
        let store = match self.index.ping().await {
            Ok(()) => Health::Healthy,
            Err(e) => {
                error!("Redis health check failed: {e}");
                Health::Unhealthy
            }
        };

        let queue = match self.publisher.connection_state() {
            ConnectionState::Ready => Health::Healthy,
            state => {
                error!("RabbitMQ health check failed: connection is {state}");
                Health::Unhealthy
            }
        };

        HealthReport { store, queue }
    }
}
