//! Health reporting over in-memory backends.

use std::sync::Arc;

use queue_gateway::backend::memory::{MemoryIndex, MemoryQueue};
use queue_gateway::health::HealthMonitor;
use queue_gateway::model::{Backend, ConnectionState, Health};

fn monitor() -> (HealthMonitor, Arc<MemoryIndex>, Arc<MemoryQueue>) {
    let index = Arc::new(MemoryIndex::new());
    let queue = Arc::new(MemoryQueue::new());
    (
        HealthMonitor::new(index.clone(), queue.clone()),
        index,
        queue,
    )
}

#[tokio::test]
async fn healthy_when_both_connections_are_up() {
    let (monitor, _, _) = monitor();

    let report = monitor.report().await;

    assert!(report.is_healthy());
    assert_eq!(report.first_failure(), None);
}

#[tokio::test]
async fn store_down_is_reported() {
    let (monitor, index, _) = monitor();
    index.set_down(true);

    let report = monitor.report().await;

    assert_eq!(report.store, Health::Unhealthy);
    assert_eq!(report.queue, Health::Healthy);
    assert_eq!(report.first_failure(), Some(Backend::Store));
}

#[tokio::test]
async fn closed_queue_connection_is_reported() {
    let (monitor, _, queue) = monitor();

    for state in [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Failed,
    ] {
        queue.set_state(state);
        let report = monitor.report().await;
        assert_eq!(report.store, Health::Healthy);
        assert_eq!(report.queue, Health::Unhealthy, "state {state}");
    }
}

#[tokio::test]
async fn probing_never_touches_the_data_path() {
    let (monitor, index, queue) = monitor();
    index.set_down(true);

    assert_eq!(monitor.report().await.store, Health::Unhealthy);

    assert_eq!(index.exists_calls(), 0);
    assert_eq!(index.record_calls(), 0);
    assert_eq!(queue.enqueue_calls(), 0);
}
