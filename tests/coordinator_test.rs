//! Submission coordination against in-memory backends.

use std::sync::Arc;

use queue_gateway::backend::memory::{MemoryIndex, MemoryQueue};
use queue_gateway::coordinator::Coordinator;
use queue_gateway::error::Error;
use queue_gateway::model::{Backend, ConnectionState, Existence, PayloadFormat, TaskEnvelope};

struct Fixture {
    index: Arc<MemoryIndex>,
    queue: Arc<MemoryQueue>,
    coordinator: Coordinator,
}

fn fixture(format: PayloadFormat) -> Fixture {
    let index = Arc::new(MemoryIndex::new());
    let queue = Arc::new(MemoryQueue::new());
    let coordinator = Coordinator::new(index.clone(), queue.clone(), format);
    Fixture {
        index,
        queue,
        coordinator,
    }
}

// ---------------------------------------------------------------------------
// Existence checks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unseen_key_does_not_exist_until_submitted() {
    let f = fixture(PayloadFormat::Envelope);

    assert_eq!(
        f.coordinator.check_existence("job-42").await.unwrap(),
        Existence::NotExists
    );

    f.coordinator.submit("job-42", "crawl page 1").await.unwrap();

    assert_eq!(
        f.coordinator.check_existence("job-42").await.unwrap(),
        Existence::Exists
    );
}

#[tokio::test]
async fn check_with_empty_key_is_invalid() {
    let f = fixture(PayloadFormat::Envelope);

    let err = f.coordinator.check_existence("").await.unwrap_err();

    match err {
        Error::InvalidRequest(reason) => assert_eq!(reason, "Key is required"),
        other => panic!("expected InvalidRequest, got {other:?}"),
    }
    assert_eq!(f.index.exists_calls(), 0);
}

#[tokio::test]
async fn check_reports_store_failure() {
    let f = fixture(PayloadFormat::Envelope);
    f.index.set_down(true);

    let err = f.coordinator.check_existence("job-1").await.unwrap_err();

    assert_eq!(err.backend(), Some(Backend::Store));
    assert_eq!(f.queue.enqueue_calls(), 0);
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_key_or_message_makes_no_backend_calls() {
    let f = fixture(PayloadFormat::Envelope);

    for (key, message) in [("", "payload"), ("job-1", ""), ("", "")] {
        let err = f.coordinator.submit(key, message).await.unwrap_err();
        assert!(
            matches!(err, Error::InvalidRequest(_)),
            "expected InvalidRequest for ({key:?}, {message:?}), got {err:?}"
        );
    }

    assert_eq!(f.index.record_calls(), 0);
    assert_eq!(f.index.exists_calls(), 0);
    assert_eq!(f.queue.enqueue_calls(), 0);
}

#[tokio::test]
async fn successful_submit_records_message_and_enqueues_once() {
    let f = fixture(PayloadFormat::Envelope);

    let receipt = f.coordinator.submit("job-7", "index book 7").await.unwrap();

    assert_eq!(receipt.key, "job-7");
    assert_eq!(f.index.get("job-7").as_deref(), Some("index book 7"));

    let published = f.queue.published();
    assert_eq!(published.len(), 1);
    let envelope: TaskEnvelope = serde_json::from_slice(&published[0].body).unwrap();
    assert_eq!(envelope.id, receipt.id);
    assert_eq!(envelope.key, "job-7");
    assert_eq!(envelope.message, "index book 7");
}

#[tokio::test]
async fn raw_format_enqueues_message_without_key() {
    let f = fixture(PayloadFormat::Raw);

    f.coordinator.submit("job-7", "index book 7").await.unwrap();

    let published = f.queue.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].body, b"index book 7");
    assert_eq!(published[0].content_type, "text/plain");
}

#[tokio::test]
async fn failed_record_skips_enqueue() {
    let f = fixture(PayloadFormat::Envelope);
    f.index.fail_writes(true);

    let err = f.coordinator.submit("job-1", "payload").await.unwrap_err();

    assert_eq!(err.backend(), Some(Backend::Store));
    assert_eq!(f.index.record_calls(), 1);
    assert_eq!(f.queue.enqueue_calls(), 0);
    assert!(f.index.is_empty());
}

#[tokio::test]
async fn failed_enqueue_leaves_key_recorded() {
    let f = fixture(PayloadFormat::Envelope);
    f.queue.set_state(ConnectionState::Disconnected);

    let err = f.coordinator.submit("job-1", "payload").await.unwrap_err();
    assert_eq!(err.backend(), Some(Backend::Queue));

    // No rollback: the index claims the key was submitted with no task queued.
    assert_eq!(
        f.coordinator.check_existence("job-1").await.unwrap(),
        Existence::Exists
    );
    assert!(f.queue.published().is_empty());
}

#[tokio::test]
async fn nacked_publish_is_reported_as_queue_failure() {
    let f = fixture(PayloadFormat::Envelope);
    f.queue.reject(true);

    let err = f.coordinator.submit("job-1", "payload").await.unwrap_err();

    assert!(matches!(err, Error::PublishRejected(_)));
    assert_eq!(err.backend(), Some(Backend::Queue));
    assert_eq!(f.index.get("job-1").as_deref(), Some("payload"));
}

#[tokio::test]
async fn resubmitting_a_key_overwrites_and_enqueues_again() {
    let f = fixture(PayloadFormat::Raw);

    f.coordinator.submit("job-1", "first").await.unwrap();
    f.coordinator.submit("job-1", "second").await.unwrap();

    assert_eq!(f.index.get("job-1").as_deref(), Some("second"));
    assert_eq!(f.index.len(), 1);
    assert_eq!(f.queue.published().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_submits_for_same_key_both_succeed() {
    let f = fixture(PayloadFormat::Raw);

    let a = {
        let c = f.coordinator.clone();
        tokio::spawn(async move { c.submit("K", "A").await })
    };
    let b = {
        let c = f.coordinator.clone();
        tokio::spawn(async move { c.submit("K", "B").await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let mut bodies: Vec<Vec<u8>> = f.queue.published().into_iter().map(|p| p.body).collect();
    bodies.sort();
    assert_eq!(bodies, vec![b"A".to_vec(), b"B".to_vec()]);

    let value = f.index.get("K").expect("key should be recorded");
    assert!(value == "A" || value == "B", "unexpected value {value}");
}
