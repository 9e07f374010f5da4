//! Telemetry initialization and span helpers.

use queue_gateway::telemetry::{TelemetryConfig, init_telemetry, submission};

#[test]
fn telemetry_initializes_without_endpoint() {
    // A global subscriber can only be set once per process; a second
    // initialization from another test returning Err is acceptable.
    let config = TelemetryConfig {
        endpoint: None,
        service_name: "queue-gateway-test".to_string(),
        default_filter: "info".to_string(),
    };
    if let Ok(guard) = init_telemetry(config) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn submission_span_records_steps() {
    let span = submission::start_submission_span("job-1");
    submission::record_step(&span, "recorded");
    submission::record_step(&span, "enqueued");
}
