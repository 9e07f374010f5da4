//! Metric instrument factories for queue-gateway.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op.

use opentelemetry::metrics::{Counter, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("queue-gateway")
}

/// Counter: existence checks.
/// Labels: `outcome` ("exists" | "not_exists" | "invalid" | "error").
pub fn check_requests() -> Counter<u64> {
    meter()
        .u64_counter("gateway.check.requests")
        .with_description("Number of existence checks")
        .build()
}

/// Counter: submissions.
/// Labels: `result` ("ok" | "invalid" | "store_error" | "queue_error").
pub fn submit_requests() -> Counter<u64> {
    meter()
        .u64_counter("gateway.submit.requests")
        .with_description("Number of submissions")
        .build()
}

/// Counter: failed backend calls.
/// Labels: `backend` ("store" | "queue"), `operation`.
pub fn backend_errors() -> Counter<u64> {
    meter()
        .u64_counter("gateway.backend.errors")
        .with_description("Number of failed backend calls")
        .build()
}

/// Counter: bootstrap connection attempts.
/// Labels: `backend`, `result` ("ok" | "error").
pub fn bootstrap_attempts() -> Counter<u64> {
    meter()
        .u64_counter("gateway.bootstrap.attempts")
        .with_description("Number of bootstrap connection attempts")
        .build()
}
