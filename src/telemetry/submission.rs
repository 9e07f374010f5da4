//! Span helpers for the submission flow.

use tracing::Span;

/// Start a span covering one submission.
///
/// `submission.step` is declared empty and updated via [`record_step`].
pub fn start_submission_span(key: &str) -> Span {
    tracing::info_span!(
        "gateway.submit",
        "submission.key" = key,
        "submission.step" = tracing::field::Empty,
    )
}

/// Mark the last completed step ("recorded", "enqueued") on the span.
pub fn record_step(span: &Span, step: &'static str) {
    span.record("submission.step", step);
    span.in_scope(|| {
        tracing::debug!(step, "submission_step");
    });
}
