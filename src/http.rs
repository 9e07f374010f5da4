//! HTTP surface: `/check`, `/submit` and `/healthcheck`.
//!
//! Handlers stay thin; every decision lives in the coordinator and the
//! health monitor. Response shapes are part of the public contract.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::backend::Backends;
use crate::coordinator::Coordinator;
use crate::error::Error;
use crate::health::HealthMonitor;
use crate::model::{Existence, PayloadFormat};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct GatewayState {
    pub coordinator: Coordinator,
    pub health: HealthMonitor,
}

impl GatewayState {
    pub fn new(backends: &Backends, format: PayloadFormat) -> Self {
        Self {
            coordinator: Coordinator::from_backends(backends, format),
            health: HealthMonitor::from_backends(backends),
        }
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/check", get(check))
        .route("/submit", post(submit))
        .route("/healthcheck", get(healthcheck))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Starting server on {addr}");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub key: String,
    pub message: String,
}

/// Maps crate errors onto status codes and the `{error}` body.
#[derive(Debug)]
pub struct GatewayError(pub Error);

impl From<Error> for GatewayError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            Error::InvalidRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            e => match e.backend() {
                Some(backend) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{backend} error")),
                None => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                ),
            },
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (
        status,
        Json(MessageBody {
            message: text.to_string(),
        }),
    )
        .into_response()
}

async fn check(
    State(state): State<GatewayState>,
    Query(params): Query<CheckParams>,
) -> Result<Response, GatewayError> {
    let key = params.key.unwrap_or_default();
    Ok(match state.coordinator.check_existence(&key).await? {
        Existence::Exists => message(StatusCode::CONFLICT, "Key already exists"),
        Existence::NotExists => message(StatusCode::OK, "Key does not exist"),
    })
}

async fn submit(
    State(state): State<GatewayState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("rejected submit body: {rejection}");
        Error::InvalidRequest(rejection.body_text())
    })?;

    state
        .coordinator
        .submit(&request.key, &request.message)
        .await?;
    Ok(message(StatusCode::OK, "Success"))
}

async fn healthcheck(State(state): State<GatewayState>) -> Response {
    let report = state.health.report().await;
    let (status, text) = match report.first_failure() {
        None => (StatusCode::OK, "All connections are healthy".to_string()),
        Some(backend) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{backend} connection failed"),
        ),
    };
    (status, Json(StatusBody { status: text })).into_response()
}
