//! HTTP boundary.
//!
//! A thin axum layer over the [Producer]: one route parses
//! `PercentRevoked`/`TotalCerts` (query string on GET, JSON body on POST),
//! drives the pipeline, and returns the hex-encoded SRD. Process state is a
//! read-only [Arc]: the signing key is loaded before serving and shared by
//! reference across concurrent requests, so the pipeline needs no locks.

use crate::{
    metrics::Metrics,
    producer::{Producer, Request},
    srd::Srd,
    Error,
};
use axum::{
    extract::{Query, State as AxumState},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use letsrevoke_codec::Encode as _;
use letsrevoke_cryptography::{ed25519::PublicKey, hex};
use prometheus_client::{encoding::text::encode, registry::Registry};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::error;

/// Path of the revoke-and-produce endpoint.
pub const REVOKE_AND_PRODUCE_SRD_PATH: &str = "/ct/v1/revoke-and-produce-srd";

/// Shared process state. Immutable after startup.
pub struct State {
    pub producer: Producer,
    pub metrics: Metrics,
    pub registry: Mutex<Registry>,
    pub authority: PublicKey,
}

impl State {
    /// Wraps a producer with a fresh metrics registry.
    pub fn new(producer: Producer) -> Arc<Self> {
        let mut registry = Registry::with_prefix("authority");
        let metrics = Metrics::new(&mut registry);
        let authority = producer.public_key();
        Arc::new(Self {
            producer,
            metrics,
            registry: Mutex::new(registry),
            authority,
        })
    }
}

/// Wire request: field names match the original client scripts.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SrdRequest {
    #[serde(rename = "PercentRevoked")]
    pub percent_revoked: f64,
    #[serde(rename = "TotalCerts")]
    pub total_certs: i64,
}

/// Wire response carrying the canonical SRD bytes in hex.
#[derive(Debug, Serialize)]
pub struct SrdResponse {
    pub total_certs: u64,
    pub percent_revoked: f64,
    pub revoked_count: u64,
    pub generated_at: u64,
    pub dictionary: &'static str,
    pub authority: String,
    pub encoded_size: usize,
    pub srd: String,
}

/// Builds the service router.
pub fn router(state: Arc<State>) -> Router {
    Router::new()
        .route(
            REVOKE_AND_PRODUCE_SRD_PATH,
            get(revoke_and_produce_query).post(revoke_and_produce_body),
        )
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Serves the router on `listener` until the process exits.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: Arc<State>,
) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

async fn revoke_and_produce_query(
    AxumState(state): AxumState<Arc<State>>,
    Query(request): Query<SrdRequest>,
) -> Result<Json<SrdResponse>, ApiError> {
    handle(state, request).await
}

async fn revoke_and_produce_body(
    AxumState(state): AxumState<Arc<State>>,
    Json(request): Json<SrdRequest>,
) -> Result<Json<SrdResponse>, ApiError> {
    handle(state, request).await
}

async fn handle(state: Arc<State>, request: SrdRequest) -> Result<Json<SrdResponse>, ApiError> {
    state.metrics.requests.inc();
    let started = std::time::Instant::now();
    let srd = state
        .producer
        .produce(Request {
            percent_revoked: request.percent_revoked,
            total_certs: request.total_certs,
        })
        .await
        .map_err(|err| {
            if err.is_rejection() {
                state.metrics.rejected.inc();
            } else {
                state.metrics.failed.inc();
            }
            ApiError(err)
        })?;
    state
        .metrics
        .build_duration
        .observe(started.elapsed().as_secs_f64());
    state.metrics.completed.inc();

    Ok(Json(respond(&srd)))
}

fn respond(srd: &Srd) -> SrdResponse {
    let encoded = srd.encode();
    SrdResponse {
        total_certs: srd.metadata.total_certs,
        percent_revoked: srd.metadata.percent_revoked,
        revoked_count: srd.metadata.revoked_count,
        generated_at: srd.metadata.generated_at,
        dictionary: srd.dictionary.kind(),
        authority: srd.metadata.authority.to_string(),
        encoded_size: encoded.len(),
        srd: hex(&encoded),
    }
}

async fn metrics_handler(AxumState(state): AxumState<Arc<State>>) -> Response {
    let registry = state.registry.lock().expect("registry poisoned");
    let mut buffer = String::new();
    if let Err(err) = encode(&mut buffer, &registry) {
        error!(error = %err, "could not encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        buffer,
    )
        .into_response()
}

async fn healthz(AxumState(state): AxumState<Arc<State>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "authority": state.authority.to_string(),
        "max_population": state.producer.max_population(),
    }))
}

/// Maps pipeline errors onto HTTP statuses.
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidParameter(_) | Error::ResourceExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Error::EncodingFailure(_)
            | Error::SigningFailure(_)
            | Error::VerificationFailed
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
