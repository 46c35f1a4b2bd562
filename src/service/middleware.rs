//! Service middleware and metric records.
//!
//! Metrics are emitted as structured `tracing` events under the
//! `truth_layer::metrics` target and aggregated from logs.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;

use crate::types::{ClauseGroundedFields, RedlineStats};

/// Header carrying the request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation ID of the request being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Adopt the caller's `X-Request-Id` or mint a UUID.
///
/// The ID is stored as a [`RequestId`] extension for handlers and echoed on
/// the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!(
        target: "truth_layer::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request_metric"
    );

    response
}

/// Record an ingestion.
pub fn record_ingest_metrics(chunk_count: usize, quality_score: u8, cache_hit: bool, latency_ms: u64) {
    info!(
        target: "truth_layer::metrics",
        metric_type = "ingest",
        chunk_count,
        quality_score,
        cache_hit,
        latency_ms,
        "ingest_metric"
    );
}

/// Record a redline.
pub fn record_redline_metrics(stats: &RedlineStats, latency_ms: u64) {
    info!(
        target: "truth_layer::metrics",
        metric_type = "redline",
        changed_sections = stats.modified_sections + stats.added_sections + stats.removed_sections,
        impact_candidates = stats.impact_candidates,
        high_severity_impacts = stats.high_severity_impacts,
        latency_ms,
        "redline_metric"
    );
}

/// Record a grounding run.
pub fn record_grounding_metrics(fields: &ClauseGroundedFields, latency_ms: u64) {
    info!(
        target: "truth_layer::metrics",
        metric_type = "grounding",
        conclusions = fields.conclusions.len(),
        uncited_conclusions = fields.conclusions.iter().filter(|c| c.citations.is_empty()).count(),
        open_questions = fields.open_questions.len(),
        latency_ms,
        "grounding_metric"
    );
}
