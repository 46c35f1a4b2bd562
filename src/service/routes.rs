//! Axum routes for the truth layer service.

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::error::TruthLayerError;
use crate::grounding::{compare_analyses, AnalysisComparison, GroundingEngine, GroundingInput, GroundingResult};
use crate::ingest::{IngestionInput, IngestionResult};
use crate::policy::PipelinePolicyV1;
use crate::redline::{RedlineEngine, RedlineInput, RedlineResult};
use crate::types::ClauseGroundedFields;
use crate::TRUTH_LAYER_SCHEMA_VERSION;

use super::middleware::{
    metrics_middleware, record_grounding_metrics, record_ingest_metrics, record_redline_metrics,
    request_id_middleware, RequestId,
};
use super::state::{PolicyRef, ServiceState};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to ingest a form version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    /// Pages and form identifiers.
    #[serde(flatten)]
    pub input: IngestionInput,
    /// Optional policy reference. If not provided, uses default policy.
    #[serde(default)]
    pub policy_ref: Option<PolicyRef>,
}

/// Ingestion result plus the policy and cache outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    /// The ingestion result.
    #[serde(flatten)]
    pub result: IngestionResult,
    /// Policy used.
    pub policy_ref: PolicyRef,
    /// Whether the result was served from the cache.
    pub cache_hit: bool,
}

/// Request to redline two editions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedlineRequest {
    /// Editions and related records.
    #[serde(flatten)]
    pub input: RedlineInput,
    /// Optional policy reference.
    #[serde(default)]
    pub policy_ref: Option<PolicyRef>,
}

/// Request to ground an analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundRequest {
    /// Analysis and ingested sources.
    #[serde(flatten)]
    pub input: GroundingInput,
    /// Optional policy reference.
    #[serde(default)]
    pub policy_ref: Option<PolicyRef>,
}

/// Request to compare two grounded analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    /// Earlier analysis.
    pub prior: ClauseGroundedFields,
    /// Later analysis.
    pub current: ClauseGroundedFields,
}

/// Request to register a new policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPolicyRequest {
    /// Policy to register.
    pub policy: PipelinePolicyV1,
}

/// Response containing a policy reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRefResponse {
    /// Reference of the registered policy.
    pub policy_ref: PolicyRef,
}

/// List of registered policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListResponse {
    /// Registered policy references.
    pub policies: Vec<PolicyRef>,
    /// Registry fingerprint.
    pub registry_fingerprint: String,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Schema version.
    pub schema_version: String,
    /// Registered policies.
    pub policy_count: usize,
    /// Registry fingerprint.
    pub registry_fingerprint: String,
    /// Policies with a live ingestion cache.
    pub ingestion_caches: usize,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service accepts traffic.
    pub ready: bool,
    /// Extra information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

impl From<TruthLayerError> for ErrorResponse {
    fn from(err: TruthLayerError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

fn api_error(err: TruthLayerError, request_id: &RequestId) -> ApiError {
    let status = match &err {
        TruthLayerError::PolicyNotFound { .. } => StatusCode::NOT_FOUND,
        TruthLayerError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TruthLayerError::Decode(_) => StatusCode::BAD_REQUEST,
    };
    tracing::warn!(
        code = err.code(),
        error = %err,
        correlation_id = %request_id.0,
        "Request rejected"
    );
    (
        status,
        Json(ErrorResponse::from(err).with_correlation_id(request_id.0.clone())),
    )
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Ingest a form version, serving repeats from the policy's cache.
async fn ingest_handler(
    State(state): State<Arc<ServiceState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let start = Instant::now();
    let (policy, policy_ref) = state
        .resolve_policy(request.policy_ref.as_ref())
        .map_err(|err| api_error(err, &request_id))?;
    let cache = state
        .ingestion_cache(policy, &policy_ref)
        .map_err(|err| api_error(err, &request_id))?;
    let cached = cache.ingest(&request.input);

    record_ingest_metrics(
        cached.result.chunks.len(),
        cached.result.quality_score,
        cached.cache_hit,
        start.elapsed().as_millis() as u64,
    );

    Ok(Json(IngestResponse {
        result: (*cached.result).clone(),
        policy_ref,
        cache_hit: cached.cache_hit,
    }))
}

/// Redline two editions of a form.
async fn redline_handler(
    State(state): State<Arc<ServiceState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RedlineRequest>,
) -> Result<Json<RedlineResult>, ApiError> {
    let start = Instant::now();
    let (policy, _) = state
        .resolve_policy(request.policy_ref.as_ref())
        .map_err(|err| api_error(err, &request_id))?;
    let engine = RedlineEngine::new(policy)
        .map_err(TruthLayerError::from)
        .map_err(|err| api_error(err, &request_id))?;
    let result = engine.compute(&request.input);

    record_redline_metrics(&result.stats, start.elapsed().as_millis() as u64);
    Ok(Json(result))
}

/// Ground an analysis in anchor citations.
async fn ground_handler(
    State(state): State<Arc<ServiceState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<GroundRequest>,
) -> Result<Json<GroundingResult>, ApiError> {
    let start = Instant::now();
    let (policy, _) = state
        .resolve_policy(request.policy_ref.as_ref())
        .map_err(|err| api_error(err, &request_id))?;
    let engine = GroundingEngine::new(policy)
        .map_err(TruthLayerError::from)
        .map_err(|err| api_error(err, &request_id))?;
    let fields = engine.ground(&request.input);

    record_grounding_metrics(&fields, start.elapsed().as_millis() as u64);
    Ok(Json(GroundingResult::from(fields)))
}

/// Compare two versions of a grounded analysis.
async fn compare_handler(Json(request): Json<CompareRequest>) -> Json<AnalysisComparison> {
    Json(compare_analyses(&request.prior, &request.current))
}

/// List registered policies.
async fn list_policies_handler(State(state): State<Arc<ServiceState>>) -> Json<PolicyListResponse> {
    let registry = state.policy_registry.read();
    Json(PolicyListResponse {
        policies: registry.list(),
        registry_fingerprint: registry.fingerprint().to_string(),
    })
}

/// Register a new policy.
async fn register_policy_handler(
    State(state): State<Arc<ServiceState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RegisterPolicyRequest>,
) -> Result<Json<PolicyRefResponse>, ApiError> {
    let policy_ref = state
        .policy_registry
        .write()
        .register(request.policy)
        .map_err(TruthLayerError::from)
        .map_err(|err| api_error(err, &request_id))?;
    Ok(Json(PolicyRefResponse { policy_ref }))
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<Arc<ServiceState>>) -> Json<HealthResponse> {
    let (policy_count, registry_fingerprint) = {
        let registry = state.policy_registry.read();
        (registry.len(), registry.fingerprint().to_string())
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: TRUTH_LAYER_SCHEMA_VERSION.to_string(),
        policy_count,
        registry_fingerprint,
        ingestion_caches: state.cache_count(),
    })
}

/// Liveness probe endpoint.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// The service has no external dependencies; it is ready once the registry
/// holds at least one policy.
async fn readiness_handler(
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.policy_registry.read().is_empty() {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                details: Some("No policies registered".to_string()),
            }),
        ))
    } else {
        Ok(Json(ReadinessResponse {
            ready: true,
            details: None,
        }))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the truth layer service.
pub fn create_router(state: ServiceState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Engines
        .route("/api/ingest", post(ingest_handler))
        .route("/api/redline", post(redline_handler))
        .route("/api/ground", post(ground_handler))
        .route("/api/ground/compare", post(compare_handler))
        // Policy management
        .route("/api/policies", get(list_policies_handler).post(register_policy_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
}
