//! Truth Layer REST Service
//!
//! Exposes the ingestion, redline and grounding engines as a stateless REST
//! API. The only shared state is the policy registry and the ingestion caches.
//!
//! ## Endpoints
//!
//! - `POST /api/ingest` - Ingest a form version
//! - `POST /api/redline` - Redline two editions
//! - `POST /api/ground` - Ground an analysis in anchor citations
//! - `POST /api/ground/compare` - Compare two grounded analyses
//! - `GET /api/policies` - List registered policies
//! - `POST /api/policies` - Register a new policy
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{
    metrics_middleware, record_grounding_metrics, record_ingest_metrics, record_redline_metrics,
    request_id_middleware, RequestId, REQUEST_ID_HEADER,
};
pub use routes::{create_router, ErrorResponse};
pub use state::{ServiceState, PolicyRegistry, PolicyRef};
