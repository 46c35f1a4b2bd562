//! Router tests for the REST service.
//!
//! Requests go straight into the router with `tower::ServiceExt::oneshot`;
//! no socket is bound.

#![cfg(feature = "service")]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use contract_truth_layer::{
    create_router, IngestionInput, PageText, PipelinePolicyV1, PolicyRegistry, ServiceState,
    TRUTH_LAYER_SCHEMA_VERSION,
};
use contract_truth_layer::ingest::CacheConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn router() -> Router {
    create_router(ServiceState::default())
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn ingest_body(version: &str) -> Value {
    serde_json::to_value(IngestionInput {
        pages: vec![
            PageText::new(1, format!("DECLARATIONS\n{}", "Named insured and mailing address. ".repeat(4))),
            PageText::new(2, format!("EXCLUSIONS\n{}", "This insurance does not apply to pollution. ".repeat(4))),
        ],
        form_id: "form-1".to_string(),
        form_version_id: version.to_string(),
    })
    .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_endpoints() {
    let router = router();

    let (status, health) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["schemaVersion"], TRUTH_LAYER_SCHEMA_VERSION);
    assert_eq!(health["policyCount"], 1);

    let (status, live) = send(&router, "GET", "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(live["status"], "alive");

    let (status, ready) = send(&router, "GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["ready"], true);
}

#[tokio::test]
async fn test_not_ready_without_policies() {
    let state = ServiceState::with_registry(PolicyRegistry::new(), CacheConfig::default());
    let router = create_router(state);

    let (status, ready) = send(&router, "GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ready["ready"], false);
}

// ─────────────────────────────────────────────────────────────────────────────
// Ingestion
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ingest_then_cache_hit() {
    let router = router();

    let (status, first) = send(&router, "POST", "/api/ingest", Some(ingest_body("fv-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cacheHit"], false);
    assert_eq!(first["chunks"].as_array().map(Vec::len), Some(2));
    assert_eq!(first["policyRef"]["paramsHash"], PipelinePolicyV1::default().params_hash());

    let (status, second) = send(&router, "POST", "/api/ingest", Some(ingest_body("fv-1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cacheHit"], true);
    assert_eq!(second["fingerprint"], first["fingerprint"]);

    let (_, health) = send(&router, "GET", "/health", None).await;
    assert_eq!(health["ingestionCaches"], 1);
}

#[tokio::test]
async fn test_unknown_policy_ref_is_404() {
    let router = router();
    let mut body = ingest_body("fv-1");
    body["policyRef"] = json!({ "policyId": "pipeline_policy_v1", "paramsHash": "0000000000000000" });

    let (status, error) = send(&router, "POST", "/api/ingest", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "POLICY_NOT_FOUND");
}

#[tokio::test]
async fn test_error_carries_caller_request_id() {
    let router = router();
    let mut body = ingest_body("fv-1");
    body["policyRef"] = json!({ "policyId": "pipeline_policy_v1", "paramsHash": "0000000000000000" });
    let request = Request::builder()
        .method("POST")
        .uri("/api/ingest")
        .header("content-type", "application/json")
        .header("x-request-id", "req-claim-42")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-request-id"], "req-claim-42");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["code"], "POLICY_NOT_FOUND");
    assert_eq!(error["correlationId"], "req-claim-42");
}

#[tokio::test]
async fn test_error_without_request_id_gets_minted_one() {
    let router = router();
    let mut policy = PipelinePolicyV1::default();
    policy.max_citations = 0;
    let request = Request::builder()
        .method("POST")
        .uri("/api/policies")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "policy": serde_json::to_value(&policy).unwrap() }).to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let echoed = response.headers()["x-request-id"].to_str().unwrap().to_string();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["correlationId"], echoed.as_str());
    assert!(uuid::Uuid::parse_str(&echoed).is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Policies
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_register_and_use_policy() {
    let router = router();
    let mut policy = PipelinePolicyV1::default();
    policy.summary_chars = 80;

    let (status, registered) = send(
        &router,
        "POST",
        "/api/policies",
        Some(json!({ "policy": serde_json::to_value(&policy).unwrap() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(registered["policyRef"]["paramsHash"], policy.params_hash());

    let (_, listed) = send(&router, "GET", "/api/policies", None).await;
    assert_eq!(listed["policies"].as_array().map(Vec::len), Some(2));

    let mut body = ingest_body("fv-1");
    body["policyRef"] = registered["policyRef"].clone();
    let (status, ingested) = send(&router, "POST", "/api/ingest", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ingested["policyParamsHash"], policy.params_hash());
}

#[tokio::test]
async fn test_register_invalid_policy_is_422() {
    let router = router();
    let mut policy = PipelinePolicyV1::default();
    policy.max_citations = 0;

    let (status, error) = send(
        &router,
        "POST",
        "/api/policies",
        Some(json!({ "policy": serde_json::to_value(&policy).unwrap() })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "INVALID_POLICY");
}

// ─────────────────────────────────────────────────────────────────────────────
// Redline, Grounding and Compare
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_redline_and_ground_round_trip() {
    let router = router();
    let (_, left) = send(&router, "POST", "/api/ingest", Some(ingest_body("fv-1"))).await;
    let (_, right) = send(&router, "POST", "/api/ingest", Some(ingest_body("fv-2"))).await;

    let (status, redline) = send(
        &router,
        "POST",
        "/api/redline",
        Some(json!({
            "formId": "form-1",
            "formNumber": "IL 00 17",
            "formTitle": "Common Policy Conditions",
            "leftVersionId": "fv-1",
            "rightVersionId": "fv-2",
            "leftSections": left["sections"],
            "rightSections": right["sections"],
            "leftChunks": left["chunks"],
            "rightChunks": right["chunks"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(redline["stats"]["unchangedSections"], 2);
    assert_eq!(redline["impactCandidates"], json!([]));

    let (status, grounded) = send(
        &router,
        "POST",
        "/api/ground",
        Some(json!({
            "structuredFields": {
                "determination": "not_covered",
                "relevantExclusions": ["The pollution exclusions apply"],
            },
            "sectionsByFormVersion": { "fv-1": left["sections"] },
            "chunksByFormVersion": { "fv-1": left["chunks"] },
            "sources": [{ "formVersionId": "fv-1", "formLabel": "IL 00 17" }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grounded["analysisVersion"], 1);
    assert_eq!(grounded["conclusions"][0]["type"], "exclusion_applies");
    assert_eq!(grounded["conclusions"][1]["type"], "no_coverage");

    let mut current = grounded.clone();
    current["analysisVersion"] = json!(2);
    current["openQuestions"][0]["resolved"] = json!(true);
    let (status, comparison) = send(
        &router,
        "POST",
        "/api/ground/compare",
        Some(json!({ "prior": grounded, "current": current })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comparison["currentVersion"], 2);
    assert_eq!(comparison["summary"]["newlyResolved"], 1);
    assert_eq!(comparison["summary"]["conclusions"]["unchanged"], 2);
}
