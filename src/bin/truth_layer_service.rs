//! Truth Layer Service Binary
//!
//! Runs the truth layer engines as a REST API service:
//! - Structured JSON logging
//! - Request tracing with correlation IDs
//! - Graceful shutdown handling
//! - Health check endpoints
//!
//! ## Configuration
//!
//! Environment variables:
//! - `PORT`: Service port (default: 8002)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//! - `INGEST_CACHE_ENTRIES`: ingestion results cached per policy, 0 disables (default: 256)
//!
//! ## Usage
//!
//! ```bash
//! LOG_FORMAT=pretty cargo run --bin truth_layer_service --features service
//! ```

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use contract_truth_layer::service::{create_router, ServiceState, REQUEST_ID_HEADER};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "truth_layer_service=info,truth_layer=info,tower_http=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

/// Request logging middleware that adds correlation ID and timing
async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();

    let correlation_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    // Handlers report the same ID in error bodies.
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        correlation_id = %correlation_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "truth_layer_service::access",
        correlation_id = %correlation_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");

    info!(
        version = version,
        build_sha = build_sha,
        "Starting Truth Layer Service"
    );

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8002);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    let state = ServiceState::from_env();
    {
        let registry = state.policy_registry.read();
        info!(
            policy_count = registry.len(),
            registry_fingerprint = %registry.fingerprint(),
            "Policy registry initialized"
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(
        address = %addr,
        version = version,
        "Truth Layer Service listening"
    );

    let listener = TcpListener::bind(addr).await?;

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Truth Layer Service shutdown complete");

    Ok(())
}
