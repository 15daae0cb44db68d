//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use docintake_pipeline::IntakeOrchestrator;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::health_api;
use crate::ocr_api;
use crate::rate_limit::{RateLimiter, enforce_rate_limit};

/// Room for multipart framing on top of the two image payloads.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Settings the router needs beyond the pipeline itself.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub api_key: Option<String>,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            cors_origins: Vec::new(),
            rate_limit_max_requests: 30,
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<IntakeOrchestrator>,
    pub api_key: Option<Arc<str>>,
    pub rate_limiter: RateLimiter,
    pub started_at: Instant,
    cors_origins: Arc<[String]>,
}

impl GatewayState {
    pub fn new(orchestrator: Arc<IntakeOrchestrator>, options: GatewayOptions) -> Self {
        Self {
            orchestrator,
            api_key: options.api_key.filter(|k| !k.is_empty()).map(Arc::from),
            rate_limiter: RateLimiter::new(
                options.rate_limit_max_requests,
                options.rate_limit_window.as_secs(),
            ),
            started_at: Instant::now(),
            cors_origins: options.cors_origins.into(),
        }
    }

    /// Whole-request body limit: both images at the per-image maximum.
    fn body_limit(&self) -> usize {
        self.orchestrator
            .validator()
            .max_bytes()
            .saturating_mul(2)
            .saturating_add(MULTIPART_OVERHEAD)
    }
}

/// Build the Axum router with all API routes.
pub fn build_router(state: GatewayState) -> Router {
    let process = post(ocr_api::process_document)
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/ocr/process", process)
        .route("/api/health", get(health_api::get_health))
        .layer(cors_layer(&state.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Starts the HTTP server and runs until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Intake HTTP server listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Intake HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docintake_media::ImageValidator;
    use docintake_pipeline::{PipelinePolicy, ResultAggregator};
    use docintake_understanding::{FieldExtractor, MockOcrEngine, OcrAdapter};

    fn state_with_limit(max_bytes: usize) -> GatewayState {
        let orchestrator = IntakeOrchestrator::new(
            ImageValidator::new(max_bytes),
            OcrAdapter::new(Arc::new(MockOcrEngine::new("mock"))),
            FieldExtractor::default(),
            ResultAggregator::default(),
            PipelinePolicy::default(),
        );
        GatewayState::new(Arc::new(orchestrator), GatewayOptions::default())
    }

    #[test]
    fn body_limit_covers_both_images() {
        assert_eq!(state_with_limit(1024).body_limit(), 2048 + MULTIPART_OVERHEAD);
    }

    #[test]
    fn huge_upload_limit_saturates() {
        assert_eq!(state_with_limit(usize::MAX).body_limit(), usize::MAX);
        assert_eq!(state_with_limit(usize::MAX / 2).body_limit(), usize::MAX);
    }
}
