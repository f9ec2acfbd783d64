/*!
 * HTTP API over the summarization pipeline.
 *
 * Routes:
 * - `GET /` health check
 * - `GET /api/info` supported languages and limits
 * - `POST /summarize` summarize a JSON body `{ text, max_length?, min_length?, num_beams? }`
 * - `POST /api/validate` inspect text without summarizing it
 */

pub mod handlers;
pub mod models;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::app_config::Config;
use crate::pipeline::SummaryPipeline;

pub const SERVICE_NAME: &str = "polysum";

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state of the HTTP handlers
#[derive(Debug)]
pub struct ApiState {
    pub pipeline: SummaryPipeline,
    pub provider: String,
    pub model: String,
}

impl ApiState {
    pub fn new(config: &Config, pipeline: SummaryPipeline) -> Self {
        Self {
            pipeline,
            provider: config.models.provider.display_name().to_string(),
            model: config.models.get_model(),
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the application router
pub fn router(state: ApiState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/api/info", get(handlers::info))
        .route("/api/validate", post(handlers::validate))
        .route("/summarize", post(handlers::summarize))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(allowed_origins))
        .with_state(Arc::new(state))
}

/// Serve the API on the configured address until the process is stopped
pub async fn serve(config: &Config, pipeline: SummaryPipeline) -> Result<()> {
    let address = config.server.bind_address();
    let app = router(ApiState::new(config, pipeline), &config.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
