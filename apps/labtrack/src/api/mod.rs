//! # labtrack HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /catalog` - List labs
//! - `GET /catalog/{lab}` - Full lab definition
//! - `GET /progress` - Raw progress record
//! - `DELETE /progress` - Reset all progress and tiers
//! - `GET /progress/{lab}` - Lab progress at its selected tier
//! - `POST /progress/{lab}/toggle` - Flip one step
//! - `PUT /progress/{lab}/tier` - Select a tier
//! - `POST /progress/{lab}/complete` - Complete a whole layer
//! - `GET /guide/{lab}` - Lab guide sections at the selected tier
//! - `GET /readiness` - Overall, domain, and module readiness
//! - `GET /preferences`, `PUT /preferences` - UI preferences
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `LABTRACK_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `LABTRACK_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `LABTRACK_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::get_api_key_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    CatalogResponse, CompleteLayerRequest, CompleteLayerResponse, ErrorResponse, GuideResponse,
    HealthResponse, LabProgressResponse, LabSummary, PreferencesRequest, ResetResponse,
    TierRequest, ToggleRequest, ToggleResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use labtrack_core::{Catalog, DomainMap, FsGuideSource, GuideCache, LabTrackError, ProgressStore};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// The store synchronizes its own writes, so handlers share it without an
/// outer lock. Guides are fetched once per lab and kept for the server's
/// lifetime.
#[derive(Clone)]
pub struct AppState {
    pub store: ProgressStore,
    pub catalog: &'static Catalog,
    pub domains: &'static DomainMap,
    pub guides: Arc<GuideCache<FsGuideSource>>,
}

impl AppState {
    /// Create app state over a store with the built-in catalog, reading
    /// guides from `./docs`.
    #[must_use]
    pub fn new(store: ProgressStore) -> Self {
        Self {
            store,
            catalog: Catalog::builtin(),
            domains: DomainMap::builtin(),
            guides: Arc::new(GuideCache::new(FsGuideSource::new("docs"))),
        }
    }

    /// Read guides from `root` instead.
    #[must_use]
    pub fn with_docs_root(mut self, root: impl AsRef<Path>) -> Self {
        self.guides = Arc::new(GuideCache::new(FsGuideSource::new(root)));
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Dashboard dev server and this API on the default ports.
const LOCALHOST_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:8080",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:8080",
];

/// Valid entries of a comma-separated origin list; invalid ones are logged
/// and skipped.
fn parse_origins(list: &str) -> Vec<HeaderValue> {
    list.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin, error = %e, "CORS: ignoring invalid origin");
                None
            }
        })
        .collect()
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// CORS policy for a `LABTRACK_CORS_ORIGINS` value.
///
/// `*` allows every origin. Unset, or a list with no valid origin, falls
/// back to localhost.
fn cors_layer(setting: Option<&str>) -> CorsLayer {
    if setting == Some("*") {
        tracing::warn!("CORS: allowing ALL origins (LABTRACK_CORS_ORIGINS=*)");
        return CorsLayer::permissive();
    }

    let origins = setting.map(parse_origins).unwrap_or_default();
    if origins.is_empty() {
        tracing::info!("CORS: localhost origins only");
        restricted_cors(parse_origins(&LOCALHOST_ORIGINS.join(",")))
    } else {
        tracing::info!(count = origins.len(), "CORS: allowing configured origins");
        restricted_cors(origins)
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting - 429 once the global quota is spent (if enabled)
/// 4. Authentication - validates API key (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(std::env::var("LABTRACK_CORS_ORIGINS").ok().as_deref());

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let api_key = get_api_key_from_env().map(|key| auth::ApiKey::new(&key));
    if api_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication disabled - all endpoints are publicly accessible. \
             Set LABTRACK_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/catalog", get(handlers::catalog_handler))
        .route("/catalog/{lab}", get(handlers::lab_handler))
        .route(
            "/progress",
            get(handlers::progress_handler).delete(handlers::reset_handler),
        )
        .route("/progress/{lab}", get(handlers::lab_progress_handler))
        .route("/progress/{lab}/toggle", post(handlers::toggle_handler))
        .route("/progress/{lab}/tier", put(handlers::tier_handler))
        .route(
            "/progress/{lab}/complete",
            post(handlers::complete_layer_handler),
        )
        .route("/guide/{lab}", get(handlers::guide_handler))
        .route("/readiness", get(handlers::readiness_handler))
        .route(
            "/preferences",
            get(handlers::preferences_handler).put(handlers::update_preferences_handler),
        );

    if let Some(key) = api_key {
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::api_key_auth_middleware,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), LabTrackError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LabTrackError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("labtrack HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LabTrackError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// =============================================================================
// TESTS
// =============================================================================
