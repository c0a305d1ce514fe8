//! HTTP layer for Kinetic.
//!
//! Routes:
//! - `POST /graphql`, `GET /graphql` (queries only)
//! - `GET /` GraphiQL, when enabled
//! - `GET /health`, `GET /metrics`
//!
//! Requests pass through tracing, CORS, compression, a body size limit, CSRF
//! prevention and authentication before reaching a handler.

pub mod handlers;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::cache::ResponseCache;
use crate::config::{Config, ServerConfig};
use crate::db::Database;
use crate::graphql::KineticSchema;
use crate::middleware::{AuthError, AuthLayer, CsrfLayer};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub schema: KineticSchema,
    pub db: Database,
    pub cache: ResponseCache,
    pub metrics: Option<PrometheusHandle>,
}

/// Build the router with its middleware stack.
pub fn build_router(state: AppState, config: &Config) -> Result<Router, AuthError> {
    let mut router = Router::new().route(
        "/graphql",
        get(handlers::graphql).post(handlers::graphql),
    );

    if config.server.graphiql {
        router = router.route("/", get(handlers::graphiql));
    }

    Ok(router
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        .layer(AuthLayer::from_config(config.auth.clone())?)
        .layer(CsrfLayer::new(config.csrf.clone()))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(CompressionLayer::new())
        .layer(cors(&config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if server.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
