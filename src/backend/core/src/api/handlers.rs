//! HTTP handlers.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::GraphQLRequest;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::AppState;
use crate::cache::{self, OperationKind};
use crate::error::KineticError;
use crate::middleware::auth::AuthContext;
use crate::observability::metrics::GRAPHQL_REQUESTS;
use crate::rbac::AuthorizationContext;

const HEALTH_DB_TIMEOUT: Duration = Duration::from_secs(2);

// ═══════════════════════════════════════════════════════════════════════════════
// GraphQL
// ═══════════════════════════════════════════════════════════════════════════════

/// Execute a GraphQL request (`POST /graphql`, or `GET /graphql` for queries).
///
/// Builds the caller's authorization context from its grants, serves
/// error-free query results from the response cache and flushes the cache
/// after every error-free mutation.
pub async fn graphql(
    State(state): State<AppState>,
    method: Method,
    auth: AuthContext,
    request: GraphQLRequest,
) -> Response {
    let request = request.into_inner();
    let kind = OperationKind::classify(&request.query, request.operation_name.as_deref());

    if method == Method::GET && kind != OperationKind::Query {
        counter!(GRAPHQL_REQUESTS, "operation" => kind.as_str(), "outcome" => "rejected")
            .increment(1);
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({
                "errors": [{
                    "message": "GET requests may only execute queries",
                    "extensions": { "code": "BAD_REQUEST" }
                }]
            })),
        )
            .into_response();
    }

    let authz = AuthorizationContext::build(&auth.grants);

    let cache_key = (kind == OperationKind::Query && state.cache.is_enabled())
        .then(|| cache::cache_key(auth.user_id, &authz, &request));

    if let Some(body) = cache_key.as_deref().and_then(|key| state.cache.get(key)) {
        counter!(GRAPHQL_REQUESTS, "operation" => kind.as_str(), "outcome" => "cached")
            .increment(1);
        return json_body(body.to_string());
    }

    debug!(
        operation = kind.as_str(),
        user_id = ?auth.user_id,
        grants = %authz.fingerprint(),
        "Executing GraphQL request"
    );

    let response = state.schema.execute(request.data(authz).data(auth)).await;
    let succeeded = response.errors.is_empty();

    counter!(
        GRAPHQL_REQUESTS,
        "operation" => kind.as_str(),
        "outcome" => if succeeded { "ok" } else { "error" }
    )
    .increment(1);

    let body = match serde_json::to_string(&response) {
        Ok(body) => body,
        Err(e) => return KineticError::from(e).into_response(),
    };

    // Every executed mutation flushes, including ones that reported errors.
    match (kind, cache_key) {
        (OperationKind::Mutation, _) => state.cache.flush(),
        (OperationKind::Query, Some(key)) if succeeded => {
            state.cache.insert(key, Arc::from(body.as_str()))
        }
        _ => {}
    }

    json_body(body)
}

fn json_body(body: String) -> Response {
    ([(CONTENT_TYPE, "application/json")], body).into_response()
}

/// GraphiQL IDE.
pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Health & Metrics
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match tokio::time::timeout(HEALTH_DB_TIMEOUT, state.db.ping()).await {
        Ok(Ok(latency)) => json!({
            "status": "healthy",
            "latency_ms": latency.as_millis() as u64,
            "pool": state.db.pool_stats(),
        }),
        Ok(Err(e)) => {
            warn!(error = %e, "Health check: database unavailable");
            json!({ "status": "unhealthy", "error": e.user_message() })
        }
        Err(_) => {
            warn!("Health check: database ping timed out");
            json!({ "status": "unhealthy", "error": "timed out" })
        }
    };

    let healthy = database["status"] == "healthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "components": {
                "database": database,
                "response_cache": { "entries": state.cache.len() },
            }
        })),
    )
}

pub async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.as_ref() {
        Some(handle) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
