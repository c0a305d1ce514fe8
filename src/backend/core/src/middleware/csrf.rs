//! CSRF prevention for the GraphQL endpoint.
//!
//! Browsers can send cross-site "simple" requests (form posts, plain GETs)
//! without a preflight. A request to a protected path is let through only if
//! it could not have been such a request: it carries a non-simple
//! `Content-Type` (e.g. `application/json`) or the configured marker header.

use axum::{
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::debug;

/// Content types a browser may send cross-site without a preflight.
const SIMPLE_CONTENT_TYPES: [&str; 3] = [
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "text/plain",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    pub enabled: bool,
    /// Header whose presence marks a request as non-simple
    pub header: String,
    /// Path prefixes the check applies to
    pub protected_paths: Vec<String>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header: "x-graphql-csrf".into(),
            protected_paths: vec!["/graphql".into()],
        }
    }
}

impl CsrfConfig {
    fn is_protected(&self, path: &str) -> bool {
        self.protected_paths.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Whether the headers prove the request went through a CORS preflight.
    pub fn is_preflighted(&self, headers: &HeaderMap) -> bool {
        if headers.contains_key(self.header.as_str()) {
            return true;
        }

        headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| {
                let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
                !essence.is_empty() && !SIMPLE_CONTENT_TYPES.contains(&essence.as_str())
            })
            .unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct CsrfLayer {
    config: Arc<CsrfConfig>,
}

impl CsrfLayer {
    pub fn new(config: CsrfConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for CsrfLayer {
    type Service = CsrfService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CsrfService {
            inner,
            config: self.config.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CsrfService<S> {
    inner: S,
    config: Arc<CsrfConfig>,
}

impl<S> Service<Request> for CsrfService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let config = self.config.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !config.enabled
                || !config.is_protected(req.uri().path())
                || config.is_preflighted(req.headers())
            {
                return inner.call(req).await;
            }

            debug!(path = %req.uri().path(), method = %req.method(), "CSRF check failed");
            counter!("kinetic_csrf_rejected_total").increment(1);

            Ok((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "success": false,
                    "error": {
                        "code": "CSRF_REJECTED",
                        "message": format!(
                            "Requests must use a non-simple Content-Type or include the {} header",
                            config.header
                        ),
                    }
                })),
            )
                .into_response())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_json_content_type_passes() {
        let cfg = CsrfConfig::default();
        assert!(cfg.is_preflighted(&headers(&[("content-type", "application/json")])));
        assert!(cfg.is_preflighted(&headers(&[(
            "content-type",
            "application/json; charset=utf-8"
        )])));
    }

    #[test]
    fn test_simple_content_types_blocked() {
        let cfg = CsrfConfig::default();
        assert!(!cfg.is_preflighted(&headers(&[("content-type", "text/plain")])));
        assert!(!cfg.is_preflighted(&headers(&[(
            "content-type",
            "application/x-www-form-urlencoded"
        )])));
        assert!(!cfg.is_preflighted(&headers(&[(
            "content-type",
            "Multipart/Form-Data; boundary=x"
        )])));
        assert!(!cfg.is_preflighted(&HeaderMap::new()));
    }

    #[test]
    fn test_marker_header_passes() {
        let cfg = CsrfConfig::default();
        assert!(cfg.is_preflighted(&headers(&[("x-graphql-csrf", "1")])));
        assert!(cfg.is_preflighted(&headers(&[
            ("content-type", "text/plain"),
            ("x-graphql-csrf", "1")
        ])));
    }

    #[test]
    fn test_protected_paths() {
        let cfg = CsrfConfig::default();
        assert!(cfg.is_protected("/graphql"));
        assert!(!cfg.is_protected("/health"));
    }
}
