//! Authentication middleware.
//!
//! Resolves the principal behind each request and the permission grants it
//! holds:
//! - Bearer JWTs whose `scopes` claim lists `RESOURCE:ACTION` grants
//! - Static API keys from configuration, each with typed grants
//! - A configured development principal when authentication is disabled
//!
//! The resulting [`AuthContext`] is inserted into request extensions; the
//! GraphQL handler turns its grants into an authorization context.
//!
//! # Example
//!
//! ```rust,ignore
//! use kinetic_core::middleware::auth::{AuthConfig, AuthLayer};
//!
//! let layer = AuthLayer::from_config(AuthConfig {
//!     jwt_secret: Some("change-me".into()),
//!     ..Default::default()
//! })?;
//!
//! let app = Router::new().route("/graphql", post(graphql_handler)).layer(layer);
//! ```

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    task::{Context, Poll},
};
use thiserror::Error;
use tower::{Layer, Service};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::rbac::PermissionGrant;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication credentials")]
    MissingCredentials,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key disabled")]
    KeyDisabled,

    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "MISSING_CREDENTIALS",
                "Authentication credentials are required",
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "The provided token is invalid",
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "The authentication token has expired",
            ),
            Self::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "INVALID_API_KEY",
                "The provided API key is invalid",
            ),
            Self::KeyDisabled => (
                StatusCode::FORBIDDEN,
                "KEY_DISABLED",
                "This API key has been disabled",
            ),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An authentication error occurred",
            ),
        };

        counter!("kinetic_auth_errors_total", "error_type" => code).increment(1);

        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JWT Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// JWT token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: numeric user id
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Grants in `RESOURCE:ACTION` form
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Token ID
    #[serde(default = "generate_jti")]
    pub jti: String,

    pub iat: i64,

    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

fn generate_jti() -> String {
    Uuid::new_v4().to_string()
}

impl Claims {
    pub fn builder(user_id: i32) -> ClaimsBuilder {
        ClaimsBuilder::new(user_id)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Numeric user id from `sub`, if it is one.
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }

    /// Grants carried by the token. Malformed scopes yield no grants.
    pub fn grants(&self) -> Vec<PermissionGrant> {
        PermissionGrant::parse_all(&self.scopes)
    }
}

/// Builder for JWT claims.
pub struct ClaimsBuilder {
    claims: Claims,
}

impl ClaimsBuilder {
    pub fn new(user_id: i32) -> Self {
        let now = Utc::now();
        Self {
            claims: Claims {
                sub: user_id.to_string(),
                email: None,
                scopes: Vec::new(),
                jti: generate_jti(),
                iat: now.timestamp(),
                exp: (now + Duration::hours(1)).timestamp(),
                iss: None,
                aud: None,
            },
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.claims.email = Some(email.into());
        self
    }

    pub fn scope(mut self, grant: &PermissionGrant) -> Self {
        self.claims.scopes.push(grant.to_string());
        self
    }

    pub fn raw_scope(mut self, scope: impl Into<String>) -> Self {
        self.claims.scopes.push(scope.into());
        self
    }

    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.claims.exp = (Utc::now() + duration).timestamp();
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.claims.iss = Some(issuer.into());
        self
    }

    pub fn build(self) -> Claims {
        self.claims
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication configuration (`[auth]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// When false every request runs as the development principal
    pub enabled: bool,

    /// HMAC secret for HS256 tokens; JWTs are rejected when unset
    pub jwt_secret: Option<String>,

    pub issuer: Option<String>,

    pub audience: Option<String>,

    /// Leeway for expiration checks (in seconds)
    pub leeway_secs: u64,

    /// Static API keys (key -> principal)
    pub api_keys: HashMap<String, ApiKeyInfo>,

    /// Paths that don't require authentication; a trailing `*` matches a prefix
    pub public_paths: Vec<String>,

    pub api_key_header: String,

    pub jwt_header: String,

    /// User id of the development principal
    pub dev_user_id: Option<i32>,

    /// Grants of the development principal
    pub dev_grants: Vec<PermissionGrant>,
}

/// A statically configured API key.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyInfo {
    pub user_id: i32,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub grants: Vec<PermissionGrant>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jwt_secret: None,
            issuer: None,
            audience: None,
            leeway_secs: 60,
            api_keys: HashMap::new(),
            public_paths: vec![
                "/".to_string(),
                "/health".to_string(),
                "/metrics".to_string(),
            ],
            api_key_header: "x-api-key".to_string(),
            jwt_header: "authorization".to_string(),
            dev_user_id: None,
            dev_grants: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Authentication Context
// ═══════════════════════════════════════════════════════════════════════════════

/// The principal behind a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Database id of the principal's user row, when known
    pub user_id: Option<i32>,

    pub email: Option<String>,

    pub grants: Vec<PermissionGrant>,

    pub auth_method: AuthMethod,

    /// Token ID (for JWT)
    pub token_id: Option<String>,

    /// Request ID for correlation
    pub request_id: String,
}

/// Authentication method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Jwt,
    ApiKey,
    Development,
    Anonymous,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims, user_id: i32, request_id: String) -> Self {
        Self {
            user_id: Some(user_id),
            email: claims.email.clone(),
            grants: claims.grants(),
            auth_method: AuthMethod::Jwt,
            token_id: Some(claims.jti.clone()),
            request_id,
        }
    }

    pub fn from_api_key(info: &ApiKeyInfo, request_id: String) -> Self {
        Self {
            user_id: Some(info.user_id),
            email: None,
            grants: info.grants.clone(),
            auth_method: AuthMethod::ApiKey,
            token_id: None,
            request_id,
        }
    }

    /// The configured principal used while authentication is disabled.
    pub fn development(config: &AuthConfig, request_id: String) -> Self {
        Self {
            user_id: config.dev_user_id,
            email: None,
            grants: config.dev_grants.clone(),
            auth_method: AuthMethod::Development,
            token_id: None,
            request_id,
        }
    }

    /// Context for public paths: no user, no grants.
    pub fn anonymous(request_id: String) -> Self {
        Self {
            user_id: None,
            email: None,
            grants: Vec::new(),
            auth_method: AuthMethod::Anonymous,
            token_id: None,
            request_id,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_method != AuthMethod::Anonymous
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Authenticator
// ═══════════════════════════════════════════════════════════════════════════════

/// Validates credentials against the configuration.
pub struct Authenticator {
    config: AuthConfig,
    encoding_key: Option<EncodingKey>,
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let (encoding_key, decoding_key) = match config.jwt_secret.as_deref() {
            Some("") => {
                return Err(AuthError::Internal("auth.jwt_secret must not be empty".into()));
            }
            Some(secret) => (
                Some(EncodingKey::from_secret(secret.as_bytes())),
                Some(DecodingKey::from_secret(secret.as_bytes())),
            ),
            None => (None, None),
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = config.audience {
            validation.set_audience(&[audience]);
        }

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Check if a path is public (doesn't require auth).
    pub fn is_public_path(&self, path: &str) -> bool {
        self.config.public_paths.iter().any(|p| match p.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == p,
        })
    }

    /// Authenticate from request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let request_id = request_id(headers);

        if let Some(token) = self.extract_jwt(headers) {
            return self.validate_jwt(&token, request_id);
        }

        if let Some(key) = self.extract_api_key(headers) {
            return self.validate_api_key(&key, request_id);
        }

        Err(AuthError::MissingCredentials)
    }

    fn extract_jwt(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(self.config.jwt_header.as_str())
            .and_then(|v| v.to_str().ok())
            .and_then(|s| {
                s.strip_prefix("Bearer ")
                    .or_else(|| s.strip_prefix("bearer "))
                    .map(|s| s.trim().to_string())
            })
    }

    fn extract_api_key(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(self.config.api_key_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }

    fn validate_jwt(&self, token: &str, request_id: String) -> Result<AuthContext, AuthError> {
        let decoding_key = self.decoding_key.as_ref().ok_or(AuthError::InvalidToken)?;

        let claims = decode::<Claims>(token, decoding_key, &self.validation)
            .map_err(|e| {
                debug!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?
            .claims;

        let user_id = claims.user_id().ok_or_else(|| {
            warn!(sub = %claims.sub, "JWT subject is not a numeric user id");
            AuthError::InvalidToken
        })?;

        counter!("kinetic_auth_success_total", "method" => "jwt").increment(1);

        Ok(AuthContext::from_claims(&claims, user_id, request_id))
    }

    fn validate_api_key(&self, key: &str, request_id: String) -> Result<AuthContext, AuthError> {
        let info = self.config.api_keys.get(key).ok_or(AuthError::InvalidApiKey)?;

        if !info.active {
            return Err(AuthError::KeyDisabled);
        }

        counter!("kinetic_auth_success_total", "method" => "api_key").increment(1);

        Ok(AuthContext::from_api_key(info, request_id))
    }

    /// Sign claims with the configured secret.
    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        let encoding_key = self
            .encoding_key
            .as_ref()
            .ok_or_else(|| AuthError::Internal("JWT secret not configured".into()))?;

        encode(&Header::new(Algorithm::HS256), claims, encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to generate token: {}", e)))
    }
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer and Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication layer for Tower.
#[derive(Clone)]
pub struct AuthLayer {
    authenticator: Arc<Authenticator>,
}

impl AuthLayer {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }

    pub fn from_config(config: AuthConfig) -> Result<Self, AuthError> {
        Ok(Self::new(Arc::new(Authenticator::new(config)?)))
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    authenticator: Arc<Authenticator>,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let authenticator = self.authenticator.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let config = authenticator.config();

            if !config.enabled {
                let ctx = AuthContext::development(config, request_id(request.headers()));
                request.extensions_mut().insert(ctx);
                return inner.call(request).await;
            }

            if authenticator.is_public_path(request.uri().path()) {
                let ctx = AuthContext::anonymous(request_id(request.headers()));
                request.extensions_mut().insert(ctx);
                return inner.call(request).await;
            }

            match authenticator.authenticate(request.headers()) {
                Ok(auth_context) => {
                    request.extensions_mut().insert(auth_context);
                    inner.call(request).await
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Extractor
// ═══════════════════════════════════════════════════════════════════════════════

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::PermissionAction;
    use axum::http::HeaderValue;

    const SECRET: &str = "super-secret-key-for-testing-only";

    fn authenticator() -> Authenticator {
        let mut api_keys = HashMap::new();
        api_keys.insert(
            "key-live".to_string(),
            ApiKeyInfo {
                user_id: 2,
                name: Some("ops".to_string()),
                grants: vec![PermissionGrant::new("EXERCISE", PermissionAction::Manage)],
                active: true,
            },
        );
        api_keys.insert(
            "key-dead".to_string(),
            ApiKeyInfo {
                user_id: 3,
                name: None,
                grants: Vec::new(),
                active: false,
            },
        );

        Authenticator::new(AuthConfig {
            jwt_secret: Some(SECRET.to_string()),
            api_keys,
            ..Default::default()
        })
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_claims_builder() {
        let claims = Claims::builder(7)
            .email("test@example.com")
            .scope(&PermissionGrant::new("ROUTINE", PermissionAction::Edit))
            .expires_in(Duration::hours(24))
            .build();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.scopes, vec!["ROUTINE:EDIT".to_string()]);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_jwt_round_trip_carries_grants() {
        let auth = authenticator();
        let claims = Claims::builder(1)
            .scope(&PermissionGrant::new("USER", PermissionAction::View))
            .scope(&PermissionGrant::new("SESSION", PermissionAction::Delete))
            .build();
        let token = auth.generate_token(&claims).unwrap();

        let ctx = auth.authenticate(&bearer(&token)).unwrap();
        assert_eq!(ctx.user_id, Some(1));
        assert_eq!(ctx.auth_method, AuthMethod::Jwt);
        assert_eq!(ctx.grants.len(), 2);
        assert_eq!(ctx.token_id.as_deref(), Some(claims.jti.as_str()));
    }

    #[test]
    fn test_jwt_with_malformed_scope_has_no_grants() {
        let auth = authenticator();
        let claims = Claims::builder(1)
            .raw_scope("USER:VIEW")
            .raw_scope("USER:GODMODE")
            .build();
        let token = auth.generate_token(&claims).unwrap();

        let ctx = auth.authenticate(&bearer(&token)).unwrap();
        assert!(ctx.grants.is_empty());
    }

    #[test]
    fn test_expired_jwt_rejected() {
        let auth = authenticator();
        let claims = Claims::builder(1).expires_in(Duration::hours(-2)).build();
        let token = auth.generate_token(&claims).unwrap();

        assert!(matches!(
            auth.authenticate(&bearer(&token)),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let auth = authenticator();
        let mut claims = Claims::builder(1).build();
        claims.sub = "alice".to_string();
        let token = auth.generate_token(&claims).unwrap();

        assert!(matches!(
            auth.authenticate(&bearer(&token)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let auth = authenticator();
        assert!(matches!(
            auth.authenticate(&bearer("not-a-jwt")),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_api_keys() {
        let auth = authenticator();

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("key-live"));
        let ctx = auth.authenticate(&headers).unwrap();
        assert_eq!(ctx.user_id, Some(2));
        assert_eq!(ctx.auth_method, AuthMethod::ApiKey);
        assert_eq!(ctx.grants[0].action, PermissionAction::Manage);

        headers.insert("x-api-key", HeaderValue::from_static("key-dead"));
        assert!(matches!(auth.authenticate(&headers), Err(AuthError::KeyDisabled)));

        headers.insert("x-api-key", HeaderValue::from_static("key-unknown"));
        assert!(matches!(auth.authenticate(&headers), Err(AuthError::InvalidApiKey)));
    }

    #[test]
    fn test_missing_credentials() {
        let auth = authenticator();
        assert!(matches!(
            auth.authenticate(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_public_paths() {
        let auth = Authenticator::new(AuthConfig {
            public_paths: vec!["/health".to_string(), "/docs/*".to_string()],
            ..Default::default()
        })
        .unwrap();

        assert!(auth.is_public_path("/health"));
        assert!(auth.is_public_path("/docs/schema"));
        assert!(!auth.is_public_path("/graphql"));
    }

    #[test]
    fn test_development_principal() {
        let config = AuthConfig {
            enabled: false,
            dev_user_id: Some(1),
            dev_grants: vec![PermissionGrant::new("ROUTINE", PermissionAction::Manage)],
            ..Default::default()
        };
        let ctx = AuthContext::development(&config, "req-1".to_string());
        assert_eq!(ctx.user_id, Some(1));
        assert_eq!(ctx.auth_method, AuthMethod::Development);
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.grants.len(), 1);

        let default_dev = AuthContext::development(&AuthConfig::default(), "req-2".to_string());
        assert!(default_dev.grants.is_empty());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = Authenticator::new(AuthConfig {
            jwt_secret: Some(String::new()),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
