//! Error handling for Kinetic Core.
//!
//! This module provides:
//! - A single error type carrying a machine-readable [`ErrorCode`]
//! - User-facing messages kept apart from internal detail
//! - HTTP status mapping for the plain REST endpoints
//! - GraphQL error extensions (`extensions.code`) for resolver failures
//! - Logging and metrics hooks
//!
//! # Usage
//!
//! ```rust,ignore
//! use kinetic_core::error::{ErrorContext, KineticError, Result};
//!
//! async fn load(db: &Database, id: i32) -> Result<RoutineRow> {
//!     db.get_routine(id).await?.context("Routine not found")
//! }
//! ```

use async_graphql::ErrorExtensions;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::rbac::PolicyError;

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for Kinetic operations.
pub type Result<T> = std::result::Result<T, KineticError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
///
/// The SCREAMING_SNAKE_CASE form is what clients see in `extensions.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Data Errors (1000-1099)
    NotFound,
    DuplicateRecord,
    InvalidReference,
    LastCreator,

    // Auth Errors (1100-1199)
    Unauthorized,
    Forbidden,
    InvalidToken,
    TokenExpired,

    // Request Errors (1200-1299)
    ValidationError,
    InvalidInput,
    QueryLimitExceeded,
    CsrfRejected,

    // Storage Errors (1300-1399)
    DatabaseError,
    DatabaseConnectionFailed,
    DatabaseQueryFailed,
    DatabaseTransactionFailed,

    // Serialization Errors (1400-1499)
    SerializationError,
    DeserializationError,
    InvalidJson,

    // Configuration Errors (1500-1599)
    ConfigurationError,
    MissingConfiguration,
    InvalidConfiguration,

    // Internal Errors (9000-9999)
    InternalError,
    UnknownError,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::NotFound => 1000,
            Self::DuplicateRecord => 1001,
            Self::InvalidReference => 1002,
            Self::LastCreator => 1003,

            Self::Unauthorized => 1100,
            Self::Forbidden => 1101,
            Self::InvalidToken => 1102,
            Self::TokenExpired => 1103,

            Self::ValidationError => 1200,
            Self::InvalidInput => 1201,
            Self::QueryLimitExceeded => 1202,
            Self::CsrfRejected => 1203,

            Self::DatabaseError => 1300,
            Self::DatabaseConnectionFailed => 1301,
            Self::DatabaseQueryFailed => 1302,
            Self::DatabaseTransactionFailed => 1303,

            Self::SerializationError => 1400,
            Self::DeserializationError => 1401,
            Self::InvalidJson => 1402,

            Self::ConfigurationError => 1500,
            Self::MissingConfiguration => 1501,
            Self::InvalidConfiguration => 1502,

            Self::InternalError => 9000,
            Self::UnknownError => 9999,
        }
    }

    /// Get the HTTP status code for this error.
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DuplicateRecord | Self::LastCreator => StatusCode::CONFLICT,
            Self::InvalidReference | Self::ValidationError | Self::InvalidInput => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::QueryLimitExceeded | Self::InvalidJson | Self::DeserializationError => {
                StatusCode::BAD_REQUEST
            }

            Self::Unauthorized | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden | Self::CsrfRejected => StatusCode::FORBIDDEN,

            Self::DatabaseConnectionFailed => StatusCode::SERVICE_UNAVAILABLE,

            Self::DatabaseError
            | Self::DatabaseQueryFailed
            | Self::DatabaseTransactionFailed
            | Self::SerializationError
            | Self::ConfigurationError
            | Self::MissingConfiguration
            | Self::InvalidConfiguration
            | Self::InternalError
            | Self::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error is retryable.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseConnectionFailed | Self::DatabaseTransactionFailed
        )
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self.numeric_code() {
            1000..=1099 => "data",
            1100..=1199 => "auth",
            1200..=1299 => "request",
            1300..=1399 => "database",
            1400..=1499 => "serialization",
            1500..=1599 => "configuration",
            _ => "internal",
        }
    }

    /// The code as clients see it, e.g. `NOT_FOUND`.
    pub fn as_extension(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "UNKNOWN_ERROR".to_string())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity level for errors (affects logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Caller mistakes: bad input, missing rows, denied access
    Low,
    /// Credential problems worth noticing
    Medium,
    /// Storage and serialization failures
    High,
    /// Errors requiring immediate attention
    Critical,
}

impl ErrorSeverity {
    /// Get severity based on error code.
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::NotFound
            | ErrorCode::DuplicateRecord
            | ErrorCode::InvalidReference
            | ErrorCode::LastCreator
            | ErrorCode::Forbidden
            | ErrorCode::ValidationError
            | ErrorCode::InvalidInput
            | ErrorCode::QueryLimitExceeded
            | ErrorCode::CsrfRejected
            | ErrorCode::InvalidJson
            | ErrorCode::DeserializationError => Self::Low,

            ErrorCode::Unauthorized | ErrorCode::InvalidToken | ErrorCode::TokenExpired => {
                Self::Medium
            }

            ErrorCode::DatabaseError
            | ErrorCode::DatabaseQueryFailed
            | ErrorCode::DatabaseTransactionFailed
            | ErrorCode::SerializationError
            | ErrorCode::ConfigurationError
            | ErrorCode::MissingConfiguration
            | ErrorCode::InvalidConfiguration => Self::High,

            ErrorCode::DatabaseConnectionFailed
            | ErrorCode::InternalError
            | ErrorCode::UnknownError => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Details
// ═══════════════════════════════════════════════════════════════════════════════

/// Additional structured details about an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.context.is_empty() && self.entity_type.is_none() && self.entity_id.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for Kinetic Core.
#[derive(Error, Debug)]
pub struct KineticError {
    /// Machine-readable error code
    code: ErrorCode,

    /// Message safe to expose to clients
    user_message: Cow<'static, str>,

    /// Detailed internal message (for logging only)
    internal_message: Option<String>,

    /// Additional structured details
    details: ErrorDetails,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for KineticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl KineticError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            details: ErrorDetails::default(),
            source: None,
        };
        error.record_metrics();
        error
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Create an internal error (hides details from users).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An internal error occurred",
            message,
        )
    }

    /// A row addressed by id does not exist.
    pub fn not_found(entity_type: &str, entity_id: impl fmt::Display) -> Self {
        let entity_id = entity_id.to_string();
        Self::new(
            ErrorCode::NotFound,
            format!("{} {} not found", entity_type, entity_id),
        )
        .with_details(ErrorDetails::new().with_entity(entity_type, entity_id))
    }

    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_internal(
            ErrorCode::ConfigurationError,
            format!("Configuration error: {}", message),
            message,
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = details;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.details = self.details.with_context(key, value);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.to_string();
        let category = self.code.category();

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    source = ?self.source,
                    "Request failed"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    "Request rejected"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    user_message = %self.user_message,
                    "Request error"
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Metrics
    // ─────────────────────────────────────────────────────────────────────────

    fn record_metrics(&self) {
        counter!(
            "kinetic_errors_total",
            "code" => self.code.to_string(),
            "category" => self.code.category()
        )
        .increment(1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL
    // ─────────────────────────────────────────────────────────────────────────

    /// Convert into a GraphQL error carrying `extensions.code`.
    pub fn into_graphql(self) -> async_graphql::Error {
        self.extend()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GraphQL Integration
// ═══════════════════════════════════════════════════════════════════════════════

impl ErrorExtensions for KineticError {
    fn extend(&self) -> async_graphql::Error {
        self.log();

        let code = self.code.as_extension();
        let entity = self.details.entity_type.clone();
        async_graphql::Error::new(self.user_message.to_string()).extend_with(|_, e| {
            e.set("code", code);
            if let Some(entity) = entity {
                e.set("entity", entity);
            }
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error body for the plain HTTP endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub numeric_code: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&KineticError> for ErrorResponse {
    fn from(error: &KineticError) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: error.code,
                numeric_code: error.code.numeric_code(),
                message: error.user_message.to_string(),
                details: if error.details.is_empty() {
                    None
                } else {
                    Some(error.details.clone())
                },
                timestamp: chrono::Utc::now(),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Integration
// ═══════════════════════════════════════════════════════════════════════════════

impl IntoResponse for KineticError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.http_status();
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Context Extension Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    fn context(self, message: impl Into<String>) -> Result<T>;

    fn with_error_code(self, code: ErrorCode) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| KineticError::internal(message.into()).with_source(e))
    }

    fn with_error_code(self, code: ErrorCode) -> Result<T> {
        self.map_err(|e| KineticError::new(code, e.to_string()).with_source(e))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| KineticError::new(ErrorCode::NotFound, message.into()))
    }

    fn with_error_code(self, code: ErrorCode) -> Result<T> {
        self.ok_or_else(|| KineticError::new(code, "Resource not found"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations for Common Error Types
// ═══════════════════════════════════════════════════════════════════════════════

impl From<sqlx::Error> for KineticError {
    fn from(error: sqlx::Error) -> Self {
        let (code, user_msg) = match &error {
            sqlx::Error::RowNotFound => (ErrorCode::NotFound, "The requested record was not found"),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => (
                    ErrorCode::DuplicateRecord,
                    "A record with this identifier already exists",
                ),
                sqlx::error::ErrorKind::ForeignKeyViolation => (
                    ErrorCode::InvalidReference,
                    "A referenced record does not exist",
                ),
                sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    (ErrorCode::InvalidInput, "The record violates a data constraint")
                }
                _ => (ErrorCode::DatabaseQueryFailed, "A database error occurred"),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => (
                ErrorCode::DatabaseConnectionFailed,
                "Unable to connect to the database",
            ),
            _ => (ErrorCode::DatabaseError, "A database error occurred"),
        };

        Self::with_internal(code, user_msg, error.to_string()).with_source(error)
    }
}

impl From<sqlx::migrate::MigrateError> for KineticError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::with_internal(
            ErrorCode::DatabaseError,
            "Failed to apply database migrations",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<serde_json::Error> for KineticError {
    fn from(error: serde_json::Error) -> Self {
        let code = if error.is_syntax() || error.is_data() {
            ErrorCode::DeserializationError
        } else if error.is_eof() {
            ErrorCode::InvalidJson
        } else {
            ErrorCode::SerializationError
        };

        Self::with_internal(code, "Failed to process JSON data", error.to_string())
            .with_source(error)
    }
}

impl From<PolicyError> for KineticError {
    fn from(error: PolicyError) -> Self {
        Self::forbidden(error.to_string()).with_source(error)
    }
}

impl From<std::io::Error> for KineticError {
    fn from(error: std::io::Error) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An I/O error occurred",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<anyhow::Error> for KineticError {
    fn from(error: anyhow::Error) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An internal error occurred",
            format!("{:#}", error),
        )
    }
}

impl From<config::ConfigError> for KineticError {
    fn from(error: config::ConfigError) -> Self {
        let code = match &error {
            config::ConfigError::NotFound(_) => ErrorCode::MissingConfiguration,
            config::ConfigError::Type { .. } | config::ConfigError::Message(_) => {
                ErrorCode::InvalidConfiguration
            }
            _ => ErrorCode::ConfigurationError,
        };

        Self::with_internal(code, "Configuration error", error.to_string()).with_source(error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::PermissionAction;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Forbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::Unauthorized.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::LastCreator.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::NotFound.category(), "data");
        assert_eq!(ErrorCode::Forbidden.category(), "auth");
        assert_eq!(ErrorCode::QueryLimitExceeded.category(), "request");
        assert_eq!(ErrorCode::DatabaseQueryFailed.category(), "database");
        assert_eq!(ErrorCode::UnknownError.category(), "internal");
    }

    #[test]
    fn test_extension_code_is_screaming_snake() {
        assert_eq!(ErrorCode::NotFound.as_extension(), "NOT_FOUND");
        assert_eq!(ErrorCode::Forbidden.as_extension(), "FORBIDDEN");
        assert_eq!(ErrorCode::LastCreator.as_extension(), "LAST_CREATOR");
    }

    #[test]
    fn test_not_found_carries_entity() {
        let error = KineticError::not_found("Routine", 7);
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.user_message(), "Routine 7 not found");
        assert_eq!(error.details().entity_type.as_deref(), Some("Routine"));
        assert_eq!(error.details().entity_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_into_graphql_sets_code() {
        let error = KineticError::forbidden("nope").into_graphql();
        assert_eq!(error.message, "nope");
        let extensions = serde_json::to_value(&error.extensions).unwrap();
        assert_eq!(extensions["code"], "FORBIDDEN");
    }

    #[test]
    fn test_policy_error_maps_to_forbidden() {
        let error = KineticError::from(PolicyError::AuthorizationDenied {
            resource: "ROUTINE".to_string(),
            action: PermissionAction::Manage,
        });
        assert_eq!(error.code(), ErrorCode::Forbidden);
        assert!(error.user_message().contains("MANAGE"));
    }

    #[test]
    fn test_option_context() {
        let missing: Option<i32> = None;
        let error = missing.context("Session not found").unwrap_err();
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.user_message(), "Session not found");
    }

    #[test]
    fn test_error_response_serialization() {
        let error = KineticError::validation("take must be positive");
        let json = serde_json::to_string(&ErrorResponse::from(&error)).unwrap();
        assert!(json.contains("VALIDATION_ERROR"));
        assert!(json.contains("take must be positive"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(ErrorSeverity::from_code(&ErrorCode::Forbidden), ErrorSeverity::Low);
        assert_eq!(ErrorSeverity::from_code(&ErrorCode::InvalidToken), ErrorSeverity::Medium);
        assert_eq!(ErrorSeverity::from_code(&ErrorCode::DatabaseError), ErrorSeverity::High);
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::DatabaseConnectionFailed),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_error_display() {
        let error = KineticError::with_internal(
            ErrorCode::DatabaseError,
            "A database error occurred",
            "connection reset by peer",
        );

        let display = format!("{}", error);
        assert!(display.contains("DatabaseError"));
        assert!(display.contains("A database error occurred"));
        assert!(display.contains("connection reset by peer"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = KineticError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.code(), ErrorCode::NotFound);
    }
}
