#![allow(clippy::result_large_err)]
//! # Kinetic Core
//!
//! GraphQL API for fitness tracking: users, routines, exercises and logged
//! workout sessions, guarded by ranked resource permissions.
//!
//! ## Architecture
//!
//! - **RBAC**: Ranked `RESOURCE:ACTION` grants and the per-request authorization context
//! - **GraphQL**: Schema, field guards, custom scalars and document cost limits
//! - **Database**: PostgreSQL persistence with cascading deletes and seed fixtures
//! - **Middleware**: JWT / API key authentication and CSRF prevention
//! - **Cache**: Short-lived response cache keyed by principal and grants
//! - **Observability**: Structured logging, distributed tracing and Prometheus metrics

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod middleware;
pub mod observability;
pub mod rbac;

pub use error::{ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, KineticError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{build_router, AppState};
    pub use crate::cache::{OperationKind, ResponseCache, ResponseCacheConfig};
    pub use crate::config::Config;
    pub use crate::db::{Database, Page, Patch};
    pub use crate::error::{ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, KineticError, Result};
    pub use crate::graphql::{build_schema, KineticSchema, QueryLimits, QueryLimitsConfig};
    pub use crate::middleware::{
        AuthConfig, AuthContext, AuthError, AuthLayer, AuthMethod, Claims, CsrfConfig, CsrfLayer,
    };
    pub use crate::rbac::{
        resources, AuthorizationContext, PermissionAction, PermissionGrant, PolicyDecision,
        PolicyError, RequirePermission,
    };
}
