//! Ranked resource permissions.
//!
//! This module provides:
//! - **Models**: the five ranked [`PermissionAction`]s and `RESOURCE:ACTION` grants
//! - **Policy**: [`AuthorizationContext`], built per request from a principal's grants
//! - **Guard**: [`RequirePermission`], the GraphQL field guard that consults it
//!
//! # Usage
//!
//! ```rust,ignore
//! use kinetic_core::rbac::{AuthorizationContext, PermissionAction, PermissionGrant, resources};
//!
//! let grants = PermissionGrant::parse_all(["ROUTINE:CREATE"]);
//! let authz = AuthorizationContext::build(&grants);
//!
//! assert!(authz.is_authorized(resources::ROUTINE, PermissionAction::Edit));
//! assert!(!authz.is_authorized(resources::ROUTINE, PermissionAction::Delete));
//! ```

pub mod guard;
pub mod models;
pub mod policy;

pub use guard::RequirePermission;
pub use models::{
    resources, GrantParseError, PermissionAction, PermissionGrant, UnknownPermissionAction,
};
pub use policy::{
    build_authorization_context, is_authorized, AuthorizationContext, PolicyDecision,
    PolicyError, ResourceAuthPredicate,
};
