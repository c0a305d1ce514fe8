//! Per-request authorization decisions.
//!
//! An [`AuthorizationContext`] is built once per request from the principal's
//! grants. It holds one [`ResourceAuthPredicate`] per resource the principal
//! has any grant for, carrying the highest-ranked action granted on it.
//! Everything not named is denied.

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use super::models::{PermissionAction, PermissionGrant};

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from the policy layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Not authorized to {action} {resource}")]
    AuthorizationDenied {
        resource: String,
        action: PermissionAction,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The action is allowed.
    Allow,
    /// The action is denied, with a reason.
    Deny(String),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resource Predicate
// ═══════════════════════════════════════════════════════════════════════════════

/// Answers "may this principal perform `required` on one resource?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceAuthPredicate {
    granted: PermissionAction,
}

impl ResourceAuthPredicate {
    pub const fn new(granted: PermissionAction) -> Self {
        Self { granted }
    }

    /// Highest action granted on the resource.
    pub const fn granted(&self) -> PermissionAction {
        self.granted
    }

    pub const fn allows(&self, required: PermissionAction) -> bool {
        self.granted.satisfies(required)
    }

    fn widen(&mut self, other: PermissionAction) {
        if other > self.granted {
            self.granted = other;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Authorization Context
// ═══════════════════════════════════════════════════════════════════════════════

/// Immutable mapping from resource name to predicate for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    predicates: HashMap<String, ResourceAuthPredicate>,
}

impl AuthorizationContext {
    /// A context that denies everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a principal's grants.
    ///
    /// Several grants on the same resource collapse to the highest-ranked
    /// one, so grant order never matters.
    pub fn build<'a, I>(grants: I) -> Self
    where
        I: IntoIterator<Item = &'a PermissionGrant>,
    {
        let mut predicates: HashMap<String, ResourceAuthPredicate> = HashMap::new();

        for grant in grants {
            predicates
                .entry(grant.resource.clone())
                .and_modify(|p| p.widen(grant.action))
                .or_insert_with(|| ResourceAuthPredicate::new(grant.action));
        }

        debug!(resources = predicates.len(), "Built authorization context");
        Self { predicates }
    }

    /// Predicate for a resource, if the principal holds any grant on it.
    pub fn predicate(&self, resource: &str) -> Option<&ResourceAuthPredicate> {
        self.predicates.get(resource)
    }

    /// Default-deny check: resources without a predicate are never allowed.
    pub fn is_authorized(&self, resource: &str, required: PermissionAction) -> bool {
        self.predicate(resource)
            .map(|p| p.allows(required))
            .unwrap_or(false)
    }

    /// Same as [`is_authorized`](Self::is_authorized) but with a reason on denial.
    pub fn check(&self, resource: &str, required: PermissionAction) -> PolicyDecision {
        match self.predicate(resource) {
            Some(p) if p.allows(required) => PolicyDecision::Allow,
            Some(p) => PolicyDecision::Deny(format!(
                "{} requires {} but only {} is granted",
                resource,
                required,
                p.granted()
            )),
            None => PolicyDecision::Deny(format!("no grant on {}", resource)),
        }
    }

    pub fn enforce(&self, resource: &str, required: PermissionAction) -> Result<(), PolicyError> {
        if self.is_authorized(resource, required) {
            Ok(())
        } else {
            Err(PolicyError::AuthorizationDenied {
                resource: resource.to_string(),
                action: required,
            })
        }
    }

    /// Resources with a predicate and the action granted on each.
    pub fn resources(&self) -> impl Iterator<Item = (&str, PermissionAction)> {
        self.predicates.iter().map(|(r, p)| (r.as_str(), p.granted()))
    }

    /// Stable textual form, sorted by resource, for use in cache keys.
    pub fn fingerprint(&self) -> String {
        let mut entries: Vec<String> = self
            .resources()
            .map(|(resource, action)| format!("{}:{}", resource, action))
            .collect();
        entries.sort_unstable();
        entries.join(",")
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Build an authorization context from a slice of grants.
pub fn build_authorization_context(grants: &[PermissionGrant]) -> AuthorizationContext {
    AuthorizationContext::build(grants)
}

/// Whether `context` authorizes `action` on `resource`.
pub fn is_authorized(
    context: &AuthorizationContext,
    resource: &str,
    action: PermissionAction,
) -> bool {
    context.is_authorized(resource, action)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::models::resources;

    fn grant(resource: &str, action: PermissionAction) -> PermissionGrant {
        PermissionGrant::new(resource, action)
    }

    #[test]
    fn test_empty_grants_deny_everything() {
        let ctx = build_authorization_context(&[]);
        assert!(ctx.is_empty());
        for resource in resources::ALL {
            for action in PermissionAction::ALL {
                assert!(!ctx.is_authorized(resource, action));
            }
        }
    }

    #[test]
    fn test_higher_rank_implies_lower() {
        let ctx = build_authorization_context(&[grant(resources::ROUTINE, PermissionAction::Create)]);

        assert!(ctx.is_authorized(resources::ROUTINE, PermissionAction::View));
        assert!(ctx.is_authorized(resources::ROUTINE, PermissionAction::Edit));
        assert!(ctx.is_authorized(resources::ROUTINE, PermissionAction::Create));
        assert!(!ctx.is_authorized(resources::ROUTINE, PermissionAction::Delete));
        assert!(!ctx.is_authorized(resources::ROUTINE, PermissionAction::Manage));
    }

    #[test]
    fn test_manage_allows_all() {
        let ctx = build_authorization_context(&[grant(resources::USER, PermissionAction::Manage)]);
        for action in PermissionAction::ALL {
            assert!(ctx.is_authorized(resources::USER, action));
        }
    }

    #[test]
    fn test_resources_do_not_leak() {
        let ctx = build_authorization_context(&[grant(resources::SESSION, PermissionAction::Manage)]);
        assert!(!ctx.is_authorized(resources::USER, PermissionAction::View));
        assert!(!ctx.is_authorized(resources::EXERCISE, PermissionAction::View));
        assert!(!ctx.is_authorized("UNKNOWN", PermissionAction::View));
    }

    #[test]
    fn test_duplicate_resource_keeps_max_rank() {
        let forward = build_authorization_context(&[
            grant(resources::USER, PermissionAction::View),
            grant(resources::USER, PermissionAction::Delete),
        ]);
        let reverse = build_authorization_context(&[
            grant(resources::USER, PermissionAction::Delete),
            grant(resources::USER, PermissionAction::View),
        ]);

        assert_eq!(forward, reverse);
        assert_eq!(
            forward.predicate(resources::USER).map(|p| p.granted()),
            Some(PermissionAction::Delete)
        );
        assert!(forward.is_authorized(resources::USER, PermissionAction::Delete));
        assert!(!forward.is_authorized(resources::USER, PermissionAction::Manage));
    }

    #[test]
    fn test_view_then_manage_authorizes_delete() {
        let ctx = build_authorization_context(&[
            grant(resources::ROUTINE, PermissionAction::View),
            grant(resources::ROUTINE, PermissionAction::Manage),
        ]);
        assert!(ctx.is_authorized(resources::ROUTINE, PermissionAction::Delete));
        assert!(ctx.is_authorized(resources::ROUTINE, PermissionAction::Manage));
    }

    #[test]
    fn test_build_is_idempotent() {
        let grants = [
            grant(resources::USER, PermissionAction::Edit),
            grant(resources::ROUTINE, PermissionAction::View),
            grant(resources::ROUTINE, PermissionAction::Manage),
            grant(resources::SESSION, PermissionAction::Create),
        ];
        let first = build_authorization_context(&grants);
        let second = build_authorization_context(&grants);

        assert_eq!(first, second);
        for resource in resources::ALL {
            for action in PermissionAction::ALL {
                assert_eq!(
                    first.is_authorized(resource, action),
                    second.is_authorized(resource, action),
                    "{resource} {action}"
                );
            }
        }
    }

    #[test]
    fn test_only_granted_resources_get_predicates() {
        let ctx = build_authorization_context(&[
            grant(resources::USER, PermissionAction::View),
            grant(resources::EXERCISE, PermissionAction::Edit),
            grant(resources::USER, PermissionAction::Edit),
        ]);
        assert_eq!(ctx.len(), 2);
        assert!(ctx.predicate(resources::ROUTINE).is_none());
        assert!(ctx.predicate(resources::SESSION).is_none());
    }

    #[test]
    fn test_unknown_resources_are_carried_but_harmless() {
        let ctx = build_authorization_context(&[grant("BILLING", PermissionAction::Manage)]);
        assert!(ctx.is_authorized("BILLING", PermissionAction::View));
        for resource in resources::ALL {
            assert!(!ctx.is_authorized(resource, PermissionAction::View));
        }
    }

    #[test]
    fn test_check_reports_reason() {
        let ctx = build_authorization_context(&[grant(resources::ROUTINE, PermissionAction::Edit)]);

        assert_eq!(
            ctx.check(resources::ROUTINE, PermissionAction::Edit),
            PolicyDecision::Allow
        );

        let denied = ctx.check(resources::ROUTINE, PermissionAction::Manage);
        assert!(denied.is_denied());
        assert!(matches!(denied, PolicyDecision::Deny(ref r) if r.contains("MANAGE")));

        assert!(ctx.check(resources::USER, PermissionAction::View).is_denied());
    }

    #[test]
    fn test_enforce() {
        let ctx = build_authorization_context(&[grant(resources::EXERCISE, PermissionAction::Delete)]);
        assert!(ctx.enforce(resources::EXERCISE, PermissionAction::Delete).is_ok());
        assert_eq!(
            ctx.enforce(resources::EXERCISE, PermissionAction::Manage),
            Err(PolicyError::AuthorizationDenied {
                resource: resources::EXERCISE.to_string(),
                action: PermissionAction::Manage,
            })
        );
    }

    #[test]
    fn test_free_function_matches_method() {
        let ctx = build_authorization_context(&[grant(resources::SESSION, PermissionAction::Edit)]);
        for action in PermissionAction::ALL {
            assert_eq!(
                is_authorized(&ctx, resources::SESSION, action),
                ctx.is_authorized(resources::SESSION, action)
            );
        }
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let a = build_authorization_context(&[
            grant(resources::USER, PermissionAction::View),
            grant(resources::ROUTINE, PermissionAction::Manage),
        ]);
        let b = build_authorization_context(&[
            grant(resources::ROUTINE, PermissionAction::Manage),
            grant(resources::USER, PermissionAction::View),
        ]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), "ROUTINE:MANAGE,USER:VIEW");
    }
}
