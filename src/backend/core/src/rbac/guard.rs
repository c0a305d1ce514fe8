//! GraphQL field guard that enforces ranked permissions.
//!
//! Reads the [`AuthorizationContext`] the HTTP handler attaches to each
//! request and rejects the field with a `FORBIDDEN` error when the principal
//! lacks the required action.

use async_graphql::{Context, ErrorExtensions, Guard};
use metrics::counter;

use super::models::PermissionAction;
use super::policy::{AuthorizationContext, PolicyDecision};
use crate::error::KineticError;

/// Field guard requiring `action` (or higher) on `resource`.
///
/// ```rust,ignore
/// #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Edit)")]
/// async fn update_routine(&self, ctx: &Context<'_>, id: ID) -> Result<RoutineRow> { .. }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequirePermission {
    resource: &'static str,
    action: PermissionAction,
}

impl RequirePermission {
    pub const fn new(resource: &'static str, action: PermissionAction) -> Self {
        Self { resource, action }
    }

    /// Evaluate against an optional context. A missing context denies.
    pub fn evaluate(&self, authz: Option<&AuthorizationContext>) -> PolicyDecision {
        match authz {
            Some(ctx) => ctx.check(self.resource, self.action),
            None => PolicyDecision::Deny("no authorization context on request".to_string()),
        }
    }
}

impl Guard for RequirePermission {
    async fn check(&self, ctx: &Context<'_>) -> async_graphql::Result<()> {
        match self.evaluate(ctx.data_opt::<AuthorizationContext>()) {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(_) => {
                counter!(
                    "kinetic_authz_denied_total",
                    "resource" => self.resource,
                    "action" => self.action.as_str()
                )
                .increment(1);

                // `extend` logs the rejection itself.
                Err(KineticError::forbidden(format!(
                    "Not authorized to {} {}",
                    self.action, self.resource
                ))
                .extend())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::models::{resources, PermissionGrant};
    use async_graphql::{EmptyMutation, EmptySubscription, Object, Request, Schema};

    struct Query;

    #[Object]
    impl Query {
        #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Edit)")]
        async fn secret(&self) -> i32 {
            42
        }

        async fn open(&self) -> i32 {
            1
        }
    }

    fn schema() -> Schema<Query, EmptyMutation, EmptySubscription> {
        Schema::new(Query, EmptyMutation, EmptySubscription)
    }

    #[test]
    fn test_evaluate_without_context_denies() {
        let guard = RequirePermission::new(resources::USER, PermissionAction::View);
        assert!(guard.evaluate(None).is_denied());
    }

    #[tokio::test]
    async fn test_guard_allows_higher_rank() {
        let grants = vec![PermissionGrant::new(resources::ROUTINE, PermissionAction::Manage)];
        let request = Request::new("{ secret }").data(AuthorizationContext::build(&grants));

        let response = schema().execute(request).await;
        assert!(response.errors.is_empty());
        assert_eq!(
            serde_json::to_value(&response.data).unwrap(),
            serde_json::json!({ "secret": 42 })
        );
    }

    #[tokio::test]
    async fn test_guard_denies_with_forbidden_code() {
        let grants = vec![PermissionGrant::new(resources::ROUTINE, PermissionAction::View)];
        let request = Request::new("{ secret }").data(AuthorizationContext::build(&grants));

        let response = schema().execute(request).await;
        assert_eq!(response.errors.len(), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["errors"][0]["extensions"]["code"], "FORBIDDEN");
        assert_eq!(json["errors"][0]["path"][0], "secret");
    }

    #[tokio::test]
    async fn test_unguarded_fields_ignore_grants() {
        let response = schema().execute(Request::new("{ open }")).await;
        assert!(response.errors.is_empty());
    }
}
