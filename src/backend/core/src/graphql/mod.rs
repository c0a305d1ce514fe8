//! GraphQL schema.
//!
//! The schema is assembled once at startup by [`build_schema`] and is
//! immutable afterwards. Per request the HTTP handler attaches:
//! - the [`AuthContext`] of the caller (for `me` and session ownership)
//! - the [`AuthorizationContext`](crate::rbac::AuthorizationContext) built
//!   from its grants, which every [`RequirePermission`](crate::rbac::RequirePermission)
//!   guard consults

use async_graphql::{Context, EmptySubscription, MergedObject, Schema};

use crate::db::Database;
use crate::error::KineticError;
use crate::middleware::auth::AuthContext;

pub mod exercise;
pub mod limits;
pub mod routine;
pub mod scalars;
pub mod session;
pub mod types;
pub mod user;

pub use limits::{QueryLimits, QueryLimitsConfig};

#[derive(MergedObject, Default)]
pub struct QueryRoot(
    user::UserQuery,
    routine::RoutineQuery,
    exercise::ExerciseQuery,
    session::SessionQuery,
);

#[derive(MergedObject, Default)]
pub struct MutationRoot(
    user::UserMutation,
    routine::RoutineMutation,
    exercise::ExerciseMutation,
    session::SessionMutation,
);

pub type KineticSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the frozen schema with its cost limits.
pub fn build_schema(db: Database, limits: &QueryLimitsConfig) -> KineticSchema {
    let mut builder = Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(db)
        .limit_depth(limits.max_depth)
        .limit_complexity(limits.max_complexity)
        .extension(QueryLimits::new(limits.clone()));

    if !limits.introspection {
        builder = builder.disable_introspection();
    }

    builder.finish()
}

/// Schema definition language for the API, without needing a database.
pub fn sdl() -> String {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .finish()
        .sdl()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resolver Helpers
// ═══════════════════════════════════════════════════════════════════════════════

pub(crate) fn db<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Database> {
    ctx.data::<Database>()
}

pub(crate) fn principal<'a>(ctx: &Context<'a>) -> Option<&'a AuthContext> {
    ctx.data_opt::<AuthContext>()
}

/// The calling user's id; operations that act "as the caller" need one.
pub(crate) fn principal_id(ctx: &Context<'_>) -> async_graphql::Result<i32> {
    principal(ctx)
        .and_then(|p| p.user_id)
        .ok_or_else(|| KineticError::unauthorized("This operation requires a signed-in user").into_graphql())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdl_names_match_the_public_api() {
        let sdl = sdl();
        for name in [
            "scalar JSONObject",
            "type UserRoutinesResult",
            "type UserRoutinesRoutine",
            "enum SkillLevel",
            "AllLevels",
            "userRoutines(",
            "addUserToRoutine(",
            "removeUserFromRoutine(",
            "exerciseCount: Int!",
            "order: Int!",
        ] {
            assert!(sdl.contains(name), "schema is missing {name}");
        }
    }

    #[test]
    fn test_routine_type_field_is_named_type() {
        let sdl = sdl();
        assert!(sdl.contains("type: RoutineType!"));
        assert!(!sdl.contains("routineType"));
    }
}
