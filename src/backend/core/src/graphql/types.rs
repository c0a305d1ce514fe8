//! Ids and relation fields for the row objects.
//!
//! Every relation that crosses into another resource carries that resource's
//! VIEW guard, so `{ user { userRoutines { routine } } }` needs USER and
//! ROUTINE access.

use async_graphql::{ComplexObject, Context, ResultExt, ID};

use super::db;
use crate::db::{
    ExerciseRow, RoutineExerciseRow, RoutineRow, SessionExerciseRow, SessionRow, SessionSetRow,
    UserRoutineRow, UserRoutineSummaryRow, UserRow,
};
use crate::rbac::{resources, PermissionAction, RequirePermission};

type Result<T> = async_graphql::Result<T>;

#[ComplexObject]
impl UserRow {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn user_routines(&self, ctx: &Context<'_>) -> Result<Vec<UserRoutineRow>> {
        db(ctx)?.memberships_for_user(self.id).await.extend()
    }
}

#[ComplexObject]
impl RoutineRow {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn user_routines(&self, ctx: &Context<'_>) -> Result<Vec<UserRoutineRow>> {
        db(ctx)?.memberships_for_routine(self.id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine_exercises(&self, ctx: &Context<'_>) -> Result<Vec<RoutineExerciseRow>> {
        db(ctx)?.routine_exercises(self.id).await.extend()
    }
}

#[ComplexObject]
impl UserRoutineSummaryRow {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn exercise_count(&self) -> i32 {
        i32::try_from(self.exercise_count).unwrap_or(i32::MAX)
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn user_routines(&self, ctx: &Context<'_>) -> Result<Vec<UserRoutineRow>> {
        db(ctx)?.memberships_for_routine(self.id).await.extend()
    }
}

#[ComplexObject]
impl ExerciseRow {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine_exercises(&self, ctx: &Context<'_>) -> Result<Vec<RoutineExerciseRow>> {
        db(ctx)?.routine_exercises_for_exercise(self.id).await.extend()
    }
}

#[ComplexObject]
impl UserRoutineRow {
    #[graphql(guard = "RequirePermission::new(resources::USER, PermissionAction::View)")]
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<UserRow>> {
        db(ctx)?.user(self.user_id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine(&self, ctx: &Context<'_>) -> Result<Option<RoutineRow>> {
        db(ctx)?.routine(self.routine_id).await.extend()
    }
}

#[ComplexObject]
impl RoutineExerciseRow {
    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine(&self, ctx: &Context<'_>) -> Result<Option<RoutineRow>> {
        db(ctx)?.routine(self.routine_id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::EXERCISE, PermissionAction::View)")]
    async fn exercise(&self, ctx: &Context<'_>) -> Result<Option<ExerciseRow>> {
        db(ctx)?.exercise(self.exercise_id).await.extend()
    }
}

#[ComplexObject]
impl SessionRow {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    #[graphql(guard = "RequirePermission::new(resources::USER, PermissionAction::View)")]
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<UserRow>> {
        db(ctx)?.user(self.user_id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine(&self, ctx: &Context<'_>) -> Result<Option<RoutineRow>> {
        match self.routine_id {
            Some(id) => db(ctx)?.routine(id).await.extend(),
            None => Ok(None),
        }
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::View)")]
    async fn session_exercises(&self, ctx: &Context<'_>) -> Result<Vec<SessionExerciseRow>> {
        db(ctx)?.session_exercises(self.id).await.extend()
    }
}

#[ComplexObject]
impl SessionExerciseRow {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    #[graphql(guard = "RequirePermission::new(resources::EXERCISE, PermissionAction::View)")]
    async fn exercise(&self, ctx: &Context<'_>) -> Result<Option<ExerciseRow>> {
        db(ctx)?.exercise(self.exercise_id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::View)")]
    async fn session_sets(&self, ctx: &Context<'_>) -> Result<Vec<SessionSetRow>> {
        db(ctx)?.session_sets(self.id).await.extend()
    }
}

#[ComplexObject]
impl SessionSetRow {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }
}
