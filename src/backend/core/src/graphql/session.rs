//! Logged workout sessions, their exercises and sets.

use async_graphql::{Context, MaybeUndefined, Object, ResultExt};
use chrono::{DateTime, Utc};

use super::{db, principal_id};
use crate::db::sessions::{NewSession, SessionChanges, SessionFilter, SessionSetChanges};
use crate::db::{Page, SessionExerciseRow, SessionRow, SessionSetRow};
use crate::rbac::{resources, PermissionAction, RequirePermission};

type Result<T> = async_graphql::Result<T>;

#[derive(Default)]
pub struct SessionQuery;

#[Object]
impl SessionQuery {
    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::View)")]
    async fn session(&self, ctx: &Context<'_>, id: i32) -> Result<Option<SessionRow>> {
        db(ctx)?.session(id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::View)")]
    #[allow(clippy::too_many_arguments)]
    async fn sessions(
        &self,
        ctx: &Context<'_>,
        user_id: Option<i32>,
        routine_id: Option<i32>,
        #[graphql(default = 0)] skip: i32,
        #[graphql(default = 10)] take: i32,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<SessionRow>> {
        let filter = SessionFilter {
            user_id,
            routine_id,
            from_date,
            to_date,
        };
        db(ctx)?.sessions(&filter, Page::new(skip, take)).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::View)")]
    async fn session_exercise(
        &self,
        ctx: &Context<'_>,
        id: i32,
    ) -> Result<Option<SessionExerciseRow>> {
        db(ctx)?.session_exercise(id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::View)")]
    async fn session_exercises(
        &self,
        ctx: &Context<'_>,
        session_id: i32,
    ) -> Result<Vec<SessionExerciseRow>> {
        db(ctx)?.session_exercises(session_id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::View)")]
    async fn session_set(&self, ctx: &Context<'_>, id: i32) -> Result<Option<SessionSetRow>> {
        db(ctx)?.session_set(id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::View)")]
    async fn session_sets(
        &self,
        ctx: &Context<'_>,
        session_exercise_id: i32,
    ) -> Result<Vec<SessionSetRow>> {
        db(ctx)?.session_sets(session_exercise_id).await.extend()
    }
}

#[derive(Default)]
pub struct SessionMutation;

#[Object]
impl SessionMutation {
    /// Log a session for the calling user. `date` defaults to now.
    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::Create)")]
    async fn create_session(
        &self,
        ctx: &Context<'_>,
        routine_id: Option<i32>,
        name: Option<String>,
        date: Option<DateTime<Utc>>,
        duration: Option<i32>,
        notes: Option<String>,
    ) -> Result<SessionRow> {
        let user_id = principal_id(ctx)?;
        let session = NewSession {
            routine_id,
            name,
            date,
            duration,
            notes,
        };
        db(ctx)?.create_session(user_id, session).await.extend()
    }

    /// Update one of the calling user's sessions.
    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::Edit)")]
    #[allow(clippy::too_many_arguments)]
    async fn update_session(
        &self,
        ctx: &Context<'_>,
        id: i32,
        routine_id: MaybeUndefined<i32>,
        name: MaybeUndefined<String>,
        date: Option<DateTime<Utc>>,
        duration: MaybeUndefined<i32>,
        notes: MaybeUndefined<String>,
    ) -> Result<SessionRow> {
        let user_id = principal_id(ctx)?;
        let changes = SessionChanges {
            routine_id: routine_id.into(),
            name: name.into(),
            date: date.into(),
            duration: duration.into(),
            notes: notes.into(),
        };
        db(ctx)?.update_session(id, user_id, changes).await.extend()
    }

    /// False when the session does not exist or belongs to someone else.
    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::Delete)")]
    async fn delete_session(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        let user_id = principal_id(ctx)?;
        db(ctx)?.delete_session(id, user_id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::Create)")]
    async fn create_session_exercise(
        &self,
        ctx: &Context<'_>,
        session_id: i32,
        exercise_id: i32,
    ) -> Result<SessionExerciseRow> {
        db(ctx)?
            .create_session_exercise(session_id, exercise_id)
            .await
            .extend()
    }

    /// Also removes the exercise's sets.
    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::Delete)")]
    async fn delete_session_exercise(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        db(ctx)?.delete_session_exercise(id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::Create)")]
    async fn create_session_set(
        &self,
        ctx: &Context<'_>,
        session_exercise_id: i32,
        set_number: i32,
        reps: Option<i32>,
        weight: Option<f64>,
    ) -> Result<SessionSetRow> {
        db(ctx)?
            .create_session_set(session_exercise_id, set_number, reps, weight)
            .await
            .extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::Edit)")]
    async fn update_session_set(
        &self,
        ctx: &Context<'_>,
        id: i32,
        set_number: Option<i32>,
        reps: MaybeUndefined<i32>,
        weight: MaybeUndefined<f64>,
    ) -> Result<SessionSetRow> {
        let changes = SessionSetChanges {
            set_number: set_number.into(),
            reps: reps.into(),
            weight: weight.into(),
        };
        db(ctx)?.update_session_set(id, changes).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::SESSION, PermissionAction::Delete)")]
    async fn delete_session_set(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        db(ctx)?.delete_session_set(id).await.extend()
    }
}
