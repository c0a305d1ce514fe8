//! Routines, their exercises and their members.

use async_graphql::{Context, MaybeUndefined, Object, ResultExt};

use super::db;
use super::scalars::JsonObject;
use crate::db::routines::{
    RoutineChanges, RoutineExerciseChanges, RoutineExerciseInput, RoutineFilter,
};
use crate::db::{
    Page, RoutineExerciseRow, RoutineRow, RoutineType, SkillLevel, UserRoutineRole,
    UserRoutineRow, UserRoutinesPage,
};
use crate::rbac::{resources, PermissionAction, RequirePermission};

type Result<T> = async_graphql::Result<T>;

#[derive(Default)]
pub struct RoutineQuery;

#[Object]
impl RoutineQuery {
    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine(&self, ctx: &Context<'_>, id: i32) -> Result<Option<RoutineRow>> {
        db(ctx)?.routine(id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routines(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 0)] skip: i32,
        #[graphql(default = 10)] take: i32,
        name: Option<String>,
        #[graphql(name = "type")] routine_type: Option<RoutineType>,
        skill_level: Option<SkillLevel>,
    ) -> Result<Vec<RoutineRow>> {
        let filter = RoutineFilter {
            name,
            routine_type,
            skill_level,
        };
        db(ctx)?.routines(&filter, Page::new(skip, take)).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine_exercises(
        &self,
        ctx: &Context<'_>,
        routine_id: i32,
    ) -> Result<Vec<RoutineExerciseRow>> {
        db(ctx)?.routine_exercises(routine_id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine_exercise(
        &self,
        ctx: &Context<'_>,
        routine_id: i32,
        exercise_id: i32,
    ) -> Result<Option<RoutineExerciseRow>> {
        db(ctx)?.routine_exercise(routine_id, exercise_id).await.extend()
    }

    /// A page of the routines `userId` belongs to.
    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn user_routines(
        &self,
        ctx: &Context<'_>,
        user_id: i32,
        #[graphql(default = 0)] skip: i32,
        #[graphql(default = 10)] take: i32,
        #[graphql(name = "type")] routine_type: Option<RoutineType>,
        skill_level: Option<SkillLevel>,
    ) -> Result<UserRoutinesPage> {
        db(ctx)?
            .user_routines(user_id, routine_type, skill_level, Page::new(skip, take))
            .await
            .extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::View)")]
    async fn routine_users(&self, ctx: &Context<'_>, routine_id: i32) -> Result<Vec<UserRoutineRow>> {
        db(ctx)?.memberships_for_routine(routine_id).await.extend()
    }
}

#[derive(Default)]
pub struct RoutineMutation;

#[Object]
impl RoutineMutation {
    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Create)")]
    async fn create_routine(
        &self,
        ctx: &Context<'_>,
        name: String,
        #[graphql(name = "type")] routine_type: RoutineType,
        skill_level: Option<SkillLevel>,
    ) -> Result<RoutineRow> {
        db(ctx)?
            .create_routine(name, routine_type, skill_level)
            .await
            .extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Edit)")]
    async fn update_routine(
        &self,
        ctx: &Context<'_>,
        id: i32,
        name: Option<String>,
        #[graphql(name = "type")] routine_type: Option<RoutineType>,
        skill_level: MaybeUndefined<SkillLevel>,
    ) -> Result<RoutineRow> {
        let changes = RoutineChanges {
            name: name.into(),
            routine_type: routine_type.into(),
            skill_level: skill_level.into(),
        };
        db(ctx)?.update_routine(id, changes).await.extend()
    }

    /// Also removes the routine's memberships and exercise entries.
    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Delete)")]
    async fn delete_routine(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        db(ctx)?.delete_routine(id).await.extend()
    }

    /// Add an exercise, or overwrite its entry when already present.
    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Edit)")]
    #[allow(clippy::too_many_arguments)]
    async fn add_exercise_to_routine(
        &self,
        ctx: &Context<'_>,
        routine_id: i32,
        exercise_id: i32,
        sets: JsonObject,
        notes: Option<String>,
        rest_time: Option<i32>,
        order: i32,
        rir: Option<i32>,
    ) -> Result<RoutineExerciseRow> {
        let input = RoutineExerciseInput {
            routine_id,
            exercise_id,
            sets,
            notes,
            rest_time,
            position: order,
            rir,
        };
        db(ctx)?.upsert_routine_exercise(input).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Edit)")]
    #[allow(clippy::too_many_arguments)]
    async fn update_routine_exercise(
        &self,
        ctx: &Context<'_>,
        routine_id: i32,
        exercise_id: i32,
        sets: Option<JsonObject>,
        notes: MaybeUndefined<String>,
        rest_time: MaybeUndefined<i32>,
        order: Option<i32>,
        rir: MaybeUndefined<i32>,
    ) -> Result<RoutineExerciseRow> {
        let changes = RoutineExerciseChanges {
            sets: sets.into(),
            notes: notes.into(),
            rest_time: rest_time.into(),
            position: order.into(),
            rir: rir.into(),
        };
        db(ctx)?
            .update_routine_exercise(routine_id, exercise_id, changes)
            .await
            .extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Edit)")]
    async fn remove_exercise_from_routine(
        &self,
        ctx: &Context<'_>,
        routine_id: i32,
        exercise_id: i32,
    ) -> Result<bool> {
        db(ctx)?
            .remove_routine_exercise(routine_id, exercise_id)
            .await
            .extend()
    }

    /// Add a member, or change an existing member's role.
    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Manage)")]
    async fn add_user_to_routine(
        &self,
        ctx: &Context<'_>,
        user_id: i32,
        routine_id: i32,
        role: UserRoutineRole,
    ) -> Result<UserRoutineRow> {
        db(ctx)?
            .add_user_to_routine(user_id, routine_id, role)
            .await
            .extend()
    }

    /// False when the user is not a member. A routine's last creator cannot leave.
    #[graphql(guard = "RequirePermission::new(resources::ROUTINE, PermissionAction::Manage)")]
    async fn remove_user_from_routine(
        &self,
        ctx: &Context<'_>,
        user_id: i32,
        routine_id: i32,
    ) -> Result<bool> {
        db(ctx)?
            .remove_user_from_routine(user_id, routine_id)
            .await
            .extend()
    }
}
