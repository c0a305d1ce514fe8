//! Exercise catalogue.

use async_graphql::{Context, MaybeUndefined, Object, ResultExt};

use super::db;
use super::scalars::JsonObject;
use crate::db::exercises::{ExerciseChanges, ExerciseFilter, NewExercise};
use crate::db::{ExerciseRow, Page, TargetMuscle};
use crate::rbac::{resources, PermissionAction, RequirePermission};

type Result<T> = async_graphql::Result<T>;

#[derive(Default)]
pub struct ExerciseQuery;

#[Object]
impl ExerciseQuery {
    #[graphql(guard = "RequirePermission::new(resources::EXERCISE, PermissionAction::View)")]
    async fn exercise(&self, ctx: &Context<'_>, id: i32) -> Result<Option<ExerciseRow>> {
        db(ctx)?.exercise(id).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::EXERCISE, PermissionAction::View)")]
    async fn exercises(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 0)] skip: i32,
        #[graphql(default = 10)] take: i32,
        name: Option<String>,
        target_muscle: Option<TargetMuscle>,
    ) -> Result<Vec<ExerciseRow>> {
        let filter = ExerciseFilter {
            name,
            target_muscle,
        };
        db(ctx)?.exercises(&filter, Page::new(skip, take)).await.extend()
    }
}

#[derive(Default)]
pub struct ExerciseMutation;

#[Object]
impl ExerciseMutation {
    #[graphql(guard = "RequirePermission::new(resources::EXERCISE, PermissionAction::Create)")]
    #[allow(clippy::too_many_arguments)]
    async fn create_exercise(
        &self,
        ctx: &Context<'_>,
        name: String,
        target_muscle: TargetMuscle,
        icon_url: String,
        poster_url: String,
        instructions: Option<JsonObject>,
        cues: Option<JsonObject>,
        overview: Option<String>,
    ) -> Result<ExerciseRow> {
        let exercise = NewExercise {
            name,
            target_muscle,
            icon_url,
            poster_url,
            instructions,
            cues,
            overview,
        };
        db(ctx)?.create_exercise(exercise).await.extend()
    }

    #[graphql(guard = "RequirePermission::new(resources::EXERCISE, PermissionAction::Edit)")]
    #[allow(clippy::too_many_arguments)]
    async fn update_exercise(
        &self,
        ctx: &Context<'_>,
        id: i32,
        name: Option<String>,
        target_muscle: Option<TargetMuscle>,
        icon_url: Option<String>,
        poster_url: Option<String>,
        instructions: MaybeUndefined<JsonObject>,
        cues: MaybeUndefined<JsonObject>,
        overview: MaybeUndefined<String>,
    ) -> Result<ExerciseRow> {
        let changes = ExerciseChanges {
            name: name.into(),
            target_muscle: target_muscle.into(),
            icon_url: icon_url.into(),
            poster_url: poster_url.into(),
            instructions: instructions.into(),
            cues: cues.into(),
            overview: overview.into(),
        };
        db(ctx)?.update_exercise(id, changes).await.extend()
    }

    /// Also removes the exercise from every routine.
    #[graphql(guard = "RequirePermission::new(resources::EXERCISE, PermissionAction::Delete)")]
    async fn delete_exercise(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        db(ctx)?.delete_exercise(id).await.extend()
    }
}
