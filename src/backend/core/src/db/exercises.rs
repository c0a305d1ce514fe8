//! Exercise catalogue queries.

use super::{Assignments, Database, ExerciseRow, Page, Patch, TargetMuscle};
use crate::error::{KineticError, Result};
use crate::graphql::scalars::JsonObject;

#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub name: Option<String>,
    pub target_muscle: Option<TargetMuscle>,
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub target_muscle: TargetMuscle,
    pub icon_url: String,
    pub poster_url: String,
    pub instructions: Option<JsonObject>,
    pub cues: Option<JsonObject>,
    pub overview: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseChanges {
    pub name: Patch<String>,
    pub target_muscle: Patch<TargetMuscle>,
    pub icon_url: Patch<String>,
    pub poster_url: Patch<String>,
    pub instructions: Patch<JsonObject>,
    pub cues: Patch<JsonObject>,
    pub overview: Patch<String>,
}

impl Database {
    pub async fn exercise(&self, id: i32) -> Result<Option<ExerciseRow>> {
        let row = sqlx::query_as::<_, ExerciseRow>("SELECT * FROM exercises WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Exercises matching the filters, alphabetically.
    pub async fn exercises(&self, filter: &ExerciseFilter, page: Page) -> Result<Vec<ExerciseRow>> {
        let rows = sqlx::query_as::<_, ExerciseRow>(
            r#"
            SELECT * FROM exercises
            WHERE ($1::text IS NULL OR name LIKE '%' || $1 || '%')
              AND ($2::target_muscle IS NULL OR target_muscle = $2)
            ORDER BY name ASC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.name.as_deref())
        .bind(filter.target_muscle)
        .bind(page.skip)
        .bind(page.take)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_exercise(&self, exercise: NewExercise) -> Result<ExerciseRow> {
        let row = sqlx::query_as::<_, ExerciseRow>(
            r#"
            INSERT INTO exercises (name, target_muscle, icon_url, poster_url, instructions, cues, overview)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(exercise.name)
        .bind(exercise.target_muscle)
        .bind(exercise.icon_url)
        .bind(exercise.poster_url)
        .bind(exercise.instructions)
        .bind(exercise.cues)
        .bind(exercise.overview)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_exercise(&self, id: i32, changes: ExerciseChanges) -> Result<ExerciseRow> {
        let mut set = Assignments::new("exercises");
        set.set("name", changes.name)
            .set("target_muscle", changes.target_muscle)
            .set("icon_url", changes.icon_url)
            .set("poster_url", changes.poster_url)
            .set("instructions", changes.instructions)
            .set("cues", changes.cues)
            .set("overview", changes.overview);

        if set.is_empty() {
            return self
                .exercise(id)
                .await?
                .ok_or_else(|| KineticError::not_found("Exercise", id));
        }

        let mut query = set.where_clause();
        query.push("id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<ExerciseRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| KineticError::not_found("Exercise", id))
    }

    /// Delete an exercise and its routine entries in one transaction.
    pub async fn delete_exercise(&self, id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM routine_exercises WHERE exercise_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
