//! Routine, membership and routine-exercise queries.

use chrono::Utc;
use sqlx::{Postgres, Transaction};

use super::{
    Assignments, Database, Page, Patch, RoutineExerciseRow, RoutineRow, RoutineType, SkillLevel,
    UserRoutineRole, UserRoutineRow, UserRoutineSummaryRow, UserRoutinesPage,
};
use crate::error::{ErrorCode, KineticError, Result};
use crate::graphql::scalars::JsonObject;

#[derive(Debug, Clone, Default)]
pub struct RoutineFilter {
    pub name: Option<String>,
    pub routine_type: Option<RoutineType>,
    pub skill_level: Option<SkillLevel>,
}

#[derive(Debug, Clone, Default)]
pub struct RoutineChanges {
    pub name: Patch<String>,
    pub routine_type: Patch<RoutineType>,
    pub skill_level: Patch<SkillLevel>,
}

/// A full routine-exercise row as written by `addExerciseToRoutine`.
#[derive(Debug, Clone)]
pub struct RoutineExerciseInput {
    pub routine_id: i32,
    pub exercise_id: i32,
    pub sets: JsonObject,
    pub notes: Option<String>,
    pub rest_time: Option<i32>,
    pub position: i32,
    pub rir: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct RoutineExerciseChanges {
    pub sets: Patch<JsonObject>,
    pub notes: Patch<String>,
    pub rest_time: Patch<i32>,
    pub position: Patch<i32>,
    pub rir: Patch<i32>,
}

impl Database {
    // ═══════════════════════════════════════════════════════════════════════════
    // Routines
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn routine(&self, id: i32) -> Result<Option<RoutineRow>> {
        let row = sqlx::query_as::<_, RoutineRow>("SELECT * FROM routines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Routines matching the filters, newest first.
    pub async fn routines(&self, filter: &RoutineFilter, page: Page) -> Result<Vec<RoutineRow>> {
        let rows = sqlx::query_as::<_, RoutineRow>(
            r#"
            SELECT * FROM routines
            WHERE ($1::text IS NULL OR name LIKE '%' || $1 || '%')
              AND ($2::routine_type IS NULL OR routine_type = $2)
              AND ($3::skill_level IS NULL OR skill_level = $3)
            ORDER BY created_at DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(filter.name.as_deref())
        .bind(filter.routine_type)
        .bind(filter.skill_level)
        .bind(page.skip)
        .bind(page.take)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_routine(
        &self,
        name: String,
        routine_type: RoutineType,
        skill_level: Option<SkillLevel>,
    ) -> Result<RoutineRow> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, RoutineRow>(
            r#"
            INSERT INTO routines (name, routine_type, skill_level, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(routine_type)
        .bind(skill_level)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_routine(&self, id: i32, changes: RoutineChanges) -> Result<RoutineRow> {
        let mut set = Assignments::new("routines");
        set.set("name", changes.name)
            .set("routine_type", changes.routine_type)
            .set("skill_level", changes.skill_level)
            .set_expr("updated_at", "NOW()");

        let mut query = set.where_clause();
        query.push("id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<RoutineRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| KineticError::not_found("Routine", id))
    }

    /// Delete a routine with its memberships and exercises in one transaction.
    pub async fn delete_routine(&self, id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_routines WHERE routine_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM routine_exercises WHERE routine_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM routines WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Routine Exercises
    // ═══════════════════════════════════════════════════════════════════════════

    /// Exercises of a routine in their configured order.
    pub async fn routine_exercises(&self, routine_id: i32) -> Result<Vec<RoutineExerciseRow>> {
        let rows = sqlx::query_as::<_, RoutineExerciseRow>(
            "SELECT * FROM routine_exercises WHERE routine_id = $1 ORDER BY position ASC",
        )
        .bind(routine_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn routine_exercises_for_exercise(
        &self,
        exercise_id: i32,
    ) -> Result<Vec<RoutineExerciseRow>> {
        let rows = sqlx::query_as::<_, RoutineExerciseRow>(
            "SELECT * FROM routine_exercises WHERE exercise_id = $1 ORDER BY routine_id, position",
        )
        .bind(exercise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn routine_exercise(
        &self,
        routine_id: i32,
        exercise_id: i32,
    ) -> Result<Option<RoutineExerciseRow>> {
        let row = sqlx::query_as::<_, RoutineExerciseRow>(
            "SELECT * FROM routine_exercises WHERE routine_id = $1 AND exercise_id = $2",
        )
        .bind(routine_id)
        .bind(exercise_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert, or overwrite every column of an existing pair.
    pub async fn upsert_routine_exercise(
        &self,
        input: RoutineExerciseInput,
    ) -> Result<RoutineExerciseRow> {
        let row = sqlx::query_as::<_, RoutineExerciseRow>(
            r#"
            INSERT INTO routine_exercises (routine_id, exercise_id, sets, notes, rest_time, position, rir)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (routine_id, exercise_id) DO UPDATE
            SET sets = EXCLUDED.sets,
                notes = EXCLUDED.notes,
                rest_time = EXCLUDED.rest_time,
                position = EXCLUDED.position,
                rir = EXCLUDED.rir
            RETURNING *
            "#,
        )
        .bind(input.routine_id)
        .bind(input.exercise_id)
        .bind(input.sets)
        .bind(input.notes)
        .bind(input.rest_time)
        .bind(input.position)
        .bind(input.rir)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_routine_exercise(
        &self,
        routine_id: i32,
        exercise_id: i32,
        changes: RoutineExerciseChanges,
    ) -> Result<RoutineExerciseRow> {
        let mut set = Assignments::new("routine_exercises");
        set.set("sets", changes.sets)
            .set("notes", changes.notes)
            .set("rest_time", changes.rest_time)
            .set("position", changes.position)
            .set("rir", changes.rir);

        let missing = || {
            KineticError::not_found("RoutineExercise", format!("{routine_id}/{exercise_id}"))
        };

        if set.is_empty() {
            return self
                .routine_exercise(routine_id, exercise_id)
                .await?
                .ok_or_else(missing);
        }

        let mut query = set.where_clause();
        query
            .push("routine_id = ")
            .push_bind(routine_id)
            .push(" AND exercise_id = ")
            .push_bind(exercise_id)
            .push(" RETURNING *");

        query
            .build_query_as::<RoutineExerciseRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(missing)
    }

    pub async fn remove_routine_exercise(&self, routine_id: i32, exercise_id: i32) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM routine_exercises WHERE routine_id = $1 AND exercise_id = $2")
                .bind(routine_id)
                .bind(exercise_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Memberships
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn memberships_for_user(&self, user_id: i32) -> Result<Vec<UserRoutineRow>> {
        let rows = sqlx::query_as::<_, UserRoutineRow>(
            "SELECT * FROM user_routines WHERE user_id = $1 ORDER BY joined_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn memberships_for_routine(&self, routine_id: i32) -> Result<Vec<UserRoutineRow>> {
        let rows = sqlx::query_as::<_, UserRoutineRow>(
            "SELECT * FROM user_routines WHERE routine_id = $1 ORDER BY joined_at",
        )
        .bind(routine_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// One page of a user's routines, with per-routine exercise counts.
    ///
    /// `total_count` applies the same filters as the page itself; `has_more`
    /// comes from fetching one row past the page.
    pub async fn user_routines(
        &self,
        user_id: i32,
        routine_type: Option<RoutineType>,
        skill_level: Option<SkillLevel>,
        page: Page,
    ) -> Result<UserRoutinesPage> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM user_routines ur
            JOIN routines r ON r.id = ur.routine_id
            WHERE ur.user_id = $1
              AND ($2::routine_type IS NULL OR r.routine_type = $2)
              AND ($3::skill_level IS NULL OR r.skill_level = $3)
            "#,
        )
        .bind(user_id)
        .bind(routine_type)
        .bind(skill_level)
        .fetch_one(&self.pool)
        .await?;

        let mut routines = sqlx::query_as::<_, UserRoutineSummaryRow>(
            r#"
            SELECT r.id, r.name, r.routine_type, r.created_at, r.updated_at, r.skill_level,
                   (SELECT COUNT(*) FROM routine_exercises re WHERE re.routine_id = r.id)
                       AS exercise_count
            FROM user_routines ur
            JOIN routines r ON r.id = ur.routine_id
            WHERE ur.user_id = $1
              AND ($2::routine_type IS NULL OR r.routine_type = $2)
              AND ($3::skill_level IS NULL OR r.skill_level = $3)
            ORDER BY r.created_at DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(user_id)
        .bind(routine_type)
        .bind(skill_level)
        .bind(page.skip)
        .bind(page.take + 1)
        .fetch_all(&self.pool)
        .await?;

        let has_more = routines.len() as i64 > page.take;
        routines.truncate(page.take as usize);

        Ok(UserRoutinesPage {
            routines,
            total_count: i32::try_from(total).unwrap_or(i32::MAX),
            has_more,
        })
    }

    /// Add a member, or change the role of an existing one (keeping `joined_at`).
    ///
    /// Demoting the routine's only creator to participant fails.
    pub async fn add_user_to_routine(
        &self,
        user_id: i32,
        routine_id: i32,
        role: UserRoutineRole,
    ) -> Result<UserRoutineRow> {
        let mut tx = self.pool.begin().await?;

        if role != UserRoutineRole::Creator && lock_routine(&mut tx, routine_id).await? {
            let current = member_role(&mut tx, user_id, routine_id).await?;
            if current == Some(UserRoutineRole::Creator)
                && creator_count(&mut tx, routine_id).await? <= 1
            {
                return Err(last_creator());
            }
        }

        let row = sqlx::query_as::<_, UserRoutineRow>(
            r#"
            INSERT INTO user_routines (user_id, routine_id, role, joined_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, routine_id) DO UPDATE
            SET role = EXCLUDED.role
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(routine_id)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Remove a member. Fails when they are the routine's only creator.
    pub async fn remove_user_from_routine(&self, user_id: i32, routine_id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        if !lock_routine(&mut tx, routine_id).await? {
            return Ok(false);
        }

        let Some(role) = member_role(&mut tx, user_id, routine_id).await? else {
            return Ok(false);
        };

        if role == UserRoutineRole::Creator && creator_count(&mut tx, routine_id).await? <= 1 {
            return Err(last_creator());
        }

        let result = sqlx::query("DELETE FROM user_routines WHERE user_id = $1 AND routine_id = $2")
            .bind(user_id)
            .bind(routine_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Membership Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Lock the routine row so membership changes on one routine run one at a time.
/// False when the routine does not exist.
async fn lock_routine(tx: &mut Transaction<'_, Postgres>, routine_id: i32) -> Result<bool> {
    let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM routines WHERE id = $1 FOR UPDATE")
        .bind(routine_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(locked.is_some())
}

async fn member_role(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i32,
    routine_id: i32,
) -> Result<Option<UserRoutineRole>> {
    let role = sqlx::query_scalar(
        "SELECT role FROM user_routines WHERE user_id = $1 AND routine_id = $2",
    )
    .bind(user_id)
    .bind(routine_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(role)
}

async fn creator_count(tx: &mut Transaction<'_, Postgres>, routine_id: i32) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_routines WHERE routine_id = $1 AND role = 'Creator'",
    )
    .bind(routine_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(count)
}

fn last_creator() -> KineticError {
    KineticError::new(
        ErrorCode::LastCreator,
        "Cannot remove the only creator of a routine",
    )
}
