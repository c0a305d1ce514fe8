//! Workout session log queries.
//!
//! Sessions belong to the user who created them; updates and deletes are
//! scoped to that owner.

use chrono::{DateTime, Utc};

use super::{Assignments, Database, Page, Patch, SessionExerciseRow, SessionRow, SessionSetRow};
use crate::error::{KineticError, Result};

#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub user_id: Option<i32>,
    pub routine_id: Option<i32>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub routine_id: Option<i32>,
    pub name: Option<String>,
    /// Defaults to now
    pub date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionChanges {
    pub routine_id: Patch<i32>,
    pub name: Patch<String>,
    pub date: Patch<DateTime<Utc>>,
    pub duration: Patch<i32>,
    pub notes: Patch<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionSetChanges {
    pub set_number: Patch<i32>,
    pub reps: Patch<i32>,
    pub weight: Patch<f64>,
}

impl Database {
    // ═══════════════════════════════════════════════════════════════════════════
    // Sessions
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn session(&self, id: i32) -> Result<Option<SessionRow>> {
        let row = sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Sessions matching the filters, most recent first.
    pub async fn sessions(&self, filter: &SessionFilter, page: Page) -> Result<Vec<SessionRow>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT * FROM sessions
            WHERE ($1::int4 IS NULL OR user_id = $1)
              AND ($2::int4 IS NULL OR routine_id = $2)
              AND ($3::timestamptz IS NULL OR date >= $3)
              AND ($4::timestamptz IS NULL OR date <= $4)
            ORDER BY date DESC
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.routine_id)
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(page.skip)
        .bind(page.take)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_session(&self, user_id: i32, session: NewSession) -> Result<SessionRow> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO sessions (user_id, routine_id, name, date, duration, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(session.routine_id)
        .bind(session.name)
        .bind(session.date.unwrap_or_else(Utc::now))
        .bind(session.duration)
        .bind(session.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update a session owned by `user_id`; anyone else's session is not found.
    pub async fn update_session(
        &self,
        id: i32,
        user_id: i32,
        changes: SessionChanges,
    ) -> Result<SessionRow> {
        let mut set = Assignments::new("sessions");
        set.set("routine_id", changes.routine_id)
            .set("name", changes.name)
            .set("date", changes.date)
            .set("duration", changes.duration)
            .set("notes", changes.notes);

        if set.is_empty() {
            return self
                .session(id)
                .await?
                .filter(|s| s.user_id == user_id)
                .ok_or_else(|| KineticError::not_found("Session", id));
        }

        let mut query = set.where_clause();
        query
            .push("id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(user_id)
            .push(" RETURNING *");

        query
            .build_query_as::<SessionRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| KineticError::not_found("Session", id))
    }

    /// Delete an owned session with its exercises and sets in one transaction.
    /// Returns false when the session is absent or owned by someone else.
    pub async fn delete_session(&self, id: i32, user_id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<i32> =
            sqlx::query_scalar("SELECT id FROM sessions WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Ok(false);
        }

        sqlx::query(
            r#"
            DELETE FROM session_sets
            WHERE session_exercise_id IN (SELECT id FROM session_exercises WHERE session_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM session_exercises WHERE session_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Session Exercises
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn session_exercise(&self, id: i32) -> Result<Option<SessionExerciseRow>> {
        let row =
            sqlx::query_as::<_, SessionExerciseRow>("SELECT * FROM session_exercises WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    pub async fn session_exercises(&self, session_id: i32) -> Result<Vec<SessionExerciseRow>> {
        let rows = sqlx::query_as::<_, SessionExerciseRow>(
            "SELECT * FROM session_exercises WHERE session_id = $1 ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_session_exercise(
        &self,
        session_id: i32,
        exercise_id: i32,
    ) -> Result<SessionExerciseRow> {
        let row = sqlx::query_as::<_, SessionExerciseRow>(
            "INSERT INTO session_exercises (session_id, exercise_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(session_id)
        .bind(exercise_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a session exercise and its sets in one transaction.
    pub async fn delete_session_exercise(&self, id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM session_sets WHERE session_exercise_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM session_exercises WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Session Sets
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn session_set(&self, id: i32) -> Result<Option<SessionSetRow>> {
        let row = sqlx::query_as::<_, SessionSetRow>("SELECT * FROM session_sets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Sets of one session exercise by set number.
    pub async fn session_sets(&self, session_exercise_id: i32) -> Result<Vec<SessionSetRow>> {
        let rows = sqlx::query_as::<_, SessionSetRow>(
            "SELECT * FROM session_sets WHERE session_exercise_id = $1 ORDER BY set_number ASC",
        )
        .bind(session_exercise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_session_set(
        &self,
        session_exercise_id: i32,
        set_number: i32,
        reps: Option<i32>,
        weight: Option<f64>,
    ) -> Result<SessionSetRow> {
        let row = sqlx::query_as::<_, SessionSetRow>(
            r#"
            INSERT INTO session_sets (session_exercise_id, set_number, reps, weight)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(session_exercise_id)
        .bind(set_number)
        .bind(reps)
        .bind(weight)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_session_set(
        &self,
        id: i32,
        changes: SessionSetChanges,
    ) -> Result<SessionSetRow> {
        let mut set = Assignments::new("session_sets");
        set.set("set_number", changes.set_number)
            .set("reps", changes.reps)
            .set("weight", changes.weight);

        if set.is_empty() {
            return self
                .session_set(id)
                .await?
                .ok_or_else(|| KineticError::not_found("SessionSet", id));
        }

        let mut query = set.where_clause();
        query.push("id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<SessionSetRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| KineticError::not_found("SessionSet", id))
    }

    pub async fn delete_session_set(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM session_sets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
