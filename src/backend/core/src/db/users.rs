//! User queries.

use chrono::{DateTime, Utc};

use super::{Assignments, AuthProvider, Database, Gender, Page, Patch, UnitPreference, UserRow};
use crate::error::{KineticError, Result};

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub auth_provider: AuthProvider,
    pub auth_provider_id: Option<String>,
    pub preferred_units: UnitPreference,
    pub profile_picture_url: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Patch<String>,
    pub email: Patch<String>,
    pub profile_picture_url: Patch<String>,
    pub preferred_units: Patch<UnitPreference>,
    pub notifications_enabled: Patch<bool>,
    pub gender: Patch<Gender>,
    pub age: Patch<i32>,
    pub height: Patch<f64>,
    pub weight: Patch<f64>,
}

impl Database {
    pub async fn user(&self, id: i32) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Users matching the substring filters, newest first.
    pub async fn users(&self, filter: &UserFilter, page: Page) -> Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR username LIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR email LIKE '%' || $2 || '%')
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.username.as_deref())
        .bind(filter.email.as_deref())
        .bind(page.skip)
        .bind(page.take)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_user(&self, user: NewUser) -> Result<UserRow> {
        let now: DateTime<Utc> = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                username, email, auth_provider, auth_provider_id, preferred_units,
                profile_picture_url, notifications_enabled, gender, age, height, weight,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8, $9, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.auth_provider)
        .bind(user.auth_provider_id)
        .bind(user.preferred_units)
        .bind(user.profile_picture_url)
        .bind(user.gender)
        .bind(user.age)
        .bind(user.height)
        .bind(user.weight)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Apply the supplied changes and bump `updated_at`.
    pub async fn update_user(&self, id: i32, changes: UserChanges) -> Result<UserRow> {
        let mut set = Assignments::new("users");
        set.set("username", changes.username)
            .set("email", changes.email)
            .set("profile_picture_url", changes.profile_picture_url)
            .set("preferred_units", changes.preferred_units)
            .set("notifications_enabled", changes.notifications_enabled)
            .set("gender", changes.gender)
            .set("age", changes.age)
            .set("height", changes.height)
            .set("weight", changes.weight)
            .set_expr("updated_at", "NOW()");

        let mut query = set.where_clause();
        query.push("id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| KineticError::not_found("User", id))
    }

    /// Returns whether a row was removed.
    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
