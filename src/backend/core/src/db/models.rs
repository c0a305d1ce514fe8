//! Row types and Postgres enums.
//!
//! Rows double as GraphQL objects: plain columns are exposed directly, ids
//! and relation fields are added by the `ComplexObject` impls in
//! `crate::graphql::types`.

use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graphql::scalars::JsonObject;

// ═══════════════════════════════════════════════════════════════════════════════
// Enums
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Enum, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
#[sqlx(type_name = "auth_provider")]
pub enum AuthProvider {
    Email,
    Google,
    Apple,
}

#[derive(Enum, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
#[sqlx(type_name = "unit_preference")]
pub enum UnitPreference {
    Metric,
    Imperial,
}

#[derive(Enum, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
#[sqlx(type_name = "gender")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Enum, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
#[sqlx(type_name = "user_routine_role")]
pub enum UserRoutineRole {
    Creator,
    Participant,
}

#[derive(Enum, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
#[sqlx(type_name = "skill_level")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    AllLevels,
}

#[derive(Enum, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
#[sqlx(type_name = "target_muscle")]
pub enum TargetMuscle {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
}

#[derive(Enum, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[graphql(rename_items = "PascalCase")]
#[sqlx(type_name = "routine_type")]
pub enum RoutineType {
    Strength,
    Endurance,
    Flexibility,
    Balance,
    Mobility,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rows
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "User", complex)]
pub struct UserRow {
    #[graphql(skip)]
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile_picture_url: Option<String>,
    pub auth_provider: AuthProvider,
    pub auth_provider_id: Option<String>,
    pub preferred_units: UnitPreference,
    pub notifications_enabled: bool,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "Routine", complex)]
pub struct RoutineRow {
    #[graphql(skip)]
    pub id: i32,
    pub name: String,
    #[graphql(name = "type")]
    pub routine_type: RoutineType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub skill_level: Option<SkillLevel>,
}

#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "Exercise", complex)]
pub struct ExerciseRow {
    #[graphql(skip)]
    pub id: i32,
    pub name: String,
    pub target_muscle: TargetMuscle,
    pub icon_url: String,
    pub poster_url: String,
    pub instructions: Option<JsonObject>,
    pub cues: Option<JsonObject>,
    pub overview: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "UserRoutine", complex)]
pub struct UserRoutineRow {
    pub user_id: i32,
    pub routine_id: i32,
    pub role: UserRoutineRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "RoutineExercise", complex)]
pub struct RoutineExerciseRow {
    pub routine_id: i32,
    pub exercise_id: i32,
    pub notes: Option<String>,
    pub sets: JsonObject,
    pub rest_time: Option<i32>,
    #[graphql(name = "order")]
    pub position: i32,
    pub rir: Option<i32>,
}

#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "Session", complex)]
pub struct SessionRow {
    #[graphql(skip)]
    pub id: i32,
    pub user_id: i32,
    pub routine_id: Option<i32>,
    pub name: Option<String>,
    pub date: DateTime<Utc>,
    pub duration: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "SessionExercise", complex)]
pub struct SessionExerciseRow {
    #[graphql(skip)]
    pub id: i32,
    pub session_id: i32,
    pub exercise_id: i32,
}

#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "SessionSet", complex)]
pub struct SessionSetRow {
    #[graphql(skip)]
    pub id: i32,
    pub session_exercise_id: i32,
    pub set_number: i32,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
}

/// A routine as listed for one user, with its exercise count.
#[derive(Debug, Clone, sqlx::FromRow, SimpleObject)]
#[graphql(name = "UserRoutinesRoutine", complex)]
pub struct UserRoutineSummaryRow {
    #[graphql(skip)]
    pub id: i32,
    pub name: String,
    #[graphql(name = "type")]
    pub routine_type: RoutineType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub skill_level: Option<SkillLevel>,
    #[graphql(skip)]
    pub exercise_count: i64,
}

/// One page of a user's routines.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "UserRoutinesResult")]
pub struct UserRoutinesPage {
    pub routines: Vec<UserRoutineSummaryRow>,
    pub total_count: i32,
    pub has_more: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Query Parameters
// ═══════════════════════════════════════════════════════════════════════════════

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub take: i64,
}

impl Page {
    pub const DEFAULT_TAKE: i32 = 10;
    pub const MAX_TAKE: i32 = 100;

    pub fn new(skip: i32, take: i32) -> Self {
        Self {
            skip: i64::from(skip.max(0)),
            take: i64::from(take.clamp(1, Self::MAX_TAKE)),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_TAKE)
    }
}

/// A column update in a partial UPDATE: leave it, set a value, or clear it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// `None` keeps the column (for non-nullable columns).
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Keep,
        }
    }
}

impl<T> From<async_graphql::MaybeUndefined<T>> for Patch<T> {
    fn from(value: async_graphql::MaybeUndefined<T>) -> Self {
        match value {
            async_graphql::MaybeUndefined::Undefined => Self::Keep,
            async_graphql::MaybeUndefined::Null => Self::Clear,
            async_graphql::MaybeUndefined::Value(v) => Self::Set(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::MaybeUndefined;

    #[test]
    fn test_page_clamps() {
        assert_eq!(Page::new(-5, 0), Page { skip: 0, take: 1 });
        assert_eq!(Page::new(20, 1000), Page { skip: 20, take: 100 });
        assert_eq!(Page::default(), Page { skip: 0, take: 10 });
    }

    #[test]
    fn test_patch_from_maybe_undefined() {
        assert_eq!(Patch::from(MaybeUndefined::<i32>::Undefined), Patch::Keep);
        assert_eq!(Patch::from(MaybeUndefined::<i32>::Null), Patch::Clear);
        assert_eq!(Patch::from(MaybeUndefined::Value(3)), Patch::Set(3));
        assert_eq!(Patch::from(None::<i32>), Patch::Keep);
    }
}
