//! Deterministic development fixtures.
//!
//! `kinetic-server seed` wipes every table and loads a small known dataset:
//! three users, three exercises, four routines, five memberships and three
//! routine exercises.

use serde::Serialize;
use serde_json::json;
use sqlx::{Postgres, Transaction};
use tracing::info;

use super::{
    AuthProvider, Database, Gender, RoutineType, SkillLevel, TargetMuscle, UnitPreference,
    UserRoutineRole,
};
use crate::error::Result;
use crate::graphql::scalars::JsonObject;

/// Row counts inserted by [`Database::seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub exercises: usize,
    pub routines: usize,
    pub memberships: usize,
    pub routine_exercises: usize,
}

struct UserFixture {
    username: &'static str,
    email: &'static str,
    profile_picture_url: Option<&'static str>,
    auth_provider: AuthProvider,
    auth_provider_id: Option<&'static str>,
    preferred_units: UnitPreference,
    notifications_enabled: bool,
    gender: Option<Gender>,
    age: Option<i32>,
    height: Option<f64>,
    weight: Option<f64>,
}

const USERS: [UserFixture; 3] = [
    UserFixture {
        username: "test",
        email: "test@example.com",
        profile_picture_url: None,
        auth_provider: AuthProvider::Email,
        auth_provider_id: None,
        preferred_units: UnitPreference::Metric,
        notifications_enabled: true,
        gender: Some(Gender::Male),
        age: Some(30),
        height: Some(180.5),
        weight: Some(75.2),
    },
    UserFixture {
        username: "minimal",
        email: "minimal@example.com",
        profile_picture_url: None,
        auth_provider: AuthProvider::Google,
        auth_provider_id: None,
        preferred_units: UnitPreference::Imperial,
        notifications_enabled: false,
        gender: None,
        age: None,
        height: None,
        weight: None,
    },
    UserFixture {
        username: "complete",
        email: "complete@example.com",
        profile_picture_url: Some("https://example.com/profile.jpg"),
        auth_provider: AuthProvider::Apple,
        auth_provider_id: Some("apple123456"),
        preferred_units: UnitPreference::Metric,
        notifications_enabled: true,
        gender: Some(Gender::Female),
        age: Some(25),
        height: Some(165.0),
        weight: Some(60.5),
    },
];

const ROUTINES: [(&str, RoutineType, SkillLevel); 4] = [
    ("Beginner Strength", RoutineType::Strength, SkillLevel::Beginner),
    ("Core Mobility", RoutineType::Mobility, SkillLevel::Intermediate),
    ("Advanced Flexibility", RoutineType::Flexibility, SkillLevel::Advanced),
    ("All Levels Balance", RoutineType::Balance, SkillLevel::AllLevels),
];

/// (user index, routine index, role)
const MEMBERSHIPS: [(usize, usize, UserRoutineRole); 5] = [
    (0, 0, UserRoutineRole::Creator),
    (0, 1, UserRoutineRole::Participant),
    (1, 2, UserRoutineRole::Creator),
    (2, 0, UserRoutineRole::Participant),
    (2, 3, UserRoutineRole::Creator),
];

impl Database {
    /// Truncate every table and insert the fixtures, all in one transaction.
    pub async fn seed(&self) -> Result<SeedSummary> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            TRUNCATE session_sets, session_exercises, sessions, routine_exercises,
                     user_routines, exercises, routines, users
            RESTART IDENTITY CASCADE
            "#,
        )
        .execute(&mut *tx)
        .await?;

        let mut summary = SeedSummary::default();

        let mut user_ids = Vec::with_capacity(USERS.len());
        for user in &USERS {
            user_ids.push(insert_user(&mut tx, user).await?);
            summary.users += 1;
        }

        let exercise_ids = insert_exercises(&mut tx).await?;
        summary.exercises = exercise_ids.len();

        let mut routine_ids = Vec::with_capacity(ROUTINES.len());
        for (name, routine_type, skill_level) in ROUTINES {
            let id: i32 = sqlx::query_scalar(
                "INSERT INTO routines (name, routine_type, skill_level) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(name)
            .bind(routine_type)
            .bind(skill_level)
            .fetch_one(&mut *tx)
            .await?;
            routine_ids.push(id);
            summary.routines += 1;
        }

        for (user, routine, role) in MEMBERSHIPS {
            sqlx::query("INSERT INTO user_routines (user_id, routine_id, role) VALUES ($1, $2, $3)")
                .bind(user_ids[user])
                .bind(routine_ids[routine])
                .bind(role)
                .execute(&mut *tx)
                .await?;
            summary.memberships += 1;
        }

        let routine_exercises = [
            (
                routine_ids[0],
                exercise_ids[0],
                Some("Focus on form, not weight"),
                json!([
                    { "reps": 10, "weight": 135 },
                    { "reps": 8, "weight": 155 },
                    { "reps": 6, "weight": 175 }
                ]),
                Some(90),
                1,
                Some(2),
            ),
            (
                routine_ids[0],
                exercise_ids[1],
                None,
                json!([{ "reps": 12, "rpe": 7 }, { "reps": 12, "rpe": 7 }]),
                None,
                2,
                None,
            ),
            (
                routine_ids[1],
                exercise_ids[2],
                None,
                json!([{ "reps": 5 }, { "reps": 5 }]),
                Some(120),
                1,
                None,
            ),
        ];

        for (routine_id, exercise_id, notes, sets, rest_time, position, rir) in routine_exercises {
            sqlx::query(
                r#"
                INSERT INTO routine_exercises (routine_id, exercise_id, notes, sets, rest_time, position, rir)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(routine_id)
            .bind(exercise_id)
            .bind(notes)
            .bind(JsonObject(sets))
            .bind(rest_time)
            .bind(position)
            .bind(rir)
            .execute(&mut *tx)
            .await?;
            summary.routine_exercises += 1;
        }

        tx.commit().await?;
        info!(?summary, "Database seeded");
        Ok(summary)
    }
}

async fn insert_user(tx: &mut Transaction<'_, Postgres>, user: &UserFixture) -> Result<i32> {
    let id = sqlx::query_scalar(
        r#"
        INSERT INTO users (
            username, email, profile_picture_url, auth_provider, auth_provider_id,
            preferred_units, notifications_enabled, gender, age, height, weight
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.profile_picture_url)
    .bind(user.auth_provider)
    .bind(user.auth_provider_id)
    .bind(user.preferred_units)
    .bind(user.notifications_enabled)
    .bind(user.gender)
    .bind(user.age)
    .bind(user.height)
    .bind(user.weight)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

async fn insert_exercises(tx: &mut Transaction<'_, Postgres>) -> Result<Vec<i32>> {
    let exercises = [
        (
            "Bench Press",
            TargetMuscle::Chest,
            "https://example.com/icons/bench-press.svg",
            "https://example.com/posters/bench-press.jpg",
            Some(json!([{
                "steps": [
                    "Lie on bench",
                    "Grip bar with hands slightly wider than shoulder-width",
                    "Lower bar to chest",
                    "Push bar up"
                ],
                "image": "https://example.com/instructions/bench-press.jpg"
            }])),
            Some(json!(["Keep elbows at 45 degrees", "Feet flat on floor", "Shoulders back"])),
            Some("Compound movement for chest development"),
        ),
        (
            "Squat",
            TargetMuscle::Legs,
            "https://example.com/icons/squat.svg",
            "https://example.com/posters/squat.jpg",
            Some(json!([{
                "steps": [
                    "Stand with feet shoulder-width apart",
                    "Lower hips back and down",
                    "Keep knees in line with toes",
                    "Return to standing"
                ],
                "image": "https://example.com/instructions/squat.jpg"
            }])),
            None,
            Some("Primary lower body compound exercise"),
        ),
        (
            "Pull-Up",
            TargetMuscle::Back,
            "https://example.com/icons/pull-up.svg",
            "https://example.com/posters/pull-up.jpg",
            None,
            None,
            None,
        ),
    ];

    let mut ids = Vec::with_capacity(exercises.len());
    for (name, target_muscle, icon_url, poster_url, instructions, cues, overview) in exercises {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO exercises (name, target_muscle, icon_url, poster_url, instructions, cues, overview)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(target_muscle)
        .bind(icon_url)
        .bind(poster_url)
        .bind(instructions.map(JsonObject))
        .bind(cues.map(JsonObject))
        .bind(overview)
        .fetch_one(&mut **tx)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memberships_reference_known_fixtures() {
        for (user, routine, _) in MEMBERSHIPS {
            assert!(user < USERS.len());
            assert!(routine < ROUTINES.len());
        }
    }

    #[test]
    fn test_three_seeded_creators() {
        let creators = MEMBERSHIPS
            .iter()
            .filter(|(_, _, role)| *role == UserRoutineRole::Creator)
            .count();
        assert_eq!(creators, 3);
    }
}
