//! Routine commands.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tabled::Tabled;

use crate::client::GraphqlClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum RoutineCommands {
    /// List routines, or one user's routines with `--user`
    List {
        /// Only routines this user belongs to
        #[arg(short, long)]
        user: Option<i32>,

        /// Routine type (Strength, Endurance, Flexibility, Balance, Mobility)
        #[arg(short = 't', long = "type")]
        routine_type: Option<String>,

        /// Skill level (Beginner, Intermediate, Advanced, AllLevels)
        #[arg(short, long)]
        skill: Option<String>,

        #[arg(long, default_value = "0")]
        skip: i32,

        #[arg(long, default_value = "10")]
        take: i32,
    },

    /// Show a routine with its exercises and members
    Get {
        id: i32,
    },
}

const LIST_ROUTINES: &str = r#"
query Routines($skip: Int, $take: Int, $type: RoutineType, $skillLevel: SkillLevel) {
  routines(skip: $skip, take: $take, type: $type, skillLevel: $skillLevel) {
    id name type skillLevel
  }
}"#;

const USER_ROUTINES: &str = r#"
query UserRoutines($userId: Int!, $skip: Int, $take: Int, $type: RoutineType, $skillLevel: SkillLevel) {
  userRoutines(userId: $userId, skip: $skip, take: $take, type: $type, skillLevel: $skillLevel) {
    totalCount
    hasMore
    routines { id name type skillLevel exerciseCount }
  }
}"#;

const GET_ROUTINE: &str = r#"
query Routine($id: Int!) {
  routine(id: $id) {
    id name type skillLevel createdAt updatedAt
    routineExercises { order sets exercise { id name targetMuscle } }
    userRoutines { userId role joinedAt }
  }
}"#;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutineSummary {
    id: String,
    name: String,
    #[serde(rename = "type")]
    routine_type: String,
    skill_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exercise_count: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRoutinesPage {
    total_count: i32,
    has_more: bool,
    routines: Vec<RoutineSummary>,
}

#[derive(Tabled)]
struct RoutineTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    routine_type: String,
    #[tabled(rename = "Skill")]
    skill: String,
    #[tabled(rename = "Exercises")]
    exercises: String,
}

impl From<&RoutineSummary> for RoutineTableRow {
    fn from(r: &RoutineSummary) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            routine_type: r.routine_type.clone(),
            skill: output::or_dash(r.skill_level.as_deref()),
            exercises: output::or_dash(r.exercise_count),
        }
    }
}

fn print_routines(routines: &[RoutineSummary]) {
    let rows: Vec<RoutineTableRow> = routines.iter().map(Into::into).collect();
    if rows.is_empty() {
        output::print_info("No routines found.");
    } else {
        println!("{}", output::render_table(&rows));
    }
}

pub async fn execute(cmd: RoutineCommands, client: &GraphqlClient, format: OutputFormat) -> Result<()> {
    match cmd {
        RoutineCommands::List {
            user: Some(user_id),
            routine_type,
            skill,
            skip,
            take,
        } => {
            let page: UserRoutinesPage = client
                .query_field(
                    USER_ROUTINES,
                    json!({
                        "userId": user_id,
                        "skip": skip,
                        "take": take,
                        "type": routine_type,
                        "skillLevel": skill,
                    }),
                    "userRoutines",
                )
                .await?;

            match format {
                OutputFormat::Table => {
                    print_routines(&page.routines);
                    output::print_detail("Total", &page.total_count.to_string());
                    if page.has_more {
                        output::print_detail("More", &format!("use --skip {}", skip + take));
                    }
                    Ok(())
                }
                _ => output::print_item(&page, format),
            }
        }

        RoutineCommands::List {
            user: None,
            routine_type,
            skill,
            skip,
            take,
        } => {
            let routines: Vec<RoutineSummary> = client
                .query_field(
                    LIST_ROUTINES,
                    json!({ "skip": skip, "take": take, "type": routine_type, "skillLevel": skill }),
                    "routines",
                )
                .await?;

            match format {
                OutputFormat::Table => {
                    print_routines(&routines);
                    Ok(())
                }
                _ => output::print_item(&routines, format),
            }
        }

        RoutineCommands::Get { id } => {
            let routine: Option<Value> = client
                .query_field(GET_ROUTINE, json!({ "id": id }), "routine")
                .await?;

            match routine {
                Some(routine) => output::print_item(&routine, format),
                None => anyhow::bail!("Routine {} not found", id),
            }
        }
    }
}
