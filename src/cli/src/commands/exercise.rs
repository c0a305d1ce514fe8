//! Exercise catalogue commands.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::Tabled;

use crate::client::GraphqlClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ExerciseCommands {
    /// List exercises
    List {
        /// Name contains
        #[arg(short, long)]
        name: Option<String>,

        /// Target muscle (Chest, Back, Legs, Shoulders, Arms, Core)
        #[arg(short, long)]
        muscle: Option<String>,

        #[arg(long, default_value = "0")]
        skip: i32,

        #[arg(long, default_value = "10")]
        take: i32,
    },

    /// Show one exercise with its instructions and cues
    Get {
        id: i32,
    },
}

const LIST_EXERCISES: &str = r#"
query Exercises($skip: Int, $take: Int, $name: String, $targetMuscle: TargetMuscle) {
  exercises(skip: $skip, take: $take, name: $name, targetMuscle: $targetMuscle) {
    id name targetMuscle overview
  }
}"#;

const GET_EXERCISE: &str = r#"
query Exercise($id: Int!) {
  exercise(id: $id) {
    id name targetMuscle iconUrl posterUrl instructions cues overview
  }
}"#;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseSummary {
    id: String,
    name: String,
    target_muscle: String,
    overview: Option<String>,
}

#[derive(Tabled)]
struct ExerciseTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Muscle")]
    muscle: String,
    #[tabled(rename = "Overview")]
    overview: String,
}

impl From<&ExerciseSummary> for ExerciseTableRow {
    fn from(e: &ExerciseSummary) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            muscle: e.target_muscle.clone(),
            overview: output::or_dash(e.overview.as_deref()),
        }
    }
}

pub async fn execute(cmd: ExerciseCommands, client: &GraphqlClient, format: OutputFormat) -> Result<()> {
    match cmd {
        ExerciseCommands::List {
            name,
            muscle,
            skip,
            take,
        } => {
            let exercises: Vec<ExerciseSummary> = client
                .query_field(
                    LIST_EXERCISES,
                    json!({ "skip": skip, "take": take, "name": name, "targetMuscle": muscle }),
                    "exercises",
                )
                .await?;

            match format {
                OutputFormat::Table => {
                    let rows: Vec<ExerciseTableRow> = exercises.iter().map(Into::into).collect();
                    if rows.is_empty() {
                        output::print_info("No exercises found.");
                    } else {
                        println!("{}", output::render_table(&rows));
                    }
                    Ok(())
                }
                _ => output::print_item(&exercises, format),
            }
        }

        ExerciseCommands::Get { id } => {
            let exercise: Option<serde_json::Value> = client
                .query_field(GET_EXERCISE, json!({ "id": id }), "exercise")
                .await?;

            match exercise {
                Some(exercise) => output::print_item(&exercise, format),
                None => anyhow::bail!("Exercise {} not found", id),
            }
        }
    }
}
