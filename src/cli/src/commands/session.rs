//! Logged session commands.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::Tabled;

use crate::client::GraphqlClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum SessionCommands {
    /// List sessions, newest first
    List {
        #[arg(short, long)]
        user: Option<i32>,

        #[arg(short, long)]
        routine: Option<i32>,

        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Latest date (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(long, default_value = "0")]
        skip: i32,

        #[arg(long, default_value = "10")]
        take: i32,
    },
}

const LIST_SESSIONS: &str = r#"
query Sessions($userId: Int, $routineId: Int, $skip: Int, $take: Int, $fromDate: DateTime, $toDate: DateTime) {
  sessions(userId: $userId, routineId: $routineId, skip: $skip, take: $take, fromDate: $fromDate, toDate: $toDate) {
    id userId routineId name date duration
  }
}"#;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionSummary {
    id: String,
    user_id: i32,
    routine_id: Option<i32>,
    name: Option<String>,
    date: DateTime<Utc>,
    duration: Option<i32>,
}

#[derive(Tabled)]
struct SessionTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "User")]
    user: i32,
    #[tabled(rename = "Routine")]
    routine: String,
    #[tabled(rename = "Minutes")]
    duration: String,
}

impl From<&SessionSummary> for SessionTableRow {
    fn from(s: &SessionSummary) -> Self {
        Self {
            id: s.id.clone(),
            date: s.date.format("%Y-%m-%d %H:%M").to_string(),
            name: output::or_dash(s.name.as_deref()),
            user: s.user_id,
            routine: output::or_dash(s.routine_id),
            duration: output::or_dash(s.duration),
        }
    }
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_milli_opt(23, 59, 59, 999).map(|dt| dt.and_utc())
}

pub async fn execute(cmd: SessionCommands, client: &GraphqlClient, format: OutputFormat) -> Result<()> {
    match cmd {
        SessionCommands::List {
            user,
            routine,
            from,
            to,
            skip,
            take,
        } => {
            let variables = json!({
                "userId": user,
                "routineId": routine,
                "skip": skip,
                "take": take,
                "fromDate": from.and_then(start_of_day),
                "toDate": to.and_then(end_of_day),
            });

            let sessions: Vec<SessionSummary> = client
                .query_field(LIST_SESSIONS, variables, "sessions")
                .await?;

            match format {
                OutputFormat::Table => {
                    let rows: Vec<SessionTableRow> = sessions.iter().map(Into::into).collect();
                    if rows.is_empty() {
                        output::print_info("No sessions found.");
                    } else {
                        println!("{}", output::render_table(&rows));
                    }
                    Ok(())
                }
                _ => output::print_item(&sessions, format),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(start_of_day(day).unwrap().to_rfc3339(), "2024-03-09T00:00:00+00:00");
        assert_eq!(
            end_of_day(day).unwrap().to_rfc3339(),
            "2024-03-09T23:59:59.999+00:00"
        );
    }
}
