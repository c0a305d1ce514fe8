//! Health check command.
//!
//! Queries the `/health` endpoint and displays component status.

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use crate::client::GraphqlClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct HealthArgs {
    /// Include detailed component checks
    #[arg(short, long)]
    detailed: bool,
}

pub async fn execute(args: HealthArgs, client: &GraphqlClient, format: OutputFormat) -> Result<()> {
    let health = client.get_raw("/health").await?;

    if format != OutputFormat::Table {
        return output::print_item(&health, format);
    }

    let status = health
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    output::print_header("Server Health");
    output::print_detail("Status", status);
    output::print_detail("API URL", client.base_url());

    if let Some(version) = health.get("version").and_then(Value::as_str) {
        output::print_detail("Version", version);
    }

    if let Some(ts) = health.get("timestamp").and_then(Value::as_str) {
        output::print_detail("Timestamp", ts);
    }

    if args.detailed {
        if let Some(db) = health.pointer("/components/database") {
            output::print_header("Database");
            output::print_detail("Status", db["status"].as_str().unwrap_or("?"));
            if let Some(latency) = db["latency_ms"].as_u64() {
                output::print_detail("Latency", &format!("{} ms", latency));
            }
            if let Some(pool) = db.get("pool") {
                output::print_detail("Pool", &pool.to_string());
            }
            if let Some(error) = db["error"].as_str() {
                output::print_detail("Error", error);
            }
        }
        if let Some(entries) = health.pointer("/components/response_cache/entries") {
            output::print_detail("Cached responses", &entries.to_string());
        }
    }

    if status == "healthy" {
        output::print_success("All systems operational");
    } else {
        output::print_error(&format!("Server status: {}", status));
    }

    Ok(())
}
