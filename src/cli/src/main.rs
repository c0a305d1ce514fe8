//! Kinetic CLI - Command-line client for the Kinetic GraphQL API.
//!
//! Provides commands for health, ad-hoc queries, exercises, routines,
//! sessions and local configuration.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config, exercise, health, query, routine, session};
use output::OutputFormat;

const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Kinetic - fitness tracking API client
#[derive(Parser)]
#[command(
    name = "kinetic",
    version,
    about = "Kinetic - fitness tracking API client",
    long_about = "CLI tool for querying a Kinetic server: exercises, routines, sessions and raw GraphQL.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(long, global = true, env = "KINETIC_API_URL")]
    api_url: Option<String>,

    /// Bearer token (JWT or API key accepted by the server)
    #[arg(long, global = true, env = "KINETIC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health(health::HealthArgs),

    /// Run a GraphQL document
    Query(query::QueryArgs),

    /// Exercise catalogue
    #[command(subcommand)]
    Exercise(exercise::ExerciseCommands),

    /// Routines and memberships
    #[command(subcommand)]
    Routine(routine::RoutineCommands),

    /// Logged workout sessions
    #[command(subcommand)]
    Session(session::SessionCommands),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli.output;

    let command = match cli.command {
        Commands::Config(cmd) => return config::execute(cmd, format).await,
        other => other,
    };

    let stored = config::load().unwrap_or_default();
    let api_url = cli
        .api_url
        .or(stored.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let client = client::GraphqlClient::new(&api_url, cli.token.or(stored.token))?;

    match command {
        Commands::Health(args) => health::execute(args, &client, format).await,
        Commands::Query(args) => query::execute(args, &client, format).await,
        Commands::Exercise(cmd) => exercise::execute(cmd, &client, format).await,
        Commands::Routine(cmd) => routine::execute(cmd, &client, format).await,
        Commands::Session(cmd) => session::execute(cmd, &client, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
