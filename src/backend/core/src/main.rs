//! Kinetic Server - Main entry point

use clap::{Parser, Subcommand};

use kinetic_core::{
    api::{self, AppState},
    cache::ResponseCache,
    config::Config,
    db::Database,
    graphql,
    observability,
};

#[derive(Parser)]
#[command(name = "kinetic-server")]
#[command(author, version, about = "Kinetic GraphQL fitness tracking API")]
struct Cli {
    /// Configuration file (TOML); `KINETIC__*` variables override it
    #[arg(short, long, env = "KINETIC_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Replace all data with the development fixtures
    Seed,
    /// Print the GraphQL schema definition
    PrintSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Some(Command::PrintSchema) = cli.command {
        println!("{}", graphql::sdl());
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;

    observability::init("kinetic-server", &config.observability)?;

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(&config).await,
        Command::Seed => seed(&config).await,
        Command::PrintSchema => Ok(()),
    };

    observability::shutdown();
    result
}

async fn migrate(config: &Config) -> anyhow::Result<()> {
    let db = Database::new(&config.database).await?;
    db.migrate().await?;
    Ok(())
}

async fn seed(config: &Config) -> anyhow::Result<()> {
    let db = Database::new(&config.database).await?;
    db.migrate().await?;
    let summary = db.seed().await?;
    tracing::info!(?summary, "Seeded database");
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Kinetic Server");

    let metrics = if config.observability.metrics_enabled {
        Some(observability::metrics::install_prometheus()?)
    } else {
        None
    };

    let db = Database::new(&config.database).await?;
    if config.database.run_migrations {
        db.migrate().await?;
    }

    let state = AppState {
        schema: graphql::build_schema(db.clone(), &config.graphql),
        db,
        cache: ResponseCache::new(config.cache.clone()),
        metrics,
    };

    let app = api::build_router(state, &config)?;

    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
