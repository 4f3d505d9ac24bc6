//! `rusty-automation-tool` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`    — start the API server (C9 ingress + REST CRUD).
//! - `worker`   — start the queue worker that dispatches events into C6.
//! - `migrate`  — run pending database migrations.
//! - `validate` — validate a workflow JSON file.

mod config;
mod state;
mod worker;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use config::Config;

#[derive(Parser)]
#[command(
    name = "rusty-automation-tool",
    about = "High-performance workflow automation engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server, including the C9 webhook ingress.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Start a background worker that drains the event queue (C7) into the
    /// workflow engine (C6).
    Worker,
    /// Run pending database migrations.
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Validate a workflow definition JSON file against the schema and
    /// business rules, printing non-blocking warnings and the stage plan.
    Validate {
        /// Path to the workflow JSON file.
        path: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => {
            let config = Config::from_env();
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            info!("Starting API server on {bind}");
            let shared = state::build(&config).await;
            api::serve(&bind, shared.state).await.expect("API server crashed");
        }
        Command::Worker => {
            let config = Config::from_env();
            info!("Starting queue worker");
            let shared = state::build(&config).await;

            let dispatcher = Arc::new(worker::WorkflowDispatchProcessor::new(shared.state.pool.clone(), Arc::clone(&shared.state.executor)));
            worker::register_processors(&shared.state.pool, &shared.state.processors, dispatcher).await;

            let (_shutdown_tx, shutdown_rx) = watch::channel(false);
            shared.state.queue.run_worker(Arc::clone(&shared.state.processors), shutdown_rx).await;
        }
        Command::Migrate { database_url } => {
            info!("Running migrations against {database_url}");
            let pool = db::pool::create_pool(&database_url, 2)
                .await
                .expect("failed to connect to database");
            db::pool::run_migrations(&pool)
                .await
                .expect("migration failed");
            info!("Migrations applied successfully");
        }
        Command::Validate { path } => {
            let content = std::fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("cannot read file {}: {e}", path.display()));

            let workflow: engine::WorkflowDefinition =
                serde_json::from_str(&content).unwrap_or_else(|e| panic!("invalid JSON: {e}"));

            match engine::validate_workflow(&workflow) {
                Ok(()) => match engine::build_stage_plan(&workflow) {
                    Ok(plan) => {
                        println!("workflow is valid — {} stage(s):", plan.len());
                        for (i, stage) in plan.iter().enumerate() {
                            println!("  stage {i}: {stage:?}");
                        }
                        for warning in engine::validation::collect_warnings(&workflow) {
                            println!("warning: {}", warning.0);
                        }
                    }
                    Err(e) => {
                        eprintln!("dependency graph is invalid: {e}");
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    eprintln!("validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
