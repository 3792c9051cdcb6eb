//! craftgate console — entry point.
//!
//! ```text
//! craftgate status                      Player counts for the default backend
//! craftgate -b smp-2 roster            Who is online on smp-2
//! craftgate exec say restarting soon   Run an arbitrary console command
//! craftgate --gen-config               Dump a sample config and exit
//! ```
//!
//! Output is the same JSON report shape the HTTP layer serves; backend
//! failures print a report with `error` set rather than exiting
//! nonzero, mirroring that layer's always-200 policy.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use craftgate_core::{QueryApi, SessionRegistry};

mod config;

use config::ConsoleConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "craftgate", about = "Query game-server backends over RCON")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "craftgate.toml")]
    config: PathBuf,

    /// Backend id to target (defaults to the first configured backend).
    #[arg(short, long)]
    backend: Option<String>,

    /// Print a sample configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    #[command(subcommand)]
    command: Option<Query>,
}

#[derive(Subcommand, Debug)]
enum Query {
    /// Online status and player counts.
    Status,
    /// Names of the players currently online.
    Roster,
    /// Server version and MOTD, where available.
    Info,
    /// Run an arbitrary console command.
    Exec {
        /// The command, joined with spaces.
        #[arg(required = true)]
        command: Vec<String>,
    },
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        print!("{}", toml::to_string_pretty(&ConsoleConfig::sample())?);
        return Ok(());
    }

    let config = ConsoleConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let backend_id = match cli.backend.or_else(|| config.backends.first().map(|b| b.id.clone())) {
        Some(id) => id,
        None => {
            eprintln!(
                "no backends configured; create {} (see --gen-config)",
                cli.config.display()
            );
            std::process::exit(2);
        }
    };
    debug!(backend = %backend_id, "targeting backend");

    let registry = Arc::new(SessionRegistry::new(
        config.backends.clone(),
        config.tuning.clone(),
    ));
    let api = QueryApi::new(registry.clone());

    match cli.command.unwrap_or(Query::Status) {
        Query::Status => print_report(&api.status(&backend_id).await)?,
        Query::Roster => print_report(&api.roster(&backend_id).await)?,
        Query::Info => print_report(&api.info(&backend_id).await)?,
        Query::Exec { command } => {
            let command = command.join(" ");
            print_report(&api.execute(&backend_id, &command).await)?;
        }
    }

    registry.close_all().await;
    Ok(())
}

fn print_report<T: Serialize>(report: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
