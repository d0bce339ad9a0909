// Copyright 2026 Demanda RT Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use demanda_rt::cli;
use demanda_rt::config::EngineConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "demanda",
    about = "Demanda RT — resilient acquisition of Colombia's real-time national power demand",
    version,
    after_help = "Run 'demanda <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Config file path (default: ~/.demanda/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one acquisition cycle and print the normalized series
    Fetch {
        /// Metric id or display-name fragment (default from config)
        #[arg(long)]
        metric: Option<String>,
        /// Days of data to request, ending today
        #[arg(long)]
        window_days: Option<u32>,
    },
    /// Poll continuously and render each cycle's result
    Watch {
        /// Metric id or display-name fragment (default from config)
        #[arg(long)]
        metric: Option<String>,
        /// Seconds between poll ticks (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List the provider's metric catalog, optionally filtered
    Catalog {
        /// Substring to filter ids and display names by
        query: Option<String>,
    },
    /// Check environment and diagnose issues
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Global flags travel as environment variables so all modules can check
    // them without plumbing.
    if cli.json {
        std::env::set_var("DEMANDA_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("DEMANDA_QUIET", "1");
    }

    let config = EngineConfig::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Fetch {
            metric,
            window_days,
        } => cli::fetch_cmd::run(config, metric.as_deref(), window_days).await,
        Commands::Watch { metric, interval } => {
            cli::watch_cmd::run(config, metric.as_deref(), interval, cli.verbose).await
        }
        Commands::Catalog { query } => cli::catalog_cmd::run(config, query.as_deref()).await,
        Commands::Doctor => cli::doctor::run(config).await,
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli.quiet && !cli.json {
            eprintln!("  Error: {e:#}");
        }
        if cli.json {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
