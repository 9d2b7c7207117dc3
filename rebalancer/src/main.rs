//! CLI entry point for the rankbook rebalancer.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use rankbook_rebalancer::config::Config;
use rankbook_rebalancer::execution::{self, RunOptions};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Sector-balanced portfolio rebalancer over historical prices")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebalance the portfolio and write its successor
    Run {
        /// Show actions without writing the successor portfolio
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the ranked universe on the portfolio date
    Rank {
        /// Only show the first N tickers
        #[arg(long)]
        top: Option<usize>,
    },

    /// Show the current portfolio marked to market
    Positions,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run { dry_run } => execution::run(&config, &RunOptions { dry_run }).map(|_| ()),
        Command::Rank { top } => execution::show_ranking(&config, top).map(|_| ()),
        Command::Positions => execution::show_positions(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
