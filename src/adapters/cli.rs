//! CLI Adapter
//!
//! Command-line interface for the solfolio position ledger.
//! Uses clap derive macros for argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solfolio - Position & Order Ledger for Solana wallet trading
#[derive(Parser, Debug)]
#[command(
    name = "solfolio",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Position & Order Ledger for Solana wallet trading",
    long_about = "Solfolio tracks per-wallet token positions with weighted-average cost \
                  accounting, values them against live Jupiter/CoinGecko prices, and \
                  evaluates standing limit orders for automatic execution."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the price-tick evaluation loop
    Run(RunCmd),

    /// Run a scripted in-memory trading session
    Demo(DemoCmd),

    /// Load and validate the configuration file
    CheckConfig(CheckConfigCmd),
}

/// Start the evaluation loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/solfolio.toml")]
    pub config: PathBuf,
}

/// Scripted demo session against in-memory adapters
#[derive(Parser, Debug)]
pub struct DemoCmd {
    /// Starting wallet balance in SOL
    #[arg(long, value_name = "SOL", default_value = "10")]
    pub balance: f64,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct CheckConfigCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/solfolio.toml")]
    pub config: PathBuf,
}
