//! seedscan CLI - mnemonic balance scanner for learning purposes

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{check, generate, logs, providers, verify};

/// seedscan - generate BIP-39 phrases and look up the balances of their wallets
///
/// Educational tool. Never enter a seed phrase that guards real funds.
#[derive(Parser)]
#[command(name = "seedscan", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate phrases and check their balances
    Check {
        /// Number of phrases to check (at most 100)
        #[arg(short, long, default_value = "10")]
        count: usize,
        /// Phrase length in words (12, 15, 18, 21 or 24); random if omitted
        #[arg(short, long)]
        words: Option<usize>,
        /// Add the simulated provider
        #[arg(long)]
        simulate: bool,
        /// Do not report phrases whose only signal is a provider error
        #[arg(long)]
        quiet_errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the given phrases (reads one per line from stdin when none are given)
    Verify {
        /// Phrases to check, each quoted as one argument
        phrases: Vec<String>,
        /// Add the simulated provider
        #[arg(long)]
        simulate: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print fresh phrases without checking them
    Generate {
        /// Number of phrases (at most 100)
        #[arg(short, long, default_value = "1")]
        count: usize,
        /// Phrase length in words (12, 15, 18, 21 or 24); random if omitted
        #[arg(short, long)]
        words: Option<usize>,
        /// Also print the derived address
        #[arg(long)]
        address: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change provider configuration
    Providers {
        #[command(subcommand)]
        command: Option<providers::ProvidersCommands>,
        /// Output as JSON
        #[arg(long, global = true)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let name = cli.command.name();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(logger) = commands::get_logger() {
                let _ = logger.log_error("command_failed", &format!("{}: {}", name, e), Some(&format!("{:#}", e)));
            }
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Check { .. } => "check",
            Commands::Verify { .. } => "verify",
            Commands::Generate { .. } => "generate",
            Commands::Providers { .. } => "providers",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { count, words, simulate, quiet_errors, json } => {
            check::run(count, words, simulate, quiet_errors, json)
        }
        Commands::Verify { phrases, simulate, json } => verify::run(phrases, simulate, json),
        Commands::Generate { count, words, address, json } => generate::run(count, words, address, json),
        Commands::Providers { command, json } => providers::run(command, json),
        Commands::Logs { command } => logs::run(command),
    }
}
