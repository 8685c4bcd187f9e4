//! # cryptonia CLI entry point
//!
//! Parses command-line arguments, resolves configuration, opens the local
//! registry and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cryptonia_cli::config::{CliConfig, Overrides};
use cryptonia_cli::parse;
use cryptonia_cli::passport::{run_passport, PassportArgs};
use cryptonia_cli::query::{run_balance, run_list, run_owner, run_status, BalanceArgs, OwnerArgs, StatusArgs};
use cryptonia_cli::session::Session;
use cryptonia_cli::transfer::{run_transfer, TransferArgs};
use cryptonia_cli::visa::{run_visa, VisaArgs};
use cryptonia_core::Timestamp;

/// Cryptonia credential registry.
///
/// Issues soulbound Passports and Visas on behalf of a single authority,
/// and answers validity and ownership queries.
#[derive(Parser, Debug)]
#[command(name = "cryptonia", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: ./cryptonia.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Issuing authority identity.
    #[arg(long, global = true)]
    authority: Option<String>,

    /// Directory holding registry.json and events.jsonl.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Pin the clock (epoch seconds or RFC 3339).
    #[arg(long, global = true, value_parser = parse::timestamp)]
    now: Option<Timestamp>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue or burn Passports.
    Passport(PassportArgs),

    /// Issue or cancel Visas.
    Visa(VisaArgs),

    /// Attempt a transfer. Always rejected.
    Transfer(TransferArgs),

    /// Show a credential and whether it is valid (exit 2 if not).
    Status(StatusArgs),

    /// Print the holder of a credential.
    Owner(OwnerArgs),

    /// Print how many live credentials an identity holds.
    Balance(BalanceArgs),

    /// List live credentials.
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!("cryptonia CLI starting");

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let flags = Overrides {
        authority: cli.authority,
        state_dir: cli.state_dir,
    };
    let config = CliConfig::load(cli.config.as_deref(), flags)?;
    tracing::debug!(authority = %config.authority, state_dir = %config.state_dir.display(), "resolved configuration");

    let session = Session::open(&config, cli.now)?;

    match cli.command {
        Commands::Passport(args) => run_passport(&args, &session),
        Commands::Visa(args) => run_visa(&args, &session),
        Commands::Transfer(args) => run_transfer(&args, &session),
        Commands::Status(args) => run_status(&args, &session),
        Commands::Owner(args) => run_owner(&args, &session),
        Commands::Balance(args) => run_balance(&args, &session),
        Commands::List => run_list(&session),
    }
}
