#![deny(unsafe_code)]

// Use mimalloc for reduced allocation latency (enabled by default).
// Disable with `--no-default-features` if debugging allocator issues.
#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod commands;
mod exit_code;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lockbox_core::config::VaultConfig;
use lockbox_core::error::{CryptoError, TemplateError, VaultError};

use crate::commands::{add, add_missing, completions, init, list, process, reveal, rm};

/// Command-line interface for lockbox secret vaults
#[derive(Parser)]
#[command(name = "lockbox")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Create a vault (passphrase from VAULT_PASSPHRASE or .vault_passphrase)
    lockbox init

    # Store a secret, prompting for the value without echo
    lockbox add db.password

    # Print a secret
    lockbox reveal db.password

    # Substitute @@vault...@@ tokens in build output
    lockbox process --resource-path build

    # Fill in .vault_missing_secrets, then import it
    lockbox add-missing
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the encrypted vault file
    #[arg(long, value_name = "FILE", default_value = ".vault", global = true)]
    vault_file: PathBuf,

    /// Fallback passphrase file (the VAULT_PASSPHRASE env var wins)
    #[arg(long, value_name = "FILE", default_value = ".vault_passphrase", global = true)]
    passphrase_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault protected by the resolved passphrase
    #[command(visible_alias = "create-vault")]
    Init(init::Args),

    /// Add or overwrite a secret
    #[command(visible_alias = "add-secret")]
    Add(add::Args),

    /// Import secrets from the missing-secrets report
    #[command(visible_alias = "add-missing-secrets")]
    AddMissing(add_missing::Args),

    /// Remove a secret
    #[command(visible_alias = "remove-secret")]
    Rm(rm::Args),

    /// Print a secret's value
    #[command(visible_alias = "reveal-secret")]
    Reveal(reveal::Args),

    /// List secret identifiers
    List(list::Args),

    /// Substitute placeholder tokens in resource files
    #[command(visible_alias = "process-secrets")]
    Process(process::Args),

    /// Generate shell completions
    Completions(completions::Args),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            // Only print the error if not in quiet mode (parsed separately
            // because the Cli value is gone by now)
            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    let config = VaultConfig::new()
        .with_vault_file(&cli.vault_file)
        .with_passphrase_file(&cli.passphrase_file);

    match cli.command {
        Commands::Init(args) => init::execute(config, &args),
        Commands::Add(args) => add::execute(config, &args),
        Commands::AddMissing(args) => add_missing::execute(config, &args),
        Commands::Rm(args) => rm::execute(config, &args),
        Commands::Reveal(args) => reveal::execute(config, &args),
        Commands::List(args) => list::execute(config, &args),
        Commands::Process(args) => process::execute(config, &args),
        Commands::Completions(args) => completions::execute(&args, &mut Cli::command()),
    }
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Categorize an error into an exit code using typed error downcasting
///
/// This approach is more robust than string matching because it doesn't
/// depend on error message wording, which could change between versions.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(vault_err) = cause.downcast_ref::<VaultError>() {
            return match vault_err {
                VaultError::AccessDenied | VaultError::MissingPassphrase => {
                    exit_code::ACCESS_DENIED
                }
                VaultError::SecretNotFound(_) | VaultError::NoMissingSecrets(_) => {
                    exit_code::NOT_FOUND
                }
                VaultError::MalformedVaultFile(_) | VaultError::MalformedReportLine(_) => {
                    exit_code::VAULT_INVALID
                }
                VaultError::Crypto(CryptoError::IntegrityCheckFailed) => {
                    exit_code::ACCESS_DENIED
                }
                VaultError::Crypto(_) => exit_code::VAULT_INVALID,
                VaultError::VaultAlreadyExists(_) | VaultError::Io(_) => {
                    exit_code::GENERAL_ERROR
                }
            };
        }

        if let Some(template_err) = cause.downcast_ref::<TemplateError>() {
            match template_err {
                TemplateError::RootNotFound(_) => return exit_code::NOT_FOUND,
                // TemplateError::Vault is reached through the chain above
                _ => {}
            }
        }

        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::NotFound {
                return exit_code::NOT_FOUND;
            }
        }
    }

    exit_code::GENERAL_ERROR
}
