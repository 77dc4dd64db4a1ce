use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use lockbox_core::config::VaultConfig;
use lockbox_core::vault::VaultStore;

#[derive(ClapArgs)]
pub struct Args {}

#[instrument(level = "info", name = "cmd::init", skip_all)]
pub fn execute(config: VaultConfig, _args: &Args) -> Result<()> {
    let mut store = VaultStore::open(config)?;
    store.create().context("Failed to create vault")?;
    eprintln!("Vault created at {}", store.config().vault_file.display());
    Ok(())
}
