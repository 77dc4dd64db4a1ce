use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use lockbox_core::config::VaultConfig;
use lockbox_core::vault::VaultStore;

#[derive(ClapArgs)]
pub struct Args {
    /// Identifier of the secret to remove
    pub identifier: String,
}

#[instrument(level = "info", name = "cmd::rm", skip_all, fields(identifier = %args.identifier))]
pub fn execute(config: VaultConfig, args: &Args) -> Result<()> {
    let mut store = VaultStore::open(config)?;
    store.remove_secret(&args.identifier)?;
    eprintln!("Removed secret {}", args.identifier);
    Ok(())
}
