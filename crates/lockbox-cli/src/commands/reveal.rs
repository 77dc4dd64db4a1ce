use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use lockbox_core::config::VaultConfig;
use lockbox_core::vault::VaultStore;

#[derive(ClapArgs)]
pub struct Args {
    /// Identifier of the secret to print
    pub identifier: String,
}

#[instrument(level = "info", name = "cmd::reveal", skip_all, fields(identifier = %args.identifier))]
pub fn execute(config: VaultConfig, args: &Args) -> Result<()> {
    let store = VaultStore::open(config)?;
    let value = store.reveal_secret(&args.identifier)?;
    println!("{value}");
    Ok(())
}
