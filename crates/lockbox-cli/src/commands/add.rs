use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use lockbox_core::config::VaultConfig;
use lockbox_core::vault::VaultStore;

use super::prompt_line;

#[derive(ClapArgs)]
pub struct Args {
    /// Secret identifier (prompted for when omitted)
    pub identifier: Option<String>,

    /// Secret value (prompted for without echo when omitted)
    #[arg(long)]
    pub value: Option<String>,
}

#[instrument(level = "info", name = "cmd::add", skip_all)]
pub fn execute(config: VaultConfig, args: &Args) -> Result<()> {
    let mut store = VaultStore::open(config)?;

    let identifier = match &args.identifier {
        Some(identifier) => identifier.clone(),
        None => prompt_line("Enter secret identifier:")?,
    };
    let value = match &args.value {
        Some(value) => value.clone(),
        None => rpassword::prompt_password("Enter secret value: ")
            .context("Failed to read secret value")?,
    };

    store.add_secret(&identifier, &value)?;
    eprintln!("Stored secret {identifier}");
    Ok(())
}
