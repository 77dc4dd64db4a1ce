use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use lockbox_core::config::VaultConfig;
use lockbox_core::vault::VaultStore;

#[derive(ClapArgs)]
pub struct Args {
    /// Report file to import from
    #[arg(long, value_name = "FILE", default_value = ".vault_missing_secrets")]
    pub report: PathBuf,
}

#[instrument(level = "info", name = "cmd::add_missing", skip_all, fields(report = %args.report.display()))]
pub fn execute(config: VaultConfig, args: &Args) -> Result<()> {
    let config = config.with_missing_secrets_file(&args.report);
    let mut store = VaultStore::open(config)?;

    let imported = store.add_missing_secrets()?;
    eprintln!(
        "Imported {imported} secret(s) from {}; the report file is kept",
        args.report.display()
    );
    Ok(())
}
