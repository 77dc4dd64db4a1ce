use anyhow::Result;
use clap::Args as ClapArgs;
use comfy_table::Table;
use tracing::instrument;

use lockbox_core::config::VaultConfig;
use lockbox_core::vault::VaultStore;

#[derive(ClapArgs)]
pub struct Args {
    /// Print bare identifiers, one per line, instead of a table
    #[arg(long)]
    pub plain: bool,
}

#[instrument(level = "info", name = "cmd::list", skip_all)]
pub fn execute(config: VaultConfig, args: &Args) -> Result<()> {
    let store = VaultStore::open(config)?;
    let identifiers = store.list_secrets()?;

    if identifiers.is_empty() {
        eprintln!("Vault holds no secrets");
        return Ok(());
    }

    if args.plain {
        for identifier in identifiers {
            println!("{identifier}");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Identifier"]);
    for identifier in identifiers {
        table.add_row(vec![identifier]);
    }
    println!("{table}");
    Ok(())
}
