use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use lockbox_core::config::VaultConfig;
use lockbox_core::template::TemplateProcessor;
use lockbox_core::vault::VaultStore;

#[derive(ClapArgs)]
pub struct Args {
    /// Root directory scanned for resource files
    #[arg(long, value_name = "DIR", default_value = "build")]
    pub resource_path: PathBuf,

    /// Full-match regex selecting files to process
    #[arg(long, value_name = "REGEX", default_value = r".*/conf/.*\.properties")]
    pub resource_pattern: String,
}

#[instrument(level = "info", name = "cmd::process", skip_all, fields(root = %args.resource_path.display()))]
pub fn execute(config: VaultConfig, args: &Args) -> Result<()> {
    let config = config
        .with_resource_path(&args.resource_path)
        .with_resource_pattern(&args.resource_pattern);
    let store = VaultStore::open(config)?;

    let summary = TemplateProcessor::new(&store).process()?;

    eprintln!(
        "Processed {} file(s), replaced {} token(s)",
        summary.files_processed, summary.replaced
    );
    if !summary.missing.is_empty() {
        eprintln!(
            "{} token(s) had no vault entry; recorded in {}:",
            summary.missing.len(),
            store.config().missing_secrets_file.display()
        );
        for token in &summary.missing {
            eprintln!("  {token}");
        }
    }
    Ok(())
}
