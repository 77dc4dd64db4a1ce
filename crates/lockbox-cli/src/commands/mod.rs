pub mod add;
pub mod add_missing;
pub mod completions;
pub mod init;
pub mod list;
pub mod process;
pub mod reveal;
pub mod rm;

use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Prompt on stderr and read one line from stdin. Used for non-secret
/// answers; secret values go through rpassword instead.
pub(crate) fn prompt_line(message: &str) -> Result<String> {
    eprint!("{message} ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
