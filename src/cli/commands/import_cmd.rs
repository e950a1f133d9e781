//! `securevault import` — add the records of an exported bundle.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{prompt_export_passphrase, Context};
use crate::errors::{Result, VaultError};
use crate::export::{import_data, ExportBundle};

/// Execute the `import` command.
pub fn execute(ctx: &Context, file_path: &Path) -> Result<()> {
    if !file_path.exists() {
        return Err(VaultError::CommandFailed(format!(
            "import file not found: {}",
            file_path.display()
        )));
    }

    let vault = ctx.unlock_vault()?;

    let bundle = ExportBundle::from_reader(BufReader::new(File::open(file_path)?))?;
    let passphrase = prompt_export_passphrase(false)?;
    let records = Zeroizing::new(import_data(&passphrase, &bundle)?);

    if records.is_empty() {
        output::warning("The bundle contains no records.");
        return Ok(());
    }

    // Re-encrypt every record under this device's key.
    let count = vault.restore(&records)?;
    output::success(&format!(
        "Imported {count} record(s): {} credential(s), {} bill(s), {} note(s)",
        records.credentials.len(),
        records.bills.len(),
        records.notes.len()
    ));

    Ok(())
}
