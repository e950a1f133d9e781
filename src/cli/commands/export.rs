//! `securevault export` — write every record to a passphrase-encrypted bundle.
//!
//! The bundle is written through a temp file and renamed into place, so a
//! failed export never leaves a partial file at the destination.

use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{prompt_export_passphrase, Context};
use crate::errors::Result;
use crate::export::export_data;

/// Execute the `export` command.
pub fn execute(ctx: &Context, output_path: &Path) -> Result<()> {
    let vault = ctx.unlock_vault()?;

    // Decrypt everything under the device key.
    let records = Zeroizing::new(vault.snapshot()?);

    // Re-encrypt as a whole under the export passphrase.
    let passphrase = prompt_export_passphrase(true)?;
    let bundle = export_data(&passphrase, &records)?;
    bundle.write_atomic(output_path)?;

    output::success(&format!(
        "Exported {} credential(s), {} bill(s), {} note(s) to {}",
        records.credentials.len(),
        records.bills.len(),
        records.notes.len(),
        output_path.display()
    ));
    output::tip("Keep the export passphrase safe — the bundle cannot be opened without it.");

    Ok(())
}
