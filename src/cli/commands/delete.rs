//! `securevault delete` — remove a record from the vault.

use crate::cli::output;
use crate::cli::{confirm, Context};
use crate::errors::Result;
use crate::vault::RecordKind;

/// Execute the `delete` command.
pub fn execute(ctx: &Context, kind: RecordKind, id: i64, force: bool) -> Result<()> {
    let vault = ctx.unlock_vault()?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete {kind} #{id}?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    vault.delete(kind, id)?;
    output::success(&format!("Deleted {kind} #{id}"));

    Ok(())
}
