//! `securevault list` — display records in a table, without secrets.

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::vault::RecordKind;

/// Execute the `list` command.
pub fn execute(ctx: &Context, kind: Option<RecordKind>) -> Result<()> {
    let vault = ctx.unlock_vault()?;

    let kinds = match kind {
        Some(kind) => vec![kind],
        None => RecordKind::ALL.to_vec(),
    };

    let mut summaries = Vec::new();
    for kind in kinds {
        summaries.extend(vault.summaries(kind)?);
    }

    output::info(&format!("{} record(s)", summaries.len()));
    output::print_summaries_table(&summaries);

    Ok(())
}
