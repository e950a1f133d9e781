//! `securevault show` — print one decrypted record.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::export::{PlainBill, PlainCredential, PlainNote};
use crate::vault::RecordKind;

/// Execute the `show` command.
pub fn execute(ctx: &Context, kind: RecordKind, id: i64) -> Result<()> {
    let vault = ctx.unlock_vault()?;

    match kind {
        RecordKind::Credential => {
            let entry = vault.get::<PlainCredential>(id)?;
            let updated = output::format_millis(entry.timestamp);
            let c = Zeroizing::new(entry.record);
            output::print_fields(&[
                ("Title", c.title.as_str()),
                ("Username", c.username.as_str()),
                ("Password", c.password.as_str()),
                ("URL", c.url.as_str()),
                ("Notes", c.notes.as_str()),
                ("Updated", updated.as_str()),
            ]);
        }
        RecordKind::Bill => {
            let entry = vault.get::<PlainBill>(id)?;
            let updated = output::format_millis(entry.timestamp);
            let b = Zeroizing::new(entry.record);
            let due = output::format_date(b.due_date);
            output::print_fields(&[
                ("Bill", b.bill_name.as_str()),
                ("Amount", b.amount.as_str()),
                ("Due", due.as_str()),
                ("Frequency", b.frequency.as_str()),
                ("Notes", b.notes.as_str()),
                ("Updated", updated.as_str()),
            ]);
        }
        RecordKind::Note => {
            let entry = vault.get::<PlainNote>(id)?;
            let updated = output::format_millis(entry.timestamp);
            let n = Zeroizing::new(entry.record);
            output::print_fields(&[
                ("Title", n.title.as_str()),
                ("Content", n.content.as_str()),
                ("Updated", updated.as_str()),
            ]);
        }
    }

    Ok(())
}
