//! `securevault add` — seal and store a new record.

use chrono::NaiveDate;
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{secret_or_prompt, AddRecord, Context};
use crate::errors::{Result, VaultError};
use crate::export::{PlainBill, PlainCredential, PlainNote};
use crate::vault::VaultRecord;

/// Execute the `add` command.
pub fn execute(ctx: &Context, record: AddRecord) -> Result<()> {
    let vault = ctx.unlock_vault()?;

    let (kind, id, title) = match record {
        AddRecord::Credential {
            title,
            username,
            password,
            url,
            notes,
        } => {
            let password = secret_or_prompt(password, "Password")?;
            let credential = Zeroizing::new(PlainCredential {
                title: title.clone(),
                username: username.unwrap_or_default(),
                password: password.to_string(),
                url: url.unwrap_or_default(),
                notes: notes.unwrap_or_default(),
            });
            (PlainCredential::KIND, vault.insert(&*credential)?, title)
        }
        AddRecord::Bill {
            name,
            amount,
            due,
            frequency,
            notes,
        } => {
            let due_date = parse_due_date(&due)?;
            let amount = secret_or_prompt(amount, "Amount")?;
            let bill = Zeroizing::new(PlainBill {
                bill_name: name.clone(),
                amount: amount.to_string(),
                notes: notes.unwrap_or_default(),
                due_date,
                frequency,
            });
            (PlainBill::KIND, vault.insert(&*bill)?, name)
        }
        AddRecord::Note { title, content } => {
            let content = secret_or_prompt(content, "Content")?;
            let note = Zeroizing::new(PlainNote {
                title: title.clone(),
                content: content.to_string(),
            });
            (PlainNote::KIND, vault.insert(&*note)?, title)
        }
    };

    output::success(&format!("Added {kind} #{id} '{title}'"));
    Ok(())
}

/// Parse `YYYY-MM-DD` into epoch milliseconds at UTC midnight.
fn parse_due_date(value: &str) -> Result<i64> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        VaultError::InvalidRecord(format!("due date '{value}' is not in YYYY-MM-DD form"))
    })?;
    date.and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc().timestamp_millis())
        .ok_or_else(|| VaultError::InvalidRecord(format!("due date '{value}' is out of range")))
}
