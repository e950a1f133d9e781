//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{DateTime, Local};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::Summary;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Format epoch milliseconds in local time, or "-" if out of range.
pub fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format epoch milliseconds as a UTC calendar date (bill due dates).
pub fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Print a table of record summaries (Kind, ID, Title, Details, Updated).
pub fn print_summaries_table(summaries: &[Summary]) {
    if summaries.is_empty() {
        info("No records in this vault yet.");
        tip("Run `securevault add credential <TITLE>` to add your first record.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Kind", "ID", "Title", "Details", "Updated"]);

    for s in summaries {
        table.add_row(vec![
            s.kind.to_string(),
            s.id.to_string(),
            s.label.clone(),
            s.detail.clone(),
            format_millis(s.timestamp),
        ]);
    }

    println!("{table}");
}

/// Print a decrypted record as a two-column Field/Value table.
pub fn print_fields(fields: &[(&str, &str)]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);

    for (name, value) in fields {
        table.add_row(vec![*name, *value]);
    }

    println!("{table}");
}
