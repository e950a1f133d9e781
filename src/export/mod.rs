//! Backup and restore of all records through a passphrase-encrypted bundle.

pub mod envelope;
pub mod records;

pub use envelope::{export_data, import_data, ExportBundle};
pub use records::{AllRecords, BillFrequency, PlainBill, PlainCredential, PlainNote};
