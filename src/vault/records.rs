//! Encrypted rows and their mapping to plaintext records.
//!
//! Every sensitive value is its own `EncryptedField`; titles, bill names,
//! due dates and frequencies stay in clear so lists can be shown without
//! touching the device key.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::RecordKind;
use crate::crypto::{EncryptedField, FieldCipher};
use crate::errors::Result;
use crate::export::{BillFrequency, PlainBill, PlainCredential, PlainNote};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRow {
    pub title: String,
    pub username: EncryptedField,
    pub password: EncryptedField,
    pub url: EncryptedField,
    pub notes: EncryptedField,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRow {
    pub bill_name: String,
    pub amount: EncryptedField,
    pub notes: EncryptedField,
    pub due_date: i64,
    pub frequency: BillFrequency,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRow {
    pub title: String,
    pub content: EncryptedField,
    pub timestamp: i64,
}

/// Clear metadata every row exposes.
pub trait SealedRow: Serialize + DeserializeOwned {
    /// Last insert/update time, epoch milliseconds.
    fn timestamp(&self) -> i64;

    /// Title shown in listings.
    fn label(&self) -> &str;

    /// Extra clear metadata for listings (empty if none).
    fn detail(&self) -> String {
        String::new()
    }
}

/// A plaintext record that can be sealed into a row and opened back.
pub trait VaultRecord: Sized {
    const KIND: RecordKind;
    type Row: SealedRow;

    /// Encrypt every sensitive field with a fresh iv.
    fn seal(&self, cipher: &FieldCipher, timestamp: i64) -> Result<Self::Row>;

    fn open(row: &Self::Row, cipher: &FieldCipher) -> Result<Self>;
}

/// A stored record with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<R> {
    pub id: i64,
    pub timestamp: i64,
    pub record: R,
}

/// What a listing shows about a row, without decrypting anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub kind: RecordKind,
    pub id: i64,
    pub label: String,
    pub detail: String,
    pub timestamp: i64,
}

impl SealedRow for CredentialRow {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn label(&self) -> &str {
        &self.title
    }
}

impl SealedRow for BillRow {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn label(&self) -> &str {
        &self.bill_name
    }

    fn detail(&self) -> String {
        match DateTime::from_timestamp_millis(self.due_date) {
            Some(due) => format!("due {}, {}", due.format("%Y-%m-%d"), self.frequency),
            None => self.frequency.to_string(),
        }
    }
}

impl SealedRow for NoteRow {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn label(&self) -> &str {
        &self.title
    }
}

impl VaultRecord for PlainCredential {
    const KIND: RecordKind = RecordKind::Credential;
    type Row = CredentialRow;

    fn seal(&self, cipher: &FieldCipher, timestamp: i64) -> Result<CredentialRow> {
        Ok(CredentialRow {
            title: self.title.clone(),
            username: cipher.encrypt_str(&self.username)?,
            password: cipher.encrypt_str(&self.password)?,
            url: cipher.encrypt_str(&self.url)?,
            notes: cipher.encrypt_str(&self.notes)?,
            timestamp,
        })
    }

    fn open(row: &CredentialRow, cipher: &FieldCipher) -> Result<Self> {
        Ok(PlainCredential {
            title: row.title.clone(),
            username: cipher.decrypt_string(&row.username)?,
            password: cipher.decrypt_string(&row.password)?,
            url: cipher.decrypt_string(&row.url)?,
            notes: cipher.decrypt_string(&row.notes)?,
        })
    }
}

impl VaultRecord for PlainBill {
    const KIND: RecordKind = RecordKind::Bill;
    type Row = BillRow;

    fn seal(&self, cipher: &FieldCipher, timestamp: i64) -> Result<BillRow> {
        Ok(BillRow {
            bill_name: self.bill_name.clone(),
            amount: cipher.encrypt_str(&self.amount)?,
            notes: cipher.encrypt_str(&self.notes)?,
            due_date: self.due_date,
            frequency: self.frequency,
            timestamp,
        })
    }

    fn open(row: &BillRow, cipher: &FieldCipher) -> Result<Self> {
        Ok(PlainBill {
            bill_name: row.bill_name.clone(),
            amount: cipher.decrypt_string(&row.amount)?,
            notes: cipher.decrypt_string(&row.notes)?,
            due_date: row.due_date,
            frequency: row.frequency,
        })
    }
}

impl VaultRecord for PlainNote {
    const KIND: RecordKind = RecordKind::Note;
    type Row = NoteRow;

    fn seal(&self, cipher: &FieldCipher, timestamp: i64) -> Result<NoteRow> {
        Ok(NoteRow {
            title: self.title.clone(),
            content: cipher.encrypt_str(&self.content)?,
            timestamp,
        })
    }

    fn open(row: &NoteRow, cipher: &FieldCipher) -> Result<Self> {
        Ok(PlainNote {
            title: row.title.clone(),
            content: cipher.decrypt_string(&row.content)?,
        })
    }
}
