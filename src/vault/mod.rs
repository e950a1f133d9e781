//! Vault module — encrypted record storage.
//!
//! This module provides:
//! - Encrypted row types for credentials, bills and notes (`records`)
//! - The `RecordStore` persistence seam and an in-memory store (`backend`)
//! - A SQLite record store (`sqlite`, feature `sqlite-store`)
//! - The high-level `Vault` that seals and opens records (`store`)

pub mod backend;
pub mod records;
#[cfg(feature = "sqlite-store")]
pub mod sqlite;
pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::VaultError;

// Re-export the most commonly used items.
pub use backend::{MemoryRecordStore, RecordStore};
pub use records::{BillRow, CredentialRow, Entry, NoteRow, SealedRow, Summary, VaultRecord};
#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteRecordStore;
pub use store::Vault;

/// The three kinds of record the vault holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Credential,
    Bill,
    Note,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Credential, RecordKind::Bill, RecordKind::Note];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Credential => "credential",
            RecordKind::Bill => "bill",
            RecordKind::Note => "note",
        }
    }

    /// Table (or collection) name used by record stores.
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Credential => "credentials",
            RecordKind::Bill => "bills",
            RecordKind::Note => "notes",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Credential => "Credential",
            RecordKind::Bill => "Bill",
            RecordKind::Note => "Note",
        };
        f.write_str(name)
    }
}

impl FromStr for RecordKind {
    type Err = VaultError;

    /// Accepts singular or plural names, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lowered || k.table() == lowered)
            .ok_or_else(|| {
                VaultError::InvalidRecord(format!(
                    "unknown record kind '{s}' (expected credential, bill or note)"
                ))
            })
    }
}
