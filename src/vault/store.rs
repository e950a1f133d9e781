//! High-level vault operations used by CLI commands.
//!
//! `Vault` joins a `FieldCipher` with a `RecordStore` so that the rest of
//! the application works with plaintext records, e.g.
//! `vault.insert(&PlainNote { .. })`, while only sealed rows reach storage.

use chrono::Utc;

use super::backend::RecordStore;
use super::records::{Entry, SealedRow, Summary, VaultRecord};
use super::RecordKind;
use crate::crypto::FieldCipher;
use crate::errors::{Result, VaultError};
use crate::export::{AllRecords, PlainBill, PlainCredential, PlainNote};

pub struct Vault<S> {
    cipher: FieldCipher,
    store: S,
}

impl<S: RecordStore> Vault<S> {
    pub fn new(cipher: FieldCipher, store: S) -> Self {
        Self { cipher, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------
    // Single records
    // ------------------------------------------------------------------

    /// Seal and store a new record, returning its id.
    pub fn insert<R: VaultRecord>(&self, record: &R) -> Result<i64> {
        let body = encode_row(&record.seal(&self.cipher, now_millis())?)?;
        let id = self.store.insert(R::KIND, &body)?;
        tracing::debug!(kind = %R::KIND, id, "inserted record");
        Ok(id)
    }

    /// Replace a record. Every field is re-encrypted with a fresh iv.
    pub fn update<R: VaultRecord>(&self, id: i64, record: &R) -> Result<()> {
        let body = encode_row(&record.seal(&self.cipher, now_millis())?)?;
        self.store.update(R::KIND, id, &body)?;
        tracing::debug!(kind = %R::KIND, id, "updated record");
        Ok(())
    }

    /// Fetch and decrypt one record.
    pub fn get<R: VaultRecord>(&self, id: i64) -> Result<Entry<R>> {
        let body = self
            .store
            .get(R::KIND, id)?
            .ok_or(VaultError::RecordNotFound { kind: R::KIND, id })?;
        self.open_entry(id, &body)
    }

    /// Fetch and decrypt every record of one kind, in id order.
    pub fn list<R: VaultRecord>(&self) -> Result<Vec<Entry<R>>> {
        self.store
            .list(R::KIND)?
            .into_iter()
            .map(|(id, body)| self.open_entry(id, &body))
            .collect()
    }

    /// Clear metadata of every record of `kind`. Nothing is decrypted.
    pub fn summaries(&self, kind: RecordKind) -> Result<Vec<Summary>> {
        match kind {
            RecordKind::Credential => self.summaries_of::<PlainCredential>(),
            RecordKind::Bill => self.summaries_of::<PlainBill>(),
            RecordKind::Note => self.summaries_of::<PlainNote>(),
        }
    }

    pub fn delete(&self, kind: RecordKind, id: i64) -> Result<()> {
        if !self.store.delete(kind, id)? {
            return Err(VaultError::RecordNotFound { kind, id });
        }
        tracing::debug!(%kind, id, "deleted record");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Whole-vault operations
    // ------------------------------------------------------------------

    /// Decrypt everything, for export.
    pub fn snapshot(&self) -> Result<AllRecords> {
        Ok(AllRecords {
            credentials: self.records::<PlainCredential>()?,
            bills: self.records::<PlainBill>()?,
            notes: self.records::<PlainNote>()?,
        })
    }

    /// Add every record of `records` under the device key, for import.
    ///
    /// All rows are sealed first and then written as one batch, so a key or
    /// store failure leaves the vault untouched. Returns how many were added.
    pub fn restore(&self, records: &AllRecords) -> Result<usize> {
        let timestamp = now_millis();
        let mut bodies = Vec::with_capacity(records.len());

        for credential in &records.credentials {
            bodies.push((PlainCredential::KIND, self.seal_body(credential, timestamp)?));
        }
        for bill in &records.bills {
            bodies.push((PlainBill::KIND, self.seal_body(bill, timestamp)?));
        }
        for note in &records.notes {
            bodies.push((PlainNote::KIND, self.seal_body(note, timestamp)?));
        }

        let ids = self.store.insert_batch(&bodies)?;

        tracing::info!(records = ids.len(), "restored records");
        Ok(ids.len())
    }

    /// Remove every record.
    pub fn wipe(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("vault wiped");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn records<R: VaultRecord>(&self) -> Result<Vec<R>> {
        Ok(self.list::<R>()?.into_iter().map(|e| e.record).collect())
    }

    fn summaries_of<R: VaultRecord>(&self) -> Result<Vec<Summary>> {
        self.store
            .list(R::KIND)?
            .into_iter()
            .map(|(id, body)| {
                let row: R::Row = decode_row(R::KIND, id, &body)?;
                Ok(Summary {
                    kind: R::KIND,
                    id,
                    label: row.label().to_string(),
                    detail: row.detail(),
                    timestamp: row.timestamp(),
                })
            })
            .collect()
    }

    fn seal_body<R: VaultRecord>(&self, record: &R, timestamp: i64) -> Result<Vec<u8>> {
        encode_row(&record.seal(&self.cipher, timestamp)?)
    }

    fn open_entry<R: VaultRecord>(&self, id: i64, body: &[u8]) -> Result<Entry<R>> {
        let row: R::Row = decode_row(R::KIND, id, body)?;
        Ok(Entry {
            id,
            timestamp: row.timestamp(),
            record: R::open(&row, &self.cipher)?,
        })
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn encode_row<T: SealedRow>(row: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(row).map_err(|e| VaultError::Serialization(format!("record row: {e}")))
}

fn decode_row<T: SealedRow>(kind: RecordKind, id: i64, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|_| VaultError::Storage(format!("{kind} #{id} is corrupted")))
}
