//! Persistence seam for encrypted rows.
//!
//! A `RecordStore` keeps opaque byte bodies keyed by `(RecordKind, id)`.
//! Ids are assigned by the store, start at 1 and are never reused within
//! a kind, even after `delete` or `clear`.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::RecordKind;
use crate::errors::{Result, VaultError};

pub trait RecordStore: Send + Sync {
    /// Store a new body and return its id.
    fn insert(&self, kind: RecordKind, body: &[u8]) -> Result<i64>;

    /// Store several bodies at once, all or nothing. Returns their ids in
    /// input order.
    fn insert_batch(&self, rows: &[(RecordKind, Vec<u8>)]) -> Result<Vec<i64>>;

    /// Replace the body of an existing row. `RecordNotFound` if absent.
    fn update(&self, kind: RecordKind, id: i64, body: &[u8]) -> Result<()>;

    fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Vec<u8>>>;

    /// All rows of `kind`, in ascending id order.
    fn list(&self, kind: RecordKind) -> Result<Vec<(i64, Vec<u8>)>>;

    /// Remove a row. Returns `false` if there was nothing to remove.
    fn delete(&self, kind: RecordKind, id: i64) -> Result<bool>;

    /// Remove every row of every kind.
    fn clear(&self) -> Result<()>;
}

impl RecordStore for Box<dyn RecordStore> {
    fn insert(&self, kind: RecordKind, body: &[u8]) -> Result<i64> {
        (**self).insert(kind, body)
    }

    fn insert_batch(&self, rows: &[(RecordKind, Vec<u8>)]) -> Result<Vec<i64>> {
        (**self).insert_batch(rows)
    }

    fn update(&self, kind: RecordKind, id: i64, body: &[u8]) -> Result<()> {
        (**self).update(kind, id, body)
    }

    fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Vec<u8>>> {
        (**self).get(kind, id)
    }

    fn list(&self, kind: RecordKind) -> Result<Vec<(i64, Vec<u8>)>> {
        (**self).list(kind)
    }

    fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        (**self).delete(kind, id)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

#[derive(Default)]
struct Tables {
    rows: BTreeMap<(RecordKind, i64), Vec<u8>>,
    last_id: BTreeMap<RecordKind, i64>,
}

/// Record store held entirely in process memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
}

impl MemoryRecordStore {
    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| VaultError::Storage("record store lock poisoned".into()))
    }
}

impl Tables {
    fn insert(&mut self, kind: RecordKind, body: &[u8]) -> i64 {
        let last = self.last_id.entry(kind).or_insert(0);
        *last += 1;
        let id = *last;
        self.rows.insert((kind, id), body.to_vec());
        id
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&self, kind: RecordKind, body: &[u8]) -> Result<i64> {
        Ok(self.tables()?.insert(kind, body))
    }

    fn insert_batch(&self, rows: &[(RecordKind, Vec<u8>)]) -> Result<Vec<i64>> {
        let mut tables = self.tables()?;
        Ok(rows
            .iter()
            .map(|(kind, body)| tables.insert(*kind, body))
            .collect())
    }

    fn update(&self, kind: RecordKind, id: i64, body: &[u8]) -> Result<()> {
        let mut tables = self.tables()?;
        match tables.rows.get_mut(&(kind, id)) {
            Some(existing) => {
                *existing = body.to_vec();
                Ok(())
            }
            None => Err(VaultError::RecordNotFound { kind, id }),
        }
    }

    fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Vec<u8>>> {
        Ok(self.tables()?.rows.get(&(kind, id)).cloned())
    }

    fn list(&self, kind: RecordKind) -> Result<Vec<(i64, Vec<u8>)>> {
        let tables = self.tables()?;
        Ok(tables
            .rows
            .range((kind, i64::MIN)..=(kind, i64::MAX))
            .map(|(&(_, id), body)| (id, body.clone()))
            .collect())
    }

    fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        Ok(self.tables()?.rows.remove(&(kind, id)).is_some())
    }

    fn clear(&self) -> Result<()> {
        self.tables()?.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_per_kind_and_never_reused() {
        let store = MemoryRecordStore::default();
        assert_eq!(store.insert(RecordKind::Note, b"a").unwrap(), 1);
        assert_eq!(store.insert(RecordKind::Note, b"b").unwrap(), 2);
        assert_eq!(store.insert(RecordKind::Bill, b"c").unwrap(), 1);

        assert!(store.delete(RecordKind::Note, 2).unwrap());
        assert_eq!(store.insert(RecordKind::Note, b"d").unwrap(), 3);

        store.clear().unwrap();
        assert_eq!(store.insert(RecordKind::Note, b"e").unwrap(), 4);
    }

    #[test]
    fn batch_insert_assigns_ids_in_order() {
        let store = MemoryRecordStore::default();
        store.insert(RecordKind::Note, b"n1").unwrap();

        let ids = store
            .insert_batch(&[
                (RecordKind::Note, b"n2".to_vec()),
                (RecordKind::Bill, b"b1".to_vec()),
                (RecordKind::Note, b"n3".to_vec()),
            ])
            .unwrap();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(store.list(RecordKind::Note).unwrap().len(), 3);
    }

    #[test]
    fn list_is_scoped_to_kind() {
        let store = MemoryRecordStore::default();
        store.insert(RecordKind::Credential, b"c1").unwrap();
        store.insert(RecordKind::Note, b"n1").unwrap();
        store.insert(RecordKind::Credential, b"c2").unwrap();

        let creds = store.list(RecordKind::Credential).unwrap();
        assert_eq!(creds, vec![(1, b"c1".to_vec()), (2, b"c2".to_vec())]);
        assert!(store.list(RecordKind::Bill).unwrap().is_empty());
    }

    #[test]
    fn update_missing_row_is_not_found() {
        let store = MemoryRecordStore::default();
        assert!(matches!(
            store.update(RecordKind::Bill, 9, b"x"),
            Err(VaultError::RecordNotFound {
                kind: RecordKind::Bill,
                id: 9
            })
        ));
        assert!(!store.delete(RecordKind::Bill, 9).unwrap());
        assert!(store.get(RecordKind::Bill, 9).unwrap().is_none());
    }
}
