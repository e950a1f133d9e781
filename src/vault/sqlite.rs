//! SQLite record store.
//!
//! One table per record kind, each row an id and the serialized encrypted
//! row. Nothing in the database is plaintext beyond the clear metadata the
//! rows themselves carry.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::backend::RecordStore;
use super::RecordKind;
use crate::errors::{Result, VaultError};

pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(storage)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "opened record database");
        Self::with_connection(conn)
    }

    /// Throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(storage)?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        Self::create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn create_tables(conn: &Connection) -> Result<()> {
        for kind in RecordKind::ALL {
            conn.execute(
                &format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        body BLOB NOT NULL
                    )
                    "#,
                    kind.table()
                ),
                [],
            )
            .map_err(storage)?;
        }
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VaultError::Storage("database lock poisoned".into()))
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert(&self, kind: RecordKind, body: &[u8]) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO {} (body) VALUES (?1)", kind.table()),
            params![body],
        )
        .map_err(storage)?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_batch(&self, rows: &[(RecordKind, Vec<u8>)]) -> Result<Vec<i64>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(storage)?;

        let mut ids = Vec::with_capacity(rows.len());
        for (kind, body) in rows {
            tx.execute(
                &format!("INSERT INTO {} (body) VALUES (?1)", kind.table()),
                params![body],
            )
            .map_err(storage)?;
            ids.push(tx.last_insert_rowid());
        }

        tx.commit().map_err(storage)?;
        Ok(ids)
    }

    fn update(&self, kind: RecordKind, id: i64, body: &[u8]) -> Result<()> {
        let rows = self
            .conn()?
            .execute(
                &format!("UPDATE {} SET body = ?1 WHERE id = ?2", kind.table()),
                params![body, id],
            )
            .map_err(storage)?;

        if rows == 0 {
            return Err(VaultError::RecordNotFound { kind, id });
        }
        Ok(())
    }

    fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Vec<u8>>> {
        self.conn()?
            .query_row(
                &format!("SELECT body FROM {} WHERE id = ?1", kind.table()),
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage)
    }

    fn list(&self, kind: RecordKind) -> Result<Vec<(i64, Vec<u8>)>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT id, body FROM {} ORDER BY id ASC", kind.table()))
            .map_err(storage)?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(storage)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(storage)?;

        Ok(rows)
    }

    fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        let rows = self
            .conn()?
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
                params![id],
            )
            .map_err(storage)?;
        Ok(rows > 0)
    }

    fn clear(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(storage)?;
        for kind in RecordKind::ALL {
            tx.execute(&format!("DELETE FROM {}", kind.table()), [])
                .map_err(storage)?;
        }
        tx.commit().map_err(storage)
    }
}

fn storage(err: rusqlite::Error) -> VaultError {
    VaultError::Storage(err.to_string())
}
