//! Passphrase-encrypted export bundle.
//!
//! ```text
//! {"salt":"<base64 16 bytes>","iv":"<base64 12 bytes>","data":"<base64>"}
//! ```
//!
//! `data` is AES-256-GCM (tag appended) over the JSON form of `AllRecords`,
//! under `PBKDF2-HMAC-SHA256(passphrase, salt, 65536)`. Older bundles carry
//! a bare JSON array of credentials instead.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::records::{AllRecords, PlainCredential};
use crate::atomic;
use crate::crypto::{aead, EXPORT_PROFILE};
use crate::encoding::{base64_decode, base64_encode};
use crate::errors::{Result, VaultError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBundle {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub iv: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub data: Vec<u8>,
}

impl ExportBundle {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::ExportFailed(format!("cannot serialize bundle: {e}")))
    }

    /// Parse a bundle. Anything malformed is an `ImportFailed`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|_| VaultError::ImportFailed)
    }

    /// Read and parse a bundle. I/O errors are reported as such.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                VaultError::ImportFailed
            } else {
                VaultError::Io(e)
            }
        })?;
        Self::from_json(&contents)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let json = self.to_json()?;
        writer
            .write_all(json.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| VaultError::ExportFailed(format!("cannot write bundle: {e}")))
    }

    /// Write to `path` via a temp file and rename, leaving no partial file
    /// behind on failure.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        atomic::write_file(path, json.as_bytes())
            .map_err(|e| VaultError::ExportFailed(format!("cannot write {}: {e}", path.display())))
    }
}

/// Encrypt `records` into a fresh bundle under `passphrase`.
pub fn export_data(passphrase: &str, records: &AllRecords) -> Result<ExportBundle> {
    let salt = EXPORT_PROFILE.generate_salt().map_err(export_failed)?;
    let key = EXPORT_PROFILE.derive(passphrase, &salt).map_err(export_failed)?;

    let payload = serde_json::to_vec(records)
        .map(Zeroizing::new)
        .map_err(|e| VaultError::ExportFailed(format!("cannot serialize records: {e}")))?;

    let (iv, data) = aead::seal(key.as_bytes(), &payload).map_err(export_failed)?;

    tracing::debug!(records = records.len(), "export bundle sealed");
    Ok(ExportBundle {
        salt,
        iv: iv.to_vec(),
        data,
    })
}

/// Decrypt a bundle produced by `export_data` (or the older credentials-only form).
///
/// Every failure, wrong passphrase and corrupted data alike, is `ImportFailed`.
pub fn import_data(passphrase: &str, bundle: &ExportBundle) -> Result<AllRecords> {
    let result = open_bundle(passphrase, bundle);
    if result.is_err() {
        tracing::warn!("import rejected");
    }
    result.map_err(|_| VaultError::ImportFailed)
}

fn open_bundle(passphrase: &str, bundle: &ExportBundle) -> Result<AllRecords> {
    let key = EXPORT_PROFILE.derive(passphrase, &bundle.salt)?;
    let payload = Zeroizing::new(aead::open(key.as_bytes(), &bundle.iv, &bundle.data)?);
    decode_payload(&payload)
}

/// Current schema first, then the legacy credentials-only list.
fn decode_payload(payload: &[u8]) -> Result<AllRecords> {
    if let Ok(records) = serde_json::from_slice::<AllRecords>(payload) {
        return Ok(records);
    }

    let legacy = serde_json::from_slice::<Vec<PlainCredential>>(payload)
        .map_err(|_| VaultError::ImportFailed)?;
    tracing::debug!(credentials = legacy.len(), "decoded legacy bundle");
    Ok(AllRecords::from_legacy(legacy))
}

fn export_failed(err: VaultError) -> VaultError {
    match err {
        VaultError::ExportFailed(_) => err,
        other => VaultError::ExportFailed(other.to_string()),
    }
}
