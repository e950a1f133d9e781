//! Encrypted key-file custody, for platforms without a secure hardware store.
//!
//! `device.key` holds the device key sealed with AES-256-GCM under a key
//! derived (HKDF-SHA256) from a separate 32-byte keyfile:
//!
//! ```text
//! {"version":1,"iv":"<base64>","wrapped_key":"<base64>"}
//! ```
//!
//! The file is created with `persist_noclobber`, so two processes racing to
//! create it end up agreeing on whichever key landed first.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::KeyStore;
use crate::atomic;
use crate::crypto::keys::derive_wrapping_key;
use crate::crypto::{aead, DeviceKey, SymmetricKey};
use crate::encoding::{base64_decode, base64_encode};
use crate::errors::{Result, VaultError};

/// Current key-file layout version.
const KEY_FILE_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct WrappedKeyFile {
    version: u8,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    iv: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    wrapped_key: Vec<u8>,
}

pub struct FileKeyStore {
    path: PathBuf,
    wrapping_key: SymmetricKey,
}

impl FileKeyStore {
    /// Open a key file at `path`, wrapped under a key derived from `wrapping_secret`.
    ///
    /// Nothing is read until the first `load`.
    pub fn new(path: impl Into<PathBuf>, wrapping_secret: &[u8]) -> Result<Self> {
        Ok(Self {
            path: path.into(),
            wrapping_key: derive_wrapping_key(wrapping_secret)?,
        })
    }

    /// Path of the wrapped key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn wrap(&self, key: &DeviceKey) -> Result<Vec<u8>> {
        let (iv, wrapped_key) = aead::seal(self.wrapping_key.as_bytes(), key.as_bytes())?;
        let file = WrappedKeyFile {
            version: KEY_FILE_VERSION,
            iv: iv.to_vec(),
            wrapped_key,
        };
        serde_json::to_vec(&file)
            .map_err(|e| VaultError::Serialization(format!("key file: {e}")))
    }

    fn unwrap(&self, bytes: &[u8]) -> Result<DeviceKey> {
        let file: WrappedKeyFile = serde_json::from_slice(bytes)
            .map_err(|_| VaultError::KeyUnavailable("key file is corrupted".into()))?;

        if file.version != KEY_FILE_VERSION {
            return Err(VaultError::KeyUnavailable(format!(
                "unsupported key file version {}, expected {KEY_FILE_VERSION}",
                file.version
            )));
        }

        let raw = aead::open(self.wrapping_key.as_bytes(), &file.iv, &file.wrapped_key)
            .map(Zeroizing::new)
            .map_err(|_| {
                VaultError::KeyUnavailable(
                    "key file does not match the keyfile or is corrupted".into(),
                )
            })?;

        DeviceKey::from_slice(&raw)
    }
}

impl KeyStore for FileKeyStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    fn load(&self) -> Result<Option<DeviceKey>> {
        match fs::read(&self.path) {
            Ok(bytes) => self.unwrap(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::KeyUnavailable(format!(
                "cannot read key file {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn create_if_absent(&self, candidate: DeviceKey) -> Result<DeviceKey> {
        let bytes = self.wrap(&candidate)?;

        let tmp = atomic::stage(&self.path, &bytes).map_err(|e| {
            VaultError::KeyUnavailable(format!("cannot write key file: {e}"))
        })?;

        match tmp.persist_noclobber(&self.path) {
            Ok(_) => Ok(candidate),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(path = %self.path.display(), "key file created concurrently, using it");
                self.load()?.ok_or_else(|| {
                    VaultError::KeyUnavailable("key file vanished during creation".into())
                })
            }
            Err(e) => Err(VaultError::KeyUnavailable(format!(
                "cannot persist key file: {}",
                e.error
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{KeyGuard, KeyProvider};
    use tempfile::TempDir;

    const SECRET: [u8; 32] = [0x5A; 32];

    #[test]
    fn key_survives_reopening() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device.key");

        let first = KeyGuard::new(FileKeyStore::new(&path, &SECRET).unwrap())
            .get_or_create_key()
            .unwrap();
        assert!(path.exists());

        let second = KeyGuard::new(FileKeyStore::new(&path, &SECRET).unwrap())
            .get_or_create_key()
            .unwrap();
        assert_eq!(*first, *second);
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyStore::new(dir.path().join("device.key"), &SECRET).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn losing_writer_gets_the_stored_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device.key");
        let a = FileKeyStore::new(&path, &SECRET).unwrap();
        let b = FileKeyStore::new(&path, &SECRET).unwrap();

        let winner = DeviceKey::generate().unwrap();
        let loser = DeviceKey::generate().unwrap();

        assert_eq!(a.create_if_absent(winner.clone()).unwrap(), winner);
        assert_eq!(b.create_if_absent(loser).unwrap(), winner);
    }

    #[test]
    fn file_never_contains_the_raw_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device.key");
        let store = FileKeyStore::new(&path, &SECRET).unwrap();
        let key = store.create_if_absent(DeviceKey::generate().unwrap()).unwrap();

        let on_disk = fs::read(&path).unwrap();
        assert!(!on_disk
            .windows(key.as_bytes().len())
            .any(|w| w == key.as_bytes()));

        let parsed: serde_json::Value = serde_json::from_slice(&on_disk).unwrap();
        assert_eq!(parsed["version"], 1);
        assert!(parsed["iv"].is_string());
        assert!(parsed["wrapped_key"].is_string());
    }

    #[test]
    fn wrong_keyfile_is_key_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device.key");
        FileKeyStore::new(&path, &SECRET)
            .unwrap()
            .create_if_absent(DeviceKey::generate().unwrap())
            .unwrap();

        let other = FileKeyStore::new(&path, &[0xA5; 32]).unwrap();
        assert!(matches!(other.load(), Err(VaultError::KeyUnavailable(_))));
    }

    #[test]
    fn corrupted_file_is_key_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device.key");
        fs::write(&path, b"not json at all").unwrap();

        let guard = KeyGuard::new(FileKeyStore::new(&path, &SECRET).unwrap());
        assert!(matches!(
            guard.get_or_create_key(),
            Err(VaultError::KeyUnavailable(_))
        ));
    }
}
