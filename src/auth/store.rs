//! Persistence of the master credential record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::atomic;
use crate::encoding::BASE64;
use crate::errors::{Result, VaultError};

/// Salt and PBKDF2 hash of the master password.
///
/// Neither value is secret in the way a key is, but both are kept out of
/// `Debug` output and wiped on drop all the same.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MasterCredential {
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

impl std::fmt::Debug for MasterCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterCredential")
            .field("salt", &format_args!("[{} bytes]", self.salt.len()))
            .field("hash", &format_args!("[{} bytes]", self.hash.len()))
            .finish()
    }
}

/// Where `VaultAuth` keeps the master credential.
///
/// `create` must write salt and hash together or not at all, and must fail
/// with `AlreadySetup` if a complete credential is already stored, even when
/// another writer got there between the caller's check and the write.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<MasterCredential>>;
    fn create(&self, credential: &MasterCredential) -> Result<()>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for &T {
    fn load(&self) -> Result<Option<MasterCredential>> {
        (**self).load()
    }

    fn create(&self, credential: &MasterCredential) -> Result<()> {
        (**self).create(credential)
    }
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<MasterCredential>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<MasterCredential>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| VaultError::Storage("credential store lock poisoned".into()))?;
        Ok(slot.clone())
    }

    fn create(&self, credential: &MasterCredential) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| VaultError::Storage("credential store lock poisoned".into()))?;
        if slot.is_some() {
            return Err(VaultError::AlreadySetup);
        }
        *slot = Some(credential.clone());
        Ok(())
    }
}

/// On-disk layout: two base64 strings under fixed keys.
#[derive(Default, Serialize, Deserialize)]
struct AuthFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_hash: Option<String>,
}

/// JSON file store, created atomically through a temp file and a
/// no-clobber rename.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<MasterCredential>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: AuthFile = serde_json::from_slice(&contents)
            .map_err(|e| VaultError::Storage(format!("credential file is corrupted: {e}")))?;

        let (Some(salt), Some(hash)) = (file.auth_salt, file.auth_hash) else {
            tracing::warn!(path = %self.path.display(), "credential file is incomplete, treating as not set up");
            return Ok(None);
        };

        let decode = |value: &str| {
            BASE64
                .decode(value)
                .map_err(|_| VaultError::Storage("credential file is corrupted".into()))
        };

        Ok(Some(MasterCredential {
            salt: decode(&salt)?,
            hash: decode(&hash)?,
        }))
    }

    fn create(&self, credential: &MasterCredential) -> Result<()> {
        let file = AuthFile {
            auth_salt: Some(BASE64.encode(&credential.salt)),
            auth_hash: Some(BASE64.encode(&credential.hash)),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| VaultError::Serialization(format!("credential file: {e}")))?;

        let tmp = atomic::stage(&self.path, &json)?;
        let err = match tmp.persist_noclobber(&self.path) {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };
        if err.error.kind() != ErrorKind::AlreadyExists {
            return Err(err.error.into());
        }

        // An incomplete record counts as not set up and may be replaced.
        if self.load()?.is_some() {
            return Err(VaultError::AlreadySetup);
        }
        tracing::warn!(path = %self.path.display(), "replacing incomplete credential file");
        err.file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
