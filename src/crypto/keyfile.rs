//! Keyfile backing the file-based device key store.
//!
//! A keyfile is 32 random bytes kept next to (or away from) the wrapped
//! device key. `FileKeyStore` derives its wrapping key from it, so copying
//! `device.key` alone does not reveal the device key.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use zeroize::Zeroizing;

use super::fill_random;
use crate::atomic;
use crate::errors::{Result, VaultError};

/// Expected length of a keyfile in bytes (256 bits).
pub const KEYFILE_LEN: usize = 32;

/// Generate a new random keyfile at `path`.
///
/// Fails if the file already exists. The bytes are staged in an owner-only
/// temp file and moved into place without clobbering, so the keyfile is
/// never visible half-written. Returns the raw keyfile bytes so the caller
/// can use them immediately.
pub fn generate_keyfile(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let mut keyfile = Zeroizing::new(vec![0u8; KEYFILE_LEN]);
    fill_random(&mut keyfile).map_err(VaultError::Keyfile)?;

    let tmp = atomic::stage(path, &keyfile)
        .map_err(|e| VaultError::Keyfile(format!("failed to write keyfile: {e}")))?;

    tmp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            VaultError::Keyfile(format!("keyfile already exists at {}", path.display()))
        } else {
            VaultError::Keyfile(format!("failed to create keyfile: {}", e.error))
        }
    })?;

    Ok(keyfile)
}

/// Load a keyfile from disk and validate its length.
pub fn load_keyfile(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    let data = match fs::read(path) {
        Ok(data) => Zeroizing::new(data),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(VaultError::Keyfile(format!(
                "keyfile not found at {}",
                path.display()
            )));
        }
        Err(e) => return Err(VaultError::Keyfile(format!("failed to read keyfile: {e}"))),
    };

    if data.len() != KEYFILE_LEN {
        return Err(VaultError::Keyfile(format!(
            "keyfile must be exactly {KEYFILE_LEN} bytes, got {}",
            data.len()
        )));
    }

    Ok(data)
}

/// Load the keyfile at `path`, generating it on first use.
///
/// If another process creates the file between the existence check and
/// our own creation attempt, its keyfile wins and is loaded.
pub fn load_or_generate(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    if path.exists() {
        return load_keyfile(path);
    }

    match generate_keyfile(path) {
        Ok(bytes) => {
            tracing::info!(path = %path.display(), "generated new keyfile");
            Ok(bytes)
        }
        Err(_) if path.exists() => load_keyfile(path),
        Err(e) => Err(e),
    }
}
