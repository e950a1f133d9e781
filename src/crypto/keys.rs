//! Key holders and HKDF-based wrap-key derivation.
//!
//! - `DeviceKey`: the one long-lived AES-256 key of an installation. Its
//!   bytes never leave the crate; callers only hold it through a
//!   `KeyProvider` and hand it back to `FieldCipher`.
//! - `SymmetricKey`: a passphrase- or HKDF-derived key of arbitrary length.
//!
//! Both wipe their memory when dropped and redact themselves in `Debug`.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::fill_random;
use crate::errors::{Result, VaultError};

/// Length of the device key in bytes (256 bits).
pub const DEVICE_KEY_LEN: usize = 32;

/// HKDF context for the key that wraps the device key inside a key file.
const WRAP_INFO: &[u8] = b"securevault-device-key-wrap";

/// The installation's data-encryption key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DeviceKey {
    bytes: [u8; DEVICE_KEY_LEN],
}

impl DeviceKey {
    /// Generate a new random device key.
    pub(crate) fn generate() -> Result<Self> {
        let mut bytes = [0u8; DEVICE_KEY_LEN];
        fill_random(&mut bytes).map_err(VaultError::KeyUnavailable)?;
        Ok(Self { bytes })
    }

    /// Rebuild a device key read back from a key store.
    pub(crate) fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; DEVICE_KEY_LEN] = bytes.try_into().map_err(|_| {
            VaultError::KeyUnavailable(format!(
                "stored device key has {} bytes, expected {DEVICE_KEY_LEN}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    pub(crate) fn as_bytes(&self) -> &[u8; DEVICE_KEY_LEN] {
        &self.bytes
    }
}

impl PartialEq for DeviceKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for DeviceKey {}

impl fmt::Debug for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceKey(..)")
    }
}

/// A derived symmetric key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to compare a hash or key a cipher).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-length key.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({} bytes)", self.bytes.len())
    }
}

/// Derive the key that wraps the device key from a high-entropy secret.
///
/// The secret is a random keyfile, not a passphrase, so HKDF expand is
/// enough; no stretching is applied.
pub fn derive_wrapping_key(secret: &[u8]) -> Result<SymmetricKey> {
    hkdf_derive(secret, WRAP_INFO)
}

/// Internal helper: run HKDF-SHA256 expand with the given `info`.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<SymmetricKey> {
    // `salt` is None: HKDF uses a zero-filled salt internally.
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = vec![0u8; DEVICE_KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| VaultError::KdfFailure(format!("HKDF expand failed: {e}")))?;

    Ok(SymmetricKey::new(okm))
}
