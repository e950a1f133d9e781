//! Cryptographic primitives for SecureVault.
//!
//! This module provides:
//! - AES-256-GCM sealing with an explicit 12-byte iv (`aead`)
//! - PBKDF2-HMAC-SHA256 passphrase key derivation and its two fixed profiles (`kdf`)
//! - Zeroizing key holders and HKDF wrap-key derivation (`keys`)
//! - The random wrapping secret used by the file key store (`keyfile`)
//! - Per-field encryption under the device key (`field`)

pub mod aead;
pub mod field;
pub mod kdf;
pub mod keyfile;
pub mod keys;

pub use aead::{open, seal, IV_LEN, TAG_LEN};
pub use field::{EncryptedField, FieldCipher};
pub use kdf::{derive, KdfProfile, AUTH_PROFILE, EXPORT_PROFILE};
pub use keys::{DeviceKey, SymmetricKey};

use rand::rngs::OsRng;
use rand::TryRngCore;

/// Fill `buf` from the operating system CSPRNG.
///
/// The error is stringified so each caller can fold it into the
/// failure variant that fits its operation.
pub(crate) fn fill_random(buf: &mut [u8]) -> std::result::Result<(), String> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| format!("OS random generator unavailable: {e}"))
}
