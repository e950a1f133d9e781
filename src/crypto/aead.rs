//! AES-256-GCM authenticated encryption.
//!
//! Unlike a "nonce-prefixed blob" layout, the iv is returned and accepted
//! as a separate value: persisted fields and export envelopes both store
//! `iv` and `ciphertext` side by side, never concatenated.
//!
//! `ciphertext` always carries the 16-byte authentication tag at its end.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use super::fill_random;
use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM iv in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key` under a freshly generated iv.
///
/// The iv is never caller-supplied, so two calls with the same key and
/// plaintext produce unrelated outputs.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<([u8; IV_LEN], Vec<u8>)> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let mut iv = [0u8; IV_LEN];
    fill_random(&mut iv).map_err(VaultError::EncryptionFailed)?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    Ok((iv, ciphertext))
}

/// Decrypt and authenticate `ciphertext` (tag appended) under `key` and `iv`.
///
/// Any mismatch (key, iv, ciphertext or tag) yields `AuthenticationFailed`;
/// unauthenticated plaintext is never returned.
pub fn open(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if iv.len() != IV_LEN || ciphertext.len() < TAG_LEN {
        return Err(VaultError::AuthenticationFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::AuthenticationFailed)?;

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| VaultError::AuthenticationFailed)
}
