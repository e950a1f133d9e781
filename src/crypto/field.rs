//! Per-field authenticated encryption under the device key.
//!
//! Every sensitive value of a record (a password, a note body, a bill
//! amount) is stored as its own `EncryptedField`. Updating a value never
//! edits a field in place: it produces a brand-new field with a fresh iv.
//!
//! No record or field identity is bound into the AEAD associated data, so
//! two fields encrypted under the same device key can be swapped by someone
//! with write access to the store without the tag noticing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::aead;
use crate::encoding::{base64_decode, base64_encode};
use crate::errors::{Result, VaultError};
use crate::keystore::KeyProvider;

/// One encrypted value: a 12-byte iv and the ciphertext with its tag.
///
/// Serialized as two independent base64 strings, `iv` and `ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub iv: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub ciphertext: Vec<u8>,
}

/// Stateless field encryption backed by a `KeyProvider`.
///
/// Cheap to clone; clones share the same provider.
#[derive(Clone)]
pub struct FieldCipher {
    keys: Arc<dyn KeyProvider>,
}

impl FieldCipher {
    pub fn new(keys: Arc<dyn KeyProvider>) -> Self {
        Self { keys }
    }

    /// Encrypt `plaintext` under the device key with a fresh random iv.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedField> {
        let key = self.keys.get_or_create_key()?;
        let (iv, ciphertext) = aead::seal(key.as_bytes(), plaintext)?;
        Ok(EncryptedField {
            iv: iv.to_vec(),
            ciphertext,
        })
    }

    /// Decrypt and authenticate a ciphertext produced by `encrypt`.
    ///
    /// Fails with `AuthenticationFailed` if the ciphertext, iv or key do
    /// not match.
    pub fn decrypt(&self, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let key = self.keys.get_or_create_key()?;
        aead::open(key.as_bytes(), iv, ciphertext)
    }

    /// Decrypt a stored field.
    pub fn open(&self, field: &EncryptedField) -> Result<Vec<u8>> {
        self.decrypt(&field.iv, &field.ciphertext)
    }

    /// Encrypt a UTF-8 string value.
    pub fn encrypt_str(&self, value: &str) -> Result<EncryptedField> {
        self.encrypt(value.as_bytes())
    }

    /// Decrypt a field that holds a UTF-8 string value.
    pub fn decrypt_string(&self, field: &EncryptedField) -> Result<String> {
        let bytes = self.open(field)?;

        // On error, zeroize the bytes inside the error before discarding.
        String::from_utf8(bytes).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            VaultError::InvalidRecord("decrypted field is not valid UTF-8".to_string())
        })
    }
}
