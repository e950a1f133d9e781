//! Passphrase-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! Two call sites derive keys from passphrases, each with its own fixed
//! work factor. The profiles are part of the on-disk formats: changing
//! `AUTH_PROFILE` makes every stored master credential unverifiable and
//! changing `EXPORT_PROFILE` makes every existing export bundle unreadable.
//! They are deliberately kept separate and are not configurable.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use super::fill_random;
use super::keys::SymmetricKey;
use crate::errors::{Result, VaultError};

/// Longest passphrase accepted, in UTF-8 bytes.
pub const MAX_PASSPHRASE_LEN: usize = 4096;

/// Largest derived key accepted, in bits.
const MAX_KEY_BITS: u32 = 4096;

/// A salt length plus PBKDF2 work factor and output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfProfile {
    /// Salt length in bytes for freshly generated salts.
    pub salt_len: usize,
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Derived key length in bits.
    pub key_bits: u32,
}

/// Master-passphrase hashing: 32-byte salt, 100 000 iterations, 256-bit hash.
pub const AUTH_PROFILE: KdfProfile = KdfProfile {
    salt_len: 32,
    iterations: 100_000,
    key_bits: 256,
};

/// Export/import envelopes: 16-byte salt, 65 536 iterations, 256-bit AES key.
pub const EXPORT_PROFILE: KdfProfile = KdfProfile {
    salt_len: 16,
    iterations: 65_536,
    key_bits: 256,
};

impl KdfProfile {
    /// Generate a fresh random salt of this profile's length.
    pub fn generate_salt(&self) -> Result<Vec<u8>> {
        let mut salt = vec![0u8; self.salt_len];
        fill_random(&mut salt).map_err(VaultError::KdfFailure)?;
        Ok(salt)
    }

    /// Derive a key from `passphrase` and `salt` with this profile's work factor.
    pub fn derive(&self, passphrase: &str, salt: &[u8]) -> Result<SymmetricKey> {
        derive(passphrase, salt, self.iterations, self.key_bits)
    }
}

/// Derive a `key_bits`-bit key from a passphrase with PBKDF2-HMAC-SHA256.
///
/// The passphrase is fed in as its UTF-8 bytes. The same inputs always
/// produce the same key.
pub fn derive(passphrase: &str, salt: &[u8], iterations: u32, key_bits: u32) -> Result<SymmetricKey> {
    if passphrase.len() > MAX_PASSPHRASE_LEN {
        return Err(VaultError::KdfFailure(format!(
            "passphrase exceeds {MAX_PASSPHRASE_LEN} bytes"
        )));
    }
    if salt.is_empty() {
        return Err(VaultError::KdfFailure("salt must not be empty".into()));
    }
    if iterations < 1 {
        return Err(VaultError::KdfFailure(
            "PBKDF2 iterations must be at least 1".into(),
        ));
    }
    if key_bits == 0 || key_bits % 8 != 0 || key_bits > MAX_KEY_BITS {
        return Err(VaultError::KdfFailure(format!(
            "key length must be a positive multiple of 8 bits up to {MAX_KEY_BITS} (got {key_bits})"
        )));
    }

    let mut out = vec![0u8; (key_bits / 8) as usize];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, &mut out);
    Ok(SymmetricKey::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn profiles_match_the_stored_formats() {
        assert_eq!(AUTH_PROFILE.salt_len, 32);
        assert_eq!(AUTH_PROFILE.iterations, 100_000);
        assert_eq!(AUTH_PROFILE.key_bits, 256);

        assert_eq!(EXPORT_PROFILE.salt_len, 16);
        assert_eq!(EXPORT_PROFILE.iterations, 65_536);
        assert_eq!(EXPORT_PROFILE.key_bits, 256);

        assert_ne!(AUTH_PROFILE, EXPORT_PROFILE);
    }

    #[test]
    fn known_answer_vectors() {
        let one = derive("password", b"salt", 1, 256).unwrap();
        assert_eq!(
            hex(one.as_bytes()),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );

        let two = derive("password", b"salt", 2, 256).unwrap();
        assert_eq!(
            hex(two.as_bytes()),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );

        let many = derive("password", b"salt", 4096, 256).unwrap();
        assert_eq!(
            hex(many.as_bytes()),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn output_length_follows_key_bits() {
        assert_eq!(derive("pw", b"salt", 10, 128).unwrap().len(), 16);
        assert_eq!(derive("pw", b"salt", 10, 256).unwrap().len(), 32);
        assert_eq!(derive("pw", b"salt", 10, 512).unwrap().len(), 64);
    }

    #[test]
    fn generated_salts_have_profile_length_and_differ() {
        let a = EXPORT_PROFILE.generate_salt().unwrap();
        let b = EXPORT_PROFILE.generate_salt().unwrap();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert_eq!(AUTH_PROFILE.generate_salt().unwrap().len(), 32);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(matches!(derive("pw", b"", 10, 256), Err(VaultError::KdfFailure(_))));
        assert!(matches!(derive("pw", b"salt", 0, 256), Err(VaultError::KdfFailure(_))));
        assert!(matches!(derive("pw", b"salt", 10, 0), Err(VaultError::KdfFailure(_))));
        assert!(matches!(derive("pw", b"salt", 10, 255), Err(VaultError::KdfFailure(_))));
    }

    #[test]
    fn passphrase_length_limit() {
        let longest = "a".repeat(MAX_PASSPHRASE_LEN);
        assert!(derive(&longest, b"salt", 1, 256).is_ok());

        let too_long = "a".repeat(MAX_PASSPHRASE_LEN + 1);
        assert!(matches!(
            derive(&too_long, b"salt", 1, 256),
            Err(VaultError::KdfFailure(_))
        ));
    }
}
