//! Master password setup and verification.
//!
//! `VaultAuth` has two states, not set up and set up. Setup stores a fresh
//! 32-byte salt together with `PBKDF2-HMAC-SHA256(password, salt, 100000)`;
//! verification recomputes the hash and compares it in constant time.

pub mod store;

pub use store::{CredentialStore, FileCredentialStore, MasterCredential, MemoryCredentialStore};

use subtle::ConstantTimeEq;

use crate::crypto::AUTH_PROFILE;
use crate::errors::{Result, VaultError};

pub struct VaultAuth<S> {
    store: S,
}

impl<S: CredentialStore> VaultAuth<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// True iff both a salt and a hash are stored.
    pub fn is_setup(&self) -> Result<bool> {
        Ok(self.store.load()?.is_some())
    }

    /// Derive and persist the master credential. Only valid before setup.
    ///
    /// Of two concurrent setups exactly one succeeds; the other gets
    /// `AlreadySetup` from the store.
    pub fn setup_master_password(&self, password: &str) -> Result<()> {
        if self.is_setup()? {
            return Err(VaultError::AlreadySetup);
        }

        let salt = AUTH_PROFILE.generate_salt()?;
        let hash = AUTH_PROFILE.derive(password, &salt)?;
        let credential = MasterCredential {
            salt,
            hash: hash.as_bytes().to_vec(),
        };

        self.store.create(&credential)?;
        tracing::info!("master password set up");
        Ok(())
    }

    /// Check `password` against the stored credential.
    ///
    /// Returns `NotSetup` if no credential exists yet.
    pub fn verify_master_password(&self, password: &str) -> Result<bool> {
        let credential = self.store.load()?.ok_or(VaultError::NotSetup)?;
        let candidate = AUTH_PROFILE.derive(password, &credential.salt)?;

        let matches = constant_time_eq(candidate.as_bytes(), &credential.hash);
        if !matches {
            tracing::warn!("master password verification failed");
        }
        Ok(matches)
    }

    /// Like `verify_master_password`, but a mismatch is an `IncorrectPassword` error.
    pub fn unlock(&self, password: &str) -> Result<()> {
        if self.verify_master_password(password)? {
            Ok(())
        } else {
            Err(VaultError::IncorrectPassword)
        }
    }
}

/// Compare two byte strings without an early exit on the first mismatch.
///
/// The length check may return early: hash lengths are fixed and public.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::MAX_PASSPHRASE_LEN;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    fn auth() -> VaultAuth<MemoryCredentialStore> {
        VaultAuth::new(MemoryCredentialStore::default())
    }

    #[test]
    fn tr0ub4dor_scenario() {
        let auth = auth();
        assert!(!auth.is_setup().unwrap());

        auth.setup_master_password("Tr0ub4dor&3").unwrap();
        assert!(auth.is_setup().unwrap());

        assert!(auth.verify_master_password("Tr0ub4dor&3").unwrap());
        assert!(!auth.verify_master_password("tr0ub4dor&3").unwrap());
    }

    #[test]
    fn verify_before_setup_is_not_setup() {
        assert!(matches!(
            auth().verify_master_password("anything"),
            Err(VaultError::NotSetup)
        ));
    }

    #[test]
    fn second_setup_is_rejected() {
        let auth = auth();
        auth.setup_master_password("first").unwrap();
        assert!(matches!(
            auth.setup_master_password("second"),
            Err(VaultError::AlreadySetup)
        ));
        assert!(auth.verify_master_password("first").unwrap());
    }

    #[test]
    fn stored_credential_has_fixed_sizes() {
        let store = MemoryCredentialStore::default();
        VaultAuth::new(&store).setup_master_password("pw").unwrap();

        let credential = store.load().unwrap().unwrap();
        assert_eq!(credential.salt.len(), 32);
        assert_eq!(credential.hash.len(), 32);
    }

    #[test]
    fn unlock_maps_mismatch_to_incorrect_password() {
        let auth = auth();
        auth.setup_master_password("correct horse").unwrap();
        assert!(auth.unlock("correct horse").is_ok());
        assert!(matches!(
            auth.unlock("correct horsf"),
            Err(VaultError::IncorrectPassword)
        ));
    }

    #[test]
    fn edge_case_passwords_verify_exactly() {
        let longest = "x".repeat(MAX_PASSPHRASE_LEN);
        let longest_variant = format!("{}y", "x".repeat(MAX_PASSPHRASE_LEN - 1));

        let cases = [
            ("", "a"),
            ("pässwörd🔑", "pässwörd🔒"),
            (longest.as_str(), longest_variant.as_str()),
        ];

        for (password, one_off) in cases {
            let auth = auth();
            auth.setup_master_password(password).unwrap();
            assert!(auth.verify_master_password(password).unwrap());
            assert!(!auth.verify_master_password(one_off).unwrap());
        }
    }

    #[test]
    fn over_long_password_is_an_error_not_a_match() {
        let auth = auth();
        auth.setup_master_password(&"x".repeat(MAX_PASSPHRASE_LEN)).unwrap();

        let too_long = "x".repeat(MAX_PASSPHRASE_LEN + 1);
        assert!(matches!(
            auth.verify_master_password(&too_long),
            Err(VaultError::KdfFailure(_))
        ));
        assert!(matches!(
            VaultAuth::new(MemoryCredentialStore::default()).setup_master_password(&too_long),
            Err(VaultError::KdfFailure(_))
        ));
    }

    #[test]
    fn concurrent_setup_has_one_winner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["alpha-pass", "bravo-pass"]
            .into_iter()
            .map(|password| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let auth = VaultAuth::new(FileCredentialStore::new(path));
                    barrier.wait();
                    (password, auth.setup_master_password(password))
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .any(|(_, r)| matches!(r, Err(VaultError::AlreadySetup))));

        let auth = VaultAuth::new(FileCredentialStore::new(&path));
        for (password, result) in &results {
            assert_eq!(auth.verify_master_password(password).unwrap(), result.is_ok());
        }
    }

    #[test]
    fn concurrent_setup_in_memory_has_one_winner() {
        let auth = Arc::new(auth());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["alpha-pass", "bravo-pass"]
            .into_iter()
            .map(|password| {
                let auth = Arc::clone(&auth);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    auth.setup_master_password(password).is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn constant_time_eq_behaviour() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
