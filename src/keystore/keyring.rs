//! OS keyring custody of the device key.
//!
//! The key is stored base64-encoded in the platform credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! The keyring API has no create-if-absent primitive, so creation re-reads
//! the entry after writing and returns whatever is stored at that point.
//! Two processes creating the key at the same moment can each read back
//! their own key before the other's write lands; `creates_atomically`
//! reports this and `open_store` warns about it.

use base64::Engine;
use zeroize::Zeroizing;

use super::KeyStore;
use crate::crypto::DeviceKey;
use crate::encoding::BASE64;
use crate::errors::{Result, VaultError};

/// Account name of the device key entry.
const ACCOUNT: &str = "device-key";

pub struct KeyringKeyStore {
    service: String,
}

impl KeyringKeyStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, ACCOUNT).map_err(|e| {
            VaultError::KeyUnavailable(format!("failed to create keyring entry: {e}"))
        })
    }
}

impl KeyStore for KeyringKeyStore {
    fn backend(&self) -> &'static str {
        "keyring"
    }

    fn load(&self) -> Result<Option<DeviceKey>> {
        let encoded = match self.entry()?.get_password() {
            Ok(encoded) => Zeroizing::new(encoded),
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => {
                return Err(VaultError::KeyUnavailable(format!(
                    "failed to read from keyring: {e}"
                )))
            }
        };

        let raw = BASE64
            .decode(encoded.as_bytes())
            .map(Zeroizing::new)
            .map_err(|_| VaultError::KeyUnavailable("keyring entry is corrupted".into()))?;

        DeviceKey::from_slice(&raw).map(Some)
    }

    fn create_if_absent(&self, candidate: DeviceKey) -> Result<DeviceKey> {
        if let Some(existing) = self.load()? {
            return Ok(existing);
        }

        let encoded = Zeroizing::new(BASE64.encode(candidate.as_bytes()));
        self.entry()?.set_password(&encoded).map_err(|e| {
            VaultError::KeyUnavailable(format!("failed to store key in keyring: {e}"))
        })?;

        self.load()?.ok_or_else(|| {
            VaultError::KeyUnavailable("keyring entry vanished after write".into())
        })
    }

    fn creates_atomically(&self) -> bool {
        false
    }
}
