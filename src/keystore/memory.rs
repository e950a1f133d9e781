//! Process-memory key custody.
//!
//! The key lives only behind this store and is zeroized when the store is
//! dropped. Nothing survives a restart, which makes it the store of choice
//! for tests and throwaway sessions.

use std::sync::Mutex;

use super::KeyStore;
use crate::crypto::DeviceKey;
use crate::errors::{Result, VaultError};

#[derive(Default)]
pub struct MemoryKeyStore {
    slot: Mutex<Option<DeviceKey>>,
}

impl KeyStore for MemoryKeyStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn load(&self) -> Result<Option<DeviceKey>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| VaultError::KeyUnavailable("memory key store lock poisoned".into()))?;
        Ok(slot.clone())
    }

    fn create_if_absent(&self, candidate: DeviceKey) -> Result<DeviceKey> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| VaultError::KeyUnavailable("memory key store lock poisoned".into()))?;
        Ok(slot.get_or_insert(candidate).clone())
    }
}
