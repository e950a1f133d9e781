//! Device key custody.
//!
//! A `KeyStore` persists the single device key of an installation; a
//! `KeyProvider` hands it to `FieldCipher`. `KeyGuard` joins the two: it
//! creates the key lazily on first use, caches it for the life of the
//! process and makes sure concurrent first calls agree on one key.
//!
//! Backends:
//! - `MemoryKeyStore`: process memory only
//! - `FileKeyStore`: key file wrapped under a keyfile-derived key
//! - `KeyringKeyStore`: OS credential store (feature `keyring-store`)

pub mod file;
#[cfg(feature = "keyring-store")]
pub mod keyring;
pub mod memory;

pub use file::FileKeyStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringKeyStore;
pub use memory::MemoryKeyStore;

use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use crate::config::{KeyBackend, Settings};
use crate::crypto::keyfile;
use crate::crypto::DeviceKey;
use crate::errors::{Result, VaultError};

/// Persistent custody of the device key.
pub trait KeyStore: Send + Sync {
    /// Short backend name for logs ("file", "keyring", ...).
    fn backend(&self) -> &'static str;

    /// Read the stored key, or `None` if none has been created yet.
    fn load(&self) -> Result<Option<DeviceKey>>;

    /// Persist `candidate` unless a key already exists.
    ///
    /// Returns the key that ended up stored, which is an earlier writer's
    /// key rather than `candidate` if one got there first. Atomic across
    /// processes only where `creates_atomically` says so; `KeyGuard`
    /// serializes callers within one process either way.
    fn create_if_absent(&self, candidate: DeviceKey) -> Result<DeviceKey>;

    /// Whether `create_if_absent` is atomic across processes.
    fn creates_atomically(&self) -> bool {
        true
    }
}

impl KeyStore for Box<dyn KeyStore> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    fn load(&self) -> Result<Option<DeviceKey>> {
        (**self).load()
    }

    fn create_if_absent(&self, candidate: DeviceKey) -> Result<DeviceKey> {
        (**self).create_if_absent(candidate)
    }

    fn creates_atomically(&self) -> bool {
        (**self).creates_atomically()
    }
}

/// Something that can produce the device key on demand.
pub trait KeyProvider: Send + Sync {
    /// Return the device key, creating it on first use.
    ///
    /// Repeated and concurrent calls observe the same key.
    fn get_or_create_key(&self) -> Result<Arc<DeviceKey>>;
}

/// Lazily initialised, process-wide view of a `KeyStore`'s device key.
pub struct KeyGuard<S> {
    store: S,
    key: OnceLock<Arc<DeviceKey>>,
    init: Mutex<()>,
}

impl<S: KeyStore> KeyGuard<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyStore> KeyProvider for KeyGuard<S> {
    fn get_or_create_key(&self) -> Result<Arc<DeviceKey>> {
        if let Some(key) = self.key.get() {
            return Ok(Arc::clone(key));
        }

        // Only one thread runs the load/create path; the rest wait here and
        // then find the cached key.
        let _init = self
            .init
            .lock()
            .map_err(|_| VaultError::KeyUnavailable("key initialisation lock poisoned".into()))?;

        if let Some(key) = self.key.get() {
            return Ok(Arc::clone(key));
        }

        let backend = self.store.backend();
        let key = match self.store.load().map_err(unavailable)? {
            Some(key) => {
                tracing::debug!(backend, "loaded device key");
                key
            }
            None => {
                let candidate = DeviceKey::generate()?;
                let key = self.store.create_if_absent(candidate).map_err(unavailable)?;
                tracing::info!(backend, "created device key");
                key
            }
        };

        let key = Arc::new(key);
        // Cannot already be set: we hold `init` and checked above.
        let _ = self.key.set(Arc::clone(&key));
        Ok(key)
    }
}

/// Fold any store failure into `KeyUnavailable`.
fn unavailable(err: VaultError) -> VaultError {
    match err {
        VaultError::KeyUnavailable(_) => err,
        other => VaultError::KeyUnavailable(other.to_string()),
    }
}

/// Build the key store selected in `settings`.
pub fn open_store(settings: &Settings, project_dir: &Path) -> Result<Box<dyn KeyStore>> {
    match settings.key_backend {
        KeyBackend::File => {
            let secret = keyfile::load_or_generate(&settings.keyfile_path(project_dir))
                .map_err(unavailable)?;
            let store = FileKeyStore::new(settings.device_key_path(project_dir), &secret)?;
            Ok(Box::new(store))
        }
        #[cfg(feature = "keyring-store")]
        KeyBackend::Keyring => {
            let store = KeyringKeyStore::new(&settings.keyring_service);
            if !store.creates_atomically() {
                tracing::warn!(
                    backend = store.backend(),
                    "first-run key creation is not atomic across processes; avoid running two instances until the device key exists"
                );
            }
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "keyring-store"))]
        KeyBackend::Keyring => Err(VaultError::Config(
            "keyring backend not compiled — rebuild with `cargo build --features keyring-store`"
                .into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// A store whose backing facility is broken.
    struct BrokenStore;

    impl KeyStore for BrokenStore {
        fn backend(&self) -> &'static str {
            "broken"
        }

        fn load(&self) -> Result<Option<DeviceKey>> {
            Err(VaultError::Storage("keystore is corrupted".into()))
        }

        fn create_if_absent(&self, _candidate: DeviceKey) -> Result<DeviceKey> {
            Err(VaultError::Storage("keystore is corrupted".into()))
        }
    }

    /// Counts how often the guard reaches the store.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryKeyStore,
        loads: AtomicUsize,
        creates: AtomicUsize,
    }

    impl KeyStore for CountingStore {
        fn backend(&self) -> &'static str {
            "counting"
        }

        fn load(&self) -> Result<Option<DeviceKey>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load()
        }

        fn create_if_absent(&self, candidate: DeviceKey) -> Result<DeviceKey> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create_if_absent(candidate)
        }
    }

    #[test]
    fn repeated_calls_return_the_same_key() {
        let guard = KeyGuard::new(CountingStore::default());

        let a = guard.get_or_create_key().unwrap();
        let b = guard.get_or_create_key().unwrap();
        assert_eq!(*a, *b);

        assert_eq!(guard.store().loads.load(Ordering::SeqCst), 1);
        assert_eq!(guard.store().creates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_use_creates_one_key() {
        let guard = Arc::new(KeyGuard::new(CountingStore::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                thread::spawn(move || guard.get_or_create_key().unwrap())
            })
            .collect();
        let keys: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(keys.iter().all(|k| **k == *keys[0]));
        assert_eq!(guard.store().creates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn existing_key_is_reused() {
        let store = MemoryKeyStore::default();
        let existing = store.create_if_absent(DeviceKey::generate().unwrap()).unwrap();

        let guard = KeyGuard::new(store);
        assert_eq!(*guard.get_or_create_key().unwrap(), existing);
    }

    #[test]
    fn broken_store_surfaces_key_unavailable() {
        let guard = KeyGuard::new(BrokenStore);
        let err = guard.get_or_create_key().unwrap_err();
        assert!(matches!(err, VaultError::KeyUnavailable(_)));
        assert!(err.to_string().contains("cannot unlock"));
    }

    #[test]
    fn boxed_store_delegates() {
        let boxed: Box<dyn KeyStore> = Box::new(MemoryKeyStore::default());
        assert_eq!(boxed.backend(), "memory");

        let guard = KeyGuard::new(boxed);
        let key = guard.get_or_create_key().unwrap();
        assert_eq!(guard.store().load().unwrap().as_ref(), Some(&*key));
    }

    #[test]
    fn memory_and_file_stores_create_atomically() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::default();
        let file_store = open_store(&settings, dir.path()).unwrap();

        assert_eq!(file_store.backend(), "file");
        assert!(file_store.creates_atomically());
        assert!(MemoryKeyStore::default().creates_atomically());
    }

    #[cfg(feature = "keyring-store")]
    #[test]
    fn keyring_store_reports_non_atomic_creation() {
        let store = KeyringKeyStore::new("securevault-test");
        assert_eq!(store.backend(), "keyring");
        assert!(!store.creates_atomically());
    }

    #[cfg(not(feature = "keyring-store"))]
    #[test]
    fn keyring_backend_requires_feature() {
        let settings = Settings {
            key_backend: KeyBackend::Keyring,
            ..Settings::default()
        };
        let result = open_store(&settings, Path::new("."));
        assert!(matches!(result, Err(VaultError::Config(_))));
    }
}
