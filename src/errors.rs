use thiserror::Error;

use crate::vault::RecordKind;

/// All errors that can occur in SecureVault.
///
/// Messages never include key material, salts, hashes or plaintext.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Key custody ---
    #[error("Vault unavailable — cannot unlock the device key: {0}")]
    KeyUnavailable(String),

    // --- Crypto errors ---
    #[error("Authentication failed — encrypted field was tampered with or does not match the device key")]
    AuthenticationFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KdfFailure(String),

    // --- Master passphrase ---
    #[error("Master password has not been set up yet")]
    NotSetup,

    #[error("Master password is already set up")]
    AlreadySetup,

    #[error("Incorrect password")]
    IncorrectPassword,

    // --- Export / import ---
    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Import failed: invalid password or corrupted file")]
    ImportFailed,

    // --- Records ---
    #[error("{kind} #{id} not found")]
    RecordNotFound { kind: RecordKind, id: i64 },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Record store error: {0}")]
    Storage(String),

    // --- Keyfile errors ---
    #[error("Keyfile error: {0}")]
    Keyfile(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for SecureVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
