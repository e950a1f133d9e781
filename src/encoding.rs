//! Serde helpers for base64-encoded byte fields.
//!
//! Every byte string that leaves the process (field ivs and ciphertexts,
//! master-credential salt/hash, export envelope parts, wrapped device keys)
//! travels as standard, padded base64 text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

pub use base64::engine::general_purpose::STANDARD as BASE64;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = STANDARD.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    STANDARD.decode(&s).map_err(serde::de::Error::custom)
}
