//! Text packing for opaque binary blobs.
//!
//! Every blob that leaves the crate (ciphertext, wrapped keys, backups,
//! sealed keys, public keys) travels as standard padded base64.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::errors::{LegacyVaultError, Result};

/// Encode raw bytes as base64 text.
pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode base64 text back into raw bytes.
///
/// Leading and trailing whitespace is ignored so blobs read from files
/// with a trailing newline still decode.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(text.trim())
        .map_err(|e| LegacyVaultError::MalformedBlob(format!("invalid base64: {e}")))
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&encode(data))
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(s.trim()).map_err(serde::de::Error::custom)
}
