// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - VERSIONED WIRE CODEC
//
// Layout: [version: u32 LE][bincode body]
//
// The version header is checked BEFORE the body is touched, so a record or
// message written by a newer format is rejected explicitly instead of being
// misparsed by an older node.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Version of persisted records (OutputRef, Tx, BsqBlock, BsqUtxo).
pub const RECORD_VERSION: u32 = 1;

/// Size of the version header
pub const VERSION_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Fewer bytes than the version header
    Truncated(usize),
    /// Header carries a version this node does not understand
    UnsupportedVersion { found: u32, supported: u32 },
    /// Body failed to (de)serialize
    Codec(String),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated(len) => write!(f, "Wire error: {} bytes is shorter than header", len),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "Unsupported version: found {}, this node supports {}",
                found, supported
            ),
            Self::Codec(e) => write!(f, "Wire codec error: {}", e),
        }
    }
}

impl std::error::Error for WireError {}

/// Serialize `value` behind a `version` header.
pub fn encode_versioned<T: Serialize>(version: u32, value: &T) -> Result<Vec<u8>, WireError> {
    let body = bincode::serialize(value).map_err(|e| WireError::Codec(e.to_string()))?;
    let mut out = Vec::with_capacity(VERSION_HEADER_LEN + body.len());
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Read the version header without decoding the body.
pub fn peek_version(bytes: &[u8]) -> Result<u32, WireError> {
    let header: [u8; VERSION_HEADER_LEN] = bytes
        .get(..VERSION_HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or(WireError::Truncated(bytes.len()))?;
    Ok(u32::from_le_bytes(header))
}

/// Decode a value written by `encode_versioned`, accepting only `supported`.
pub fn decode_versioned<T: DeserializeOwned>(supported: u32, bytes: &[u8]) -> Result<T, WireError> {
    let found = peek_version(bytes)?;
    if found != supported {
        return Err(WireError::UnsupportedVersion { found, supported });
    }
    bincode::deserialize(&bytes[VERSION_HEADER_LEN..]).map_err(|e| WireError::Codec(e.to_string()))
}
