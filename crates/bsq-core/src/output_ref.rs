// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - OUTPUT REFERENCE
//
// (tx_id, output_index) key into the derived-ledger UTXO set.
// Canonical text form is "<tx_id>:<index>" and parses back losslessly.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::wire::{self, WireError, RECORD_VERSION};

/// Malformed textual output reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputRefError {
    /// Not exactly one ':' separator
    MissingSeparator(String),
    /// Empty transaction id part
    EmptyTxId(String),
    /// Index part is not a non-negative 32-bit integer
    InvalidIndex(String),
    /// Tx id contains the ':' separator, so its text form cannot parse back
    SeparatorInTxId(String),
}

impl fmt::Display for OutputRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator(s) => {
                write!(f, "Format error: expected exactly one ':' in '{}'", s)
            }
            Self::EmptyTxId(s) => write!(f, "Format error: empty tx id in '{}'", s),
            Self::InvalidIndex(s) => write!(f, "Format error: invalid output index in '{}'", s),
            Self::SeparatorInTxId(s) => write!(f, "Format error: tx id '{}' contains ':'", s),
        }
    }
}

impl std::error::Error for OutputRefError {}

/// Reference to a specific output of a specific chain transaction.
///
/// Equality, ordering and hashing are structural over `(tx_id, index)`.
/// `Ord` gives the UTXO set a deterministic iteration order on every node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputRef {
    pub tx_id: String,
    pub index: u32,
}

/// Check that `tx_id` can key an output reference: non-empty, no ':'.
///
/// Chain-supplied ids are checked with this before any of their outputs
/// reach the ledger state.
pub fn validate_tx_id(tx_id: &str) -> Result<(), OutputRefError> {
    if tx_id.is_empty() {
        return Err(OutputRefError::EmptyTxId(tx_id.to_string()));
    }
    if tx_id.contains(':') {
        return Err(OutputRefError::SeparatorInTxId(tx_id.to_string()));
    }
    Ok(())
}

impl OutputRef {
    /// Infallible constructor for ids already known to be valid.
    /// Use `try_new` for anything read from outside the node.
    pub fn new(tx_id: impl Into<String>, index: u32) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
        }
    }

    pub fn try_new(tx_id: impl Into<String>, index: u32) -> Result<Self, OutputRefError> {
        let tx_id = tx_id.into();
        validate_tx_id(&tx_id)?;
        Ok(Self { tx_id, index })
    }

    /// Versioned binary form (for persistence and transmission).
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        wire::encode_versioned(RECORD_VERSION, self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        wire::decode_versioned(RECORD_VERSION, bytes)
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

impl FromStr for OutputRef {
    type Err = OutputRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (tx_id, index) = match (parts.next(), parts.next(), parts.next()) {
            (Some(tx_id), Some(index), None) => (tx_id, index),
            _ => return Err(OutputRefError::MissingSeparator(s.to_string())),
        };
        if tx_id.is_empty() {
            return Err(OutputRefError::EmptyTxId(s.to_string()));
        }
        // u32::from_str accepts a leading '+', which would break lossless round-trips
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OutputRefError::InvalidIndex(s.to_string()));
        }
        let index = index
            .parse::<u32>()
            .map_err(|_| OutputRefError::InvalidIndex(s.to_string()))?;
        Ok(Self::new(tx_id, index))
    }
}

// Serialized as the canonical string so JSON block files stay readable
// and the binary form has exactly one representation.
impl Serialize for OutputRef {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OutputRef {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
