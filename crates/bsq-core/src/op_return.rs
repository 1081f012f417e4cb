// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - OP_RETURN CODEC
//
// Fixed-layout governance metadata carried in a transaction's unspendable
// output:
//
//   [ type_tag: 1 byte | version: 1 byte | content_hash: 20 bytes ]
//
// content_hash = RIPEMD-160(SHA-256(input)).
//
// Encoding NEVER fails at the boundary: an internal write fault degrades to
// the empty-payload sentinel (zero bytes). Deployed nodes read an empty
// payload as "no governance data"; keep it a sentinel, not an error.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt;
use std::io::{self, Write};

use bsq_crypto::{sha256_ripemd160, RIPEMD160_LEN};

/// Total payload length: tag + version + hash
pub const OP_RETURN_DATA_LEN: usize = 2 + RIPEMD160_LEN;

/// OP_RETURN type tags
pub mod op_return_types {
    pub const COMPENSATION_REQUEST: u8 = 0x01;
    pub const VOTE: u8 = 0x02;
}

/// Current payload version per type
pub const COMPENSATION_REQUEST_VERSION: u8 = 0x01;
pub const VOTE_VERSION: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpReturnError {
    /// Payload does not have the fixed length
    MalformedPayload { expected: usize, actual: usize },
    /// Writer refused bytes
    Io(String),
}

impl fmt::Display for OpReturnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload { expected, actual } => write!(
                f,
                "Malformed OP_RETURN payload: expected {} bytes, got {}",
                expected, actual
            ),
            Self::Io(e) => write!(f, "OP_RETURN write failed: {}", e),
        }
    }
}

impl std::error::Error for OpReturnError {}

impl From<io::Error> for OpReturnError {
    fn from(e: io::Error) -> Self {
        OpReturnError::Io(e.to_string())
    }
}

/// Governance data kinds the ledger recognizes in an OP_RETURN output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernanceKind {
    CompensationRequest,
    Vote,
}

/// A decoded 22-byte payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpReturnPayload {
    pub type_tag: u8,
    pub version: u8,
    pub hash: [u8; RIPEMD160_LEN],
}

impl OpReturnPayload {
    /// Which governance kind this payload encodes, if its (tag, version)
    /// pair is one this node understands.
    pub fn kind(&self) -> Option<GovernanceKind> {
        match (self.type_tag, self.version) {
            (op_return_types::COMPENSATION_REQUEST, COMPENSATION_REQUEST_VERSION) => {
                Some(GovernanceKind::CompensationRequest)
            }
            (op_return_types::VOTE, VOTE_VERSION) => Some(GovernanceKind::Vote),
            _ => None,
        }
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

fn write_payload<W: Write>(out: &mut W, type_tag: u8, version: u8, input: &[u8]) -> io::Result<()> {
    out.write_all(&[type_tag, version])?;
    out.write_all(&sha256_ripemd160(input))?;
    out.flush()
}

/// Fallible encoder behind `encode_payload`. Consensus code must not call this
/// directly; it exists for tooling that wants to see the fault.
pub fn try_encode_payload(type_tag: u8, version: u8, input: &[u8]) -> Result<Vec<u8>, OpReturnError> {
    let mut out = Vec::with_capacity(OP_RETURN_DATA_LEN);
    write_payload(&mut out, type_tag, version, input)?;
    if out.len() != OP_RETURN_DATA_LEN {
        return Err(OpReturnError::MalformedPayload {
            expected: OP_RETURN_DATA_LEN,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn or_empty(result: Result<Vec<u8>, OpReturnError>) -> Vec<u8> {
    match result {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("OP_RETURN encoding failed, using empty payload: {}", e);
            Vec::new()
        }
    }
}

/// Encode with an explicit tag and version. Never fails: degrades to `[]`.
pub fn encode_payload(type_tag: u8, version: u8, input: &[u8]) -> Vec<u8> {
    or_empty(try_encode_payload(type_tag, version, input))
}

/// Encode a compensation request payload for `input`.
///
/// Returns either the 22-byte payload or the empty sentinel.
pub fn encode(input: &[u8]) -> Vec<u8> {
    encode_payload(
        op_return_types::COMPENSATION_REQUEST,
        COMPENSATION_REQUEST_VERSION,
        input,
    )
}

/// Decode a payload. Any length other than `OP_RETURN_DATA_LEN` is
/// "not a recognized payload" and yields `None`, the same way an unknown
/// input contributes nothing to the token balance.
pub fn decode(payload: &[u8]) -> Option<OpReturnPayload> {
    if payload.len() != OP_RETURN_DATA_LEN {
        return None;
    }
    let mut hash = [0u8; RIPEMD160_LEN];
    hash.copy_from_slice(&payload[2..]);
    Some(OpReturnPayload {
        type_tag: payload[0],
        version: payload[1],
        hash,
    })
}
