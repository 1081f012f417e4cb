// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - BLOCK SYNC MESSAGES
//
// Wire: [message_version: u32 LE][bincode(DaoMessage)]
//
// A response is never chunked: the whole requested range travels as one
// message and is flagged as extended-size so the transport can admit it.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};

use bsq_core::wire::{self, WireError};
use bsq_core::BsqBlock;

/// Current P2P message format version
pub const P2P_MESSAGE_VERSION: u32 = 1;

/// Messages that may exceed the transport's normal size budget.
pub trait ExtendedDataSize {
    fn is_extended_data_size(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBsqBlocksRequest {
    pub from_block_height: u64,
    pub nonce: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBsqBlocksResponse {
    /// Ascending height; order is significant
    pub bsq_blocks: Vec<BsqBlock>,
    pub request_nonce: i32,
}

impl ExtendedDataSize for GetBsqBlocksRequest {
    fn is_extended_data_size(&self) -> bool {
        false
    }
}

impl ExtendedDataSize for GetBsqBlocksResponse {
    fn is_extended_data_size(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaoMessage {
    GetBsqBlocksRequest(GetBsqBlocksRequest),
    GetBsqBlocksResponse(GetBsqBlocksResponse),
}

impl ExtendedDataSize for DaoMessage {
    fn is_extended_data_size(&self) -> bool {
        match self {
            DaoMessage::GetBsqBlocksRequest(m) => m.is_extended_data_size(),
            DaoMessage::GetBsqBlocksResponse(m) => m.is_extended_data_size(),
        }
    }
}

impl From<GetBsqBlocksRequest> for DaoMessage {
    fn from(m: GetBsqBlocksRequest) -> Self {
        DaoMessage::GetBsqBlocksRequest(m)
    }
}

impl From<GetBsqBlocksResponse> for DaoMessage {
    fn from(m: GetBsqBlocksResponse) -> Self {
        DaoMessage::GetBsqBlocksResponse(m)
    }
}

/// Versioned envelope handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEnvelope {
    pub message_version: u32,
    pub message: DaoMessage,
}

impl NetworkEnvelope {
    pub fn new(message: impl Into<DaoMessage>) -> Self {
        Self {
            message_version: P2P_MESSAGE_VERSION,
            message: message.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        wire::encode_versioned(self.message_version, &self.message)
    }

    /// Decode, rejecting any version other than `P2P_MESSAGE_VERSION`
    /// before the body is parsed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let message = wire::decode_versioned(P2P_MESSAGE_VERSION, bytes)?;
        Ok(Self {
            message_version: P2P_MESSAGE_VERSION,
            message,
        })
    }
}
