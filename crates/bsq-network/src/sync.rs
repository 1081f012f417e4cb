// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - BLOCK SYNC EXCHANGE
//
// Requester: RequestTracker picks a nonce, remembers it, and accepts exactly
//            one response echoing it.
// Responder: serve_request answers from whatever blocks it has, ascending,
//            echoing the request nonce.
//
// Timeouts for unanswered requests belong to the transport session.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use rand::Rng;
use std::collections::HashMap;
use std::fmt;

use bsq_core::wire::WireError;
use bsq_core::BsqBlock;

use crate::messages::{DaoMessage, GetBsqBlocksRequest, GetBsqBlocksResponse, NetworkEnvelope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    Wire(WireError),
    /// Envelope carried the other message kind
    UnexpectedMessage(&'static str),
    /// No outstanding request with this nonce
    UnknownNonce(i32),
    /// Response nonce differs from the request it is matched against
    NonceMismatch { expected: i32, found: i32 },
    /// Blocks not strictly ascending, or below the requested height
    OutOfOrder { height: u64 },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "Sync error: {}", e),
            Self::UnexpectedMessage(kind) => write!(f, "Sync error: expected {}", kind),
            Self::UnknownNonce(n) => write!(f, "Sync error: no outstanding request with nonce {}", n),
            Self::NonceMismatch { expected, found } => write!(
                f,
                "Sync error: response nonce {} does not match request nonce {}",
                found, expected
            ),
            Self::OutOfOrder { height } => {
                write!(f, "Sync error: block {} out of order in response", height)
            }
        }
    }
}

impl std::error::Error for SyncError {}

impl From<WireError> for SyncError {
    fn from(e: WireError) -> Self {
        SyncError::Wire(e)
    }
}

/// Outstanding block requests keyed by nonce.
#[derive(Debug, Default)]
pub struct RequestTracker {
    outstanding: HashMap<i32, u64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// New request with a random nonce not already outstanding.
    pub fn create_request(&mut self, from_block_height: u64) -> GetBsqBlocksRequest {
        let mut rng = rand::thread_rng();
        let mut nonce: i32 = rng.gen();
        while self.outstanding.contains_key(&nonce) {
            nonce = rng.gen();
        }
        let request = GetBsqBlocksRequest {
            from_block_height,
            nonce,
        };
        self.track(&request);
        request
    }

    /// Track a request whose nonce the caller chose.
    pub fn track(&mut self, request: &GetBsqBlocksRequest) {
        if self
            .outstanding
            .insert(request.nonce, request.from_block_height)
            .is_some()
        {
            log::warn!("Nonce {} was already outstanding, replaced", request.nonce);
        }
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    pub fn cancel(&mut self, nonce: i32) -> bool {
        self.outstanding.remove(&nonce).is_some()
    }

    /// Match a response to its request. One-shot: the nonce is consumed,
    /// so a replayed response is rejected as unknown.
    pub fn accept_response(
        &mut self,
        response: GetBsqBlocksResponse,
    ) -> Result<GetBsqBlocksResponse, SyncError> {
        let from_height = self
            .outstanding
            .remove(&response.request_nonce)
            .ok_or(SyncError::UnknownNonce(response.request_nonce))?;
        check_ascending(&response.bsq_blocks, from_height)?;
        Ok(response)
    }
}

fn check_ascending(blocks: &[BsqBlock], from_height: u64) -> Result<(), SyncError> {
    let mut floor = from_height;
    for (i, block) in blocks.iter().enumerate() {
        let too_low = if i == 0 {
            block.height < floor
        } else {
            block.height <= floor
        };
        if too_low {
            return Err(SyncError::OutOfOrder {
                height: block.height,
            });
        }
        floor = block.height;
    }
    Ok(())
}

/// Check a response against a specific request.
pub fn match_response(
    request: &GetBsqBlocksRequest,
    response: &GetBsqBlocksResponse,
) -> Result<(), SyncError> {
    if request.nonce != response.request_nonce {
        return Err(SyncError::NonceMismatch {
            expected: request.nonce,
            found: response.request_nonce,
        });
    }
    check_ascending(&response.bsq_blocks, request.from_block_height)
}

/// Answer a request with every known block at or above the requested
/// height, ascending.
pub fn serve_request(request: &GetBsqBlocksRequest, blocks: &[BsqBlock]) -> GetBsqBlocksResponse {
    let mut bsq_blocks: Vec<BsqBlock> = blocks
        .iter()
        .filter(|b| b.height >= request.from_block_height)
        .cloned()
        .collect();
    bsq_blocks.sort_by_key(|b| b.height);
    log::debug!(
        "Serving {} blocks from {} (nonce {})",
        bsq_blocks.len(),
        request.from_block_height,
        request.nonce
    );
    GetBsqBlocksResponse {
        bsq_blocks,
        request_nonce: request.nonce,
    }
}

pub fn decode_request(bytes: &[u8]) -> Result<GetBsqBlocksRequest, SyncError> {
    match NetworkEnvelope::from_bytes(bytes)?.message {
        DaoMessage::GetBsqBlocksRequest(m) => Ok(m),
        DaoMessage::GetBsqBlocksResponse(_) => Err(SyncError::UnexpectedMessage("GetBsqBlocksRequest")),
    }
}

pub fn decode_response(bytes: &[u8]) -> Result<GetBsqBlocksResponse, SyncError> {
    match NetworkEnvelope::from_bytes(bytes)?.message {
        DaoMessage::GetBsqBlocksResponse(m) => Ok(m),
        DaoMessage::GetBsqBlocksRequest(_) => Err(SyncError::UnexpectedMessage("GetBsqBlocksResponse")),
    }
}
