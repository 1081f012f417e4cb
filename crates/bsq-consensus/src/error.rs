use std::fmt;

use bsq_core::StoreError;

/// Fatal condition for a block-processing pass.
///
/// Every variant aborts the whole block: nothing staged for it reaches the
/// ledger state and the chain head does not move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Block does not extend the current head
    HeightMismatch { expected: u64, found: u64 },
    /// Block's parent hash is not the head hash
    PreviousHashMismatch {
        height: u64,
        expected: String,
        found: String,
    },
    /// Same transaction id twice in one block
    DuplicateTx { height: u64, tx_id: String },
    /// Tx id cannot key a ledger output (empty or contains ':')
    MalformedTxId { height: u64, tx_id: String },
    /// Input token sum does not fit the balance tracker
    BalanceOverflow { tx_id: String },
    /// Peer block differs from the locally derived one
    Divergence { height: u64, reason: String },
    /// Ledger state collaborator failed
    Store(StoreError),
}

impl fmt::Display for ConsensusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeightMismatch { expected, found } => write!(
                f,
                "Consensus abort: expected block {}, got {}",
                expected, found
            ),
            Self::PreviousHashMismatch {
                height,
                expected,
                found,
            } => write!(
                f,
                "Consensus abort: block {} previous hash {} does not match head {}",
                height, found, expected
            ),
            Self::DuplicateTx { height, tx_id } => write!(
                f,
                "Consensus abort: tx {} appears twice in block {}",
                tx_id, height
            ),
            Self::MalformedTxId { height, tx_id } => write!(
                f,
                "Consensus abort: block {} has malformed tx id '{}'",
                height, tx_id
            ),
            Self::BalanceOverflow { tx_id } => {
                write!(f, "Consensus abort: input balance overflow in tx {}", tx_id)
            }
            Self::Divergence { height, reason } => write!(
                f,
                "Consensus abort: peer block {} diverges from local derivation ({})",
                height, reason
            ),
            Self::Store(e) => write!(f, "Consensus abort: {}", e),
        }
    }
}

impl std::error::Error for ConsensusError {}

impl From<StoreError> for ConsensusError {
    fn from(e: StoreError) -> Self {
        ConsensusError::Store(e)
    }
}
