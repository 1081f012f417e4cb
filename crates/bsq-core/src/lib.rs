// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - CORE MODULE
//
// Derived-ledger primitives: token transaction records, BSQ blocks,
// output references, the OP_RETURN codec and the ledger-state store.
// All token arithmetic is integer BSQ satoshis (u64); no floating point.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod dao_config;
pub mod op_return;
pub mod output_ref;
pub mod raw;
pub mod state;
pub mod wire;

pub use output_ref::{validate_tx_id, OutputRef, OutputRefError};
pub use raw::{RawBlock, RawTx, RawTxOutput};
pub use state::{BsqStateStore, BsqUtxo, StoreError, UtxoSet};
pub use wire::WireError;

/// 1 BSQ = 100 BSQ satoshis (two decimal places)
pub const SATOSHIS_PER_BSQ: u64 = 100;

/// Human-readable amount, e.g. `12.50 BSQ`.
pub fn format_bsq(value: u64) -> String {
    format!(
        "{}.{:02} BSQ",
        value / SATOSHIS_PER_BSQ,
        value % SATOSHIS_PER_BSQ
    )
}

/// Category of a token transaction.
///
/// Closed set. A record starts as `Unverified`; the classifier moves it along
/// the transitions below and nothing else ever writes it:
///   Unverified → TransferBsq            (token inputs recognized)
///   TransferBsq → CompensationRequest   (governance OP_RETURN, last output)
///   TransferBsq → Vote                  (governance OP_RETURN, last output)
///   TransferBsq → Invalid               (governance OP_RETURN not last)
///   TransferBsq → PayTradeFee           (leftover burnt, no other reclassification)
///   Unverified → Genesis                (block driver only)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TxType {
    #[default]
    Unverified,
    Invalid,
    Genesis,
    TransferBsq,
    PayTradeFee,
    CompensationRequest,
    Vote,
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxType::Unverified => "UNVERIFIED",
            TxType::Invalid => "INVALID",
            TxType::Genesis => "GENESIS",
            TxType::TransferBsq => "TRANSFER_BSQ",
            TxType::PayTradeFee => "PAY_TRADE_FEE",
            TxType::CompensationRequest => "COMPENSATION_REQUEST",
            TxType::Vote => "VOTE",
        };
        f.write_str(name)
    }
}

/// Role of a single output after classification (audit/display).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TxOutputType {
    #[default]
    Undefined,
    BsqOutput,
    BtcOutput,
    OpReturnOutput,
    CompensationRequestOpReturnOutput,
    IssuanceCandidateOutput,
    VoteOpReturnOutput,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// The output this input spends
    pub output_ref: OutputRef,
    /// Token value recognized for this input (None = not token-bearing)
    #[serde(default)]
    pub bsq_value: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub index: u32,
    /// Native-currency amount (satoshis)
    pub value: u64,
    #[serde(default)]
    pub op_return_data: Option<Vec<u8>>,
    /// Token value assigned to this output (0 until assigned)
    #[serde(default)]
    pub bsq_value: u64,
    #[serde(default)]
    pub output_type: TxOutputType,
}

impl TxOutput {
    pub fn is_op_return(&self) -> bool {
        self.op_return_data.is_some()
    }
}

/// Token transaction record wrapping one chain transaction.
///
/// `tx_type` and `burnt_fee` are the only consensus-relevant mutable fields.
/// They are written once per validation pass and end in a fully determined
/// value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub id: String,
    pub block_height: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    #[serde(default)]
    pub tx_type: TxType,
    /// Token value consumed as an implicit fee
    #[serde(default)]
    pub burnt_fee: u64,
}

impl Tx {
    /// Fresh, unverified record for a chain transaction at `block_height`.
    pub fn from_raw(raw: &RawTx, block_height: u64) -> Self {
        Self {
            id: raw.id.clone(),
            block_height,
            inputs: raw
                .inputs
                .iter()
                .map(|output_ref| TxInput {
                    output_ref: output_ref.clone(),
                    bsq_value: None,
                })
                .collect(),
            outputs: raw
                .outputs
                .iter()
                .enumerate()
                .map(|(index, out)| TxOutput {
                    index: index as u32,
                    value: out.value,
                    op_return_data: out.op_return_data.clone(),
                    bsq_value: 0,
                    output_type: TxOutputType::Undefined,
                })
                .collect(),
            tx_type: TxType::Unverified,
            burnt_fee: 0,
        }
    }

    /// Strip derived state back to the chain data it was built from.
    /// Used to recompute a record received from a peer.
    pub fn to_raw(&self) -> RawTx {
        RawTx {
            id: self.id.clone(),
            inputs: self.inputs.iter().map(|i| i.output_ref.clone()).collect(),
            outputs: self
                .outputs
                .iter()
                .map(|o| RawTxOutput {
                    value: o.value,
                    op_return_data: o.op_return_data.clone(),
                })
                .collect(),
        }
    }

    pub fn output_ref(&self, index: u32) -> OutputRef {
        OutputRef::new(self.id.clone(), index)
    }

    /// Sum of token value assigned to outputs.
    pub fn total_bsq_output(&self) -> u64 {
        self.outputs.iter().map(|o| o.bsq_value).sum()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        wire::encode_versioned(wire::RECORD_VERSION, self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        wire::decode_versioned(wire::RECORD_VERSION, bytes)
    }
}

/// A derived-ledger block: chain block header fields plus the token
/// transactions found in it (genesis and token-bearing only), in block order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BsqBlock {
    pub height: u64,
    pub hash: String,
    pub previous_block_hash: String,
    pub txs: Vec<Tx>,
}

impl BsqBlock {
    /// Raw form of this block, restricted to its token transactions.
    /// Non-token transactions never touch the ledger, so re-deriving from
    /// this subset reproduces the same state.
    pub fn to_raw(&self) -> RawBlock {
        RawBlock {
            height: self.height,
            hash: self.hash.clone(),
            previous_block_hash: self.previous_block_hash.clone(),
            txs: self.txs.iter().map(Tx::to_raw).collect(),
        }
    }

    pub fn total_burnt_fee(&self) -> u64 {
        self.txs.iter().map(|tx| tx.burnt_fee).sum()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        wire::encode_versioned(wire::RECORD_VERSION, self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        wire::decode_versioned(wire::RECORD_VERSION, bytes)
    }
}
