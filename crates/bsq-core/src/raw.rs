//! Raw chain data as supplied by the underlying-chain collaborator.
//!
//! The node never validates these against chain consensus; block headers,
//! scripts and signatures are assumed correct. Only the fields the token
//! ledger reads are carried.

use serde::{Deserialize, Serialize};

use crate::output_ref::{validate_tx_id, OutputRef};

/// Serde adapter: `Option<Vec<u8>>` ↔ optional hex string.
/// Keeps OP_RETURN data readable in JSON block files.
mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(val: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match val {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let text: Option<String> = Option::deserialize(d)?;
        text.map(|t| hex::decode(t).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxOutput {
    /// Native-currency amount (satoshis)
    pub value: u64,
    /// Present iff this is an OP_RETURN (unspendable, data-carrying) output
    #[serde(default, with = "opt_hex")]
    pub op_return_data: Option<Vec<u8>>,
}

impl RawTxOutput {
    pub fn spendable(value: u64) -> Self {
        Self {
            value,
            op_return_data: None,
        }
    }

    pub fn op_return(data: Vec<u8>) -> Self {
        Self {
            value: 0,
            op_return_data: Some(data),
        }
    }
}

/// Chain ids become ledger keys, so one containing ':' is refused on load.
fn deserialize_tx_id<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let id = String::deserialize(d)?;
    validate_tx_id(&id).map_err(serde::de::Error::custom)?;
    Ok(id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTx {
    #[serde(deserialize_with = "deserialize_tx_id")]
    pub id: String,
    /// Spent outputs, in input order
    pub inputs: Vec<OutputRef>,
    pub outputs: Vec<RawTxOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    pub height: u64,
    pub hash: String,
    pub previous_block_hash: String,
    /// Transactions in block order
    pub txs: Vec<RawTx>,
}

impl RawBlock {
    /// Load a JSON array of raw blocks (as exported by the chain collaborator).
    pub fn load_json_list(json: &str) -> Result<Vec<RawBlock>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let json = r#"[{
            "height": 101,
            "hash": "bb",
            "previous_block_hash": "aa",
            "txs": [{
                "id": "t1",
                "inputs": ["t0:0"],
                "outputs": [{"value": 500}, {"value": 0, "op_return_data": "0101ff"}]
            }]
        }]"#;
        let blocks = RawBlock::load_json_list(json).unwrap();
        assert_eq!(blocks.len(), 1);
        let tx = &blocks[0].txs[0];
        assert_eq!(tx.inputs[0], OutputRef::new("t0", 0));
        assert_eq!(tx.outputs[0], RawTxOutput::spendable(500));
        assert_eq!(tx.outputs[1], RawTxOutput::op_return(vec![0x01, 0x01, 0xff]));
    }

    #[test]
    fn test_tx_id_with_separator_rejected_on_load() {
        let json = r#"{"id": "x:y", "inputs": [], "outputs": [{"value": 5}]}"#;
        let err = serde_json::from_str::<RawTx>(json).unwrap_err();
        assert!(err.to_string().contains("contains ':'"));

        let json = r#"{"id": "", "inputs": [], "outputs": []}"#;
        assert!(serde_json::from_str::<RawTx>(json).is_err());
    }

    #[test]
    fn test_bad_hex_rejected() {
        let json = r#"{"value": 0, "op_return_data": "zz"}"#;
        assert!(serde_json::from_str::<RawTxOutput>(json).is_err());
    }
}
