//! Fuzz target: versioned record and envelope decoding
//!
//! Feeds arbitrary bytes to every versioned decoder a peer can reach.
//! Decoding must return Ok/Err, never panic.
//!
//! Run: cargo +nightly fuzz run fuzz_wire_decode

#![no_main]
use bsq_core::{op_return, BsqBlock, OutputRef, Tx};
use bsq_network::NetworkEnvelope;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = NetworkEnvelope::from_bytes(data);
    let _ = BsqBlock::from_bytes(data);
    let _ = Tx::from_bytes(data);
    let _ = OutputRef::from_bytes(data);

    if let Some(payload) = op_return::decode(data) {
        assert_eq!(data.len(), op_return::OP_RETURN_DATA_LEN);
        let _ = payload.kind();
    }
});
