// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - CRYPTOGRAPHY MODULE
//
// Hash primitives shared by the derived-ledger node.
// - SHA-256 and double SHA-256 (chain tx/block identifiers)
// - RIPEMD-160
// - SHA-256 → RIPEMD-160 ("hash160"), used for OP_RETURN content hashes
//
// Every function here is part of consensus: all nodes MUST produce the
// same digest for the same bytes. No randomness, no platform-dependent state.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use digest::Digest;
use ripemd::Ripemd160;
use sha2::Sha256;

/// Length of a SHA-256 digest in bytes
pub const SHA256_LEN: usize = 32;

/// Length of a RIPEMD-160 digest in bytes
pub const RIPEMD160_LEN: usize = 20;

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    Sha256::digest(data).into()
}

/// SHA-256(SHA-256(data)), the chain's transaction and block id hash.
pub fn double_sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// RIPEMD-160 of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; RIPEMD160_LEN] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash-then-shrink: RIPEMD-160(SHA-256(data)).
///
/// Produces the 20-byte content hash embedded in OP_RETURN payloads.
/// The SHA-256 round runs first so the short digest never sees raw input.
pub fn sha256_ripemd160(data: &[u8]) -> [u8; RIPEMD160_LEN] {
    ripemd160(&sha256(data))
}

/// Transaction id as displayed by the chain: double SHA-256 of the serialized
/// transaction, byte-reversed, hex-encoded.
pub fn txid_hex(serialized_tx: &[u8]) -> String {
    let mut hash = double_sha256(serialized_tx);
    hash.reverse();
    hex::encode(hash)
}
