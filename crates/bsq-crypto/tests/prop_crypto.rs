// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROPERTY-BASED TESTS — bsq-crypto
//
// Verifies hash invariants the consensus code relies on:
// - Fixed output lengths for any input
// - Determinism (same bytes → same digest)
// - hash160 composition
//
// Run: cargo test --release -p bsq-crypto --test prop_crypto
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use bsq_crypto::{
    double_sha256, ripemd160, sha256, sha256_ripemd160, txid_hex, RIPEMD160_LEN, SHA256_LEN,
};
use proptest::prelude::*;

proptest! {
    /// PROPERTY: hash160 is RIPEMD-160 applied to the SHA-256 digest
    #[test]
    fn prop_hash160_composition(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        prop_assert_eq!(sha256_ripemd160(&data), ripemd160(&sha256(&data)));
    }

    /// PROPERTY: digests are deterministic
    #[test]
    fn prop_deterministic(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        prop_assert_eq!(sha256_ripemd160(&data), sha256_ripemd160(&data.clone()));
        prop_assert_eq!(double_sha256(&data), double_sha256(&data.clone()));
    }

    /// PROPERTY: txid is always 64 lowercase hex chars
    #[test]
    fn prop_txid_shape(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let id = txid_hex(&data);
        prop_assert_eq!(id.len(), SHA256_LEN * 2);
        prop_assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// PROPERTY: different inputs (almost surely) give different hash160
    #[test]
    fn prop_distinct_inputs(a in "[a-z]{1,32}", b in "[A-Z]{1,32}") {
        let ha = sha256_ripemd160(a.as_bytes());
        let hb = sha256_ripemd160(b.as_bytes());
        prop_assert_eq!(ha.len(), RIPEMD160_LEN);
        prop_assert_ne!(ha, hb);
    }
}
