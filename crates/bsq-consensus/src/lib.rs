// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - CONSENSUS MODULE
//
// Deterministic derivation of the BSQ ledger from raw chain blocks.
// Single-threaded by construction: transactions within a block and blocks
// within a run are applied strictly in order against one state store.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod balance;
pub mod block_store;
pub mod chain;
pub mod error;
pub mod sled_store;
pub mod staged;
pub mod tx_controller;
pub mod tx_inputs;
pub mod tx_outputs;

pub use balance::BsqInputBalance;
pub use block_store::{BlockStore, BlockStoreStats};
pub use chain::{BsqChain, ChainStats};
pub use error::ConsensusError;
pub use sled_store::SledStateStore;
pub use staged::StagedState;
pub use tx_controller::classify;
