// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - NETWORK MODULE
//
// - Block sync messages and their versioned envelope
// - Request tracking (nonce correlation) and request serving
// - Fee lookup client with bounded retry over pluggable providers
//
// Moving bytes between peers is the transport's job; this crate only
// produces and consumes envelopes.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod fee_lookup;
pub mod fee_providers;
pub mod messages;
pub mod sync;

pub use fee_lookup::{FeeLookup, FeeLookupClient, FeeLookupError, Scheduler, TokioScheduler};
pub use fee_providers::{FeeProvider, FeeProviderError, HttpFeeProvider};
pub use messages::{
    DaoMessage, ExtendedDataSize, GetBsqBlocksRequest, GetBsqBlocksResponse, NetworkEnvelope,
    P2P_MESSAGE_VERSION,
};
pub use sync::{serve_request, RequestTracker, SyncError};
