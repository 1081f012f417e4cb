// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BSQ - FEE LOOKUP CLIENT
//
// Bounded retry against one provider, as an explicit state machine:
//
//   Pending(1) ──fail──▶ wait 1 unit ──▶ Pending(2) ──fail──▶ wait 2 ──▶ ...
//   Pending(4) ──fail──▶ wait 4 units ──▶ Failed (delivered once)
//   Pending(n) ──ok────▶ Succeeded (delivered once)
//
// Completion is one-shot. Anything arriving after the result is settled,
// or a failure arriving while a retry timer is armed, is ignored.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use bsq_core::dao_config::FeeLookupConfig;

use crate::fee_providers::{FeeProvider, FeeProviderError};

/// Attempts before the lookup fails permanently
pub const MAX_ATTEMPTS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeLookupError {
    /// Every attempt failed
    PermanentLookupFailure {
        tx_id: String,
        provider: String,
        attempts: u32,
        last_error: FeeProviderError,
    },
    /// The lookup task ended without settling (runtime shut down)
    Interrupted,
}

impl fmt::Display for FeeLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermanentLookupFailure {
                tx_id,
                provider,
                attempts,
                last_error,
            } => write!(
                f,
                "Fee lookup for {} via {} failed after {} attempts: {}",
                tx_id, provider, attempts, last_error
            ),
            Self::Interrupted => write!(f, "Fee lookup interrupted before completion"),
        }
    }
}

impl std::error::Error for FeeLookupError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupState {
    Pending { attempt: u32 },
    Succeeded(u64),
    Failed(FeeProviderError),
}

/// What the driver must do after feeding an event to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Result settled; deliver it
    Complete,
    /// Arm a timer for this many units, then call `on_timer`
    RetryAfter(u32),
    /// Issue the next attempt now
    Reissue,
    /// Late or duplicate event; nothing to do
    Ignored,
}

#[derive(Debug, Clone)]
pub struct FeeLookup {
    state: LookupState,
    faults: u32,
    timer_armed: bool,
    last_error: Option<FeeProviderError>,
}

impl Default for FeeLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeLookup {
    pub fn new() -> Self {
        Self {
            state: LookupState::Pending { attempt: 1 },
            faults: 0,
            timer_armed: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn faults(&self) -> u32 {
        self.faults
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.state, LookupState::Pending { .. })
    }

    pub fn on_success(&mut self, fee: u64) -> Transition {
        if self.is_settled() {
            log::debug!("Fee result arrived after the lookup settled, ignored");
            return Transition::Ignored;
        }
        self.state = LookupState::Succeeded(fee);
        Transition::Complete
    }

    pub fn on_failure(&mut self, error: FeeProviderError) -> Transition {
        if self.is_settled() {
            log::debug!("Fee lookup error after the lookup settled, ignored: {}", error);
            return Transition::Ignored;
        }
        if self.timer_armed {
            log::warn!("Retry timer already armed, extra failure ignored: {}", error);
            return Transition::Ignored;
        }
        self.timer_armed = true;
        self.last_error = Some(error);
        Transition::RetryAfter(1 + self.faults)
    }

    pub fn on_timer(&mut self) -> Transition {
        self.timer_armed = false;
        self.faults += 1;
        if self.is_settled() {
            log::debug!("Retry timer fired after the lookup settled, ignored");
            return Transition::Ignored;
        }
        if self.faults < MAX_ATTEMPTS {
            self.state = LookupState::Pending {
                attempt: self.faults + 1,
            };
            Transition::Reissue
        } else {
            let error = self
                .last_error
                .clone()
                .unwrap_or_else(|| FeeProviderError::Task("no error recorded".to_string()));
            self.state = LookupState::Failed(error);
            Transition::Complete
        }
    }

    /// Settled result, if any.
    pub fn result(&self, tx_id: &str, provider: &str) -> Option<Result<u64, FeeLookupError>> {
        match &self.state {
            LookupState::Pending { .. } => None,
            LookupState::Succeeded(fee) => Some(Ok(*fee)),
            LookupState::Failed(error) => Some(Err(FeeLookupError::PermanentLookupFailure {
                tx_id: tx_id.to_string(),
                provider: provider.to_string(),
                attempts: self.faults,
                last_error: error.clone(),
            })),
        }
    }
}

pub type Delay = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Timer source for retries. One unit = `FeeLookupConfig::retry_unit_ms`
/// in production.
pub trait Scheduler: Send + Sync {
    fn delay(&self, units: u32) -> Delay;
}

#[derive(Debug, Clone)]
pub struct TokioScheduler {
    unit: Duration,
}

impl TokioScheduler {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    pub fn from_config(config: &FeeLookupConfig) -> Self {
        Self::new(Duration::from_millis(config.retry_unit_ms))
    }
}

impl Scheduler for TokioScheduler {
    fn delay(&self, units: u32) -> Delay {
        Box::pin(tokio::time::sleep(self.unit * units))
    }
}

/// Runs lookups on tokio; many may be in flight, each with its own state.
#[derive(Clone)]
pub struct FeeLookupClient {
    provider: Arc<dyn FeeProvider>,
    scheduler: Arc<dyn Scheduler>,
}

impl FeeLookupClient {
    pub fn new(provider: Arc<dyn FeeProvider>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            provider,
            scheduler,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Start a lookup in the background. The receiver yields exactly one
    /// result. Must be called inside a tokio runtime.
    pub fn request(&self, tx_id: impl Into<String>) -> oneshot::Receiver<Result<u64, FeeLookupError>> {
        let (sender, receiver) = oneshot::channel();
        let client = self.clone();
        let tx_id = tx_id.into();
        tokio::spawn(async move {
            let result = client.lookup(&tx_id).await;
            if sender.send(result).is_err() {
                log::debug!("Fee lookup for {} finished after its receiver was dropped", tx_id);
            }
        });
        receiver
    }

    /// Drive one lookup to completion.
    pub async fn lookup(&self, tx_id: &str) -> Result<u64, FeeLookupError> {
        let mut lookup = FeeLookup::new();
        loop {
            let provider = Arc::clone(&self.provider);
            let id = tx_id.to_string();
            let outcome = tokio::task::spawn_blocking(move || provider.get_fee(&id))
                .await
                .unwrap_or_else(|e| Err(FeeProviderError::Task(e.to_string())));

            let mut transition = match outcome {
                Ok(fee) => {
                    log::debug!("Received fee {} for tx {} from {}", fee, tx_id, self.provider.name());
                    lookup.on_success(fee)
                }
                Err(e) => {
                    log::debug!(
                        "Fee request for tx {} from {} failed (expected if not yet propagated): {}",
                        tx_id,
                        self.provider.name(),
                        e
                    );
                    lookup.on_failure(e)
                }
            };

            if let Transition::RetryAfter(units) = transition {
                self.scheduler.delay(units).await;
                transition = lookup.on_timer();
            }

            if transition != Transition::Reissue {
                break;
            }
        }

        lookup
            .result(tx_id, self.provider.name())
            .unwrap_or(Err(FeeLookupError::Interrupted))
    }
}
