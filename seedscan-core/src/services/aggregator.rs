//! Balance aggregator - fan one address out to every provider and merge
//!
//! Each (provider, asset) lookup runs on its own scoped thread; all of them are
//! joined before the aggregation returns, so one slow or failing provider never
//! hides the others. Records come back in provider order, then asset order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use uuid::Uuid;

use crate::adapters::{
    AlchemyProvider, BlockCypherProvider, BlockstreamProvider, CryptoApisProvider, EtherscanProvider,
    SimulatedProvider,
};
use crate::config::Config;
use crate::domain::{Asset, BalanceRecord, ProviderKind};
use crate::ports::{BalanceProvider, EventSink, LogEvent, Observation};

/// Cooperative cancellation shared between a scan and whoever may stop it
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A provider position in the aggregation order. `None` means no credential.
pub struct ProviderSlot {
    pub kind: ProviderKind,
    pub provider: Option<Arc<dyn BalanceProvider>>,
}

impl ProviderSlot {
    pub fn enabled(provider: Arc<dyn BalanceProvider>) -> Self {
        Self {
            kind: provider.kind(),
            provider: Some(provider),
        }
    }

    pub fn disabled(kind: ProviderKind) -> Self {
        Self { kind, provider: None }
    }
}

/// One failed lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub asset: Asset,
    pub message: String,
}

/// Everything observed for one address
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub records: Vec<BalanceRecord>,
    pub failures: Vec<ProviderFailure>,
    /// Some lookups were skipped because the scan was cancelled
    pub cancelled: bool,
}

/// Identifies the phrase an aggregation belongs to, for event correlation
#[derive(Debug, Clone, Copy)]
pub struct CallScope {
    pub run_id: Uuid,
    pub phrase_index: usize,
}

pub struct BalanceAggregator {
    slots: Vec<ProviderSlot>,
    sink: Arc<dyn EventSink>,
}

impl BalanceAggregator {
    pub fn new(slots: Vec<ProviderSlot>, sink: Arc<dyn EventSink>) -> Self {
        Self { slots, sink }
    }

    /// Build the slots for every real provider, enabled iff its credential is present
    pub fn from_config(config: &Config, sink: Arc<dyn EventSink>) -> Result<Self> {
        let c = &config.credentials;
        let e = &config.endpoints;
        let timeout = config.request_timeout;

        let mut slots = Vec::with_capacity(ProviderKind::REAL.len() + 1);
        for kind in ProviderKind::REAL {
            let provider: Option<Arc<dyn BalanceProvider>> = match kind {
                ProviderKind::Etherscan => match c.etherscan.as_deref() {
                    Some(key) => Some(Arc::new(EtherscanProvider::new(key, e.etherscan.as_deref(), timeout)?)),
                    None => None,
                },
                ProviderKind::BlockCypher => match c.blockcypher.as_deref() {
                    Some(token) => Some(Arc::new(BlockCypherProvider::new(
                        token,
                        e.blockcypher.as_deref(),
                        timeout,
                    )?)),
                    None => None,
                },
                ProviderKind::Alchemy => match c.alchemy.as_deref() {
                    Some(key) => Some(Arc::new(AlchemyProvider::new(key, e.alchemy.as_deref(), timeout)?)),
                    None => None,
                },
                ProviderKind::Blockstream => match c.blockstream.as_ref() {
                    Some(credential) => Some(Arc::new(BlockstreamProvider::new(
                        credential,
                        e.blockstream.as_deref(),
                        e.blockstream_auth.as_deref(),
                        timeout,
                    )?)),
                    None => None,
                },
                ProviderKind::CryptoApis => match c.cryptoapis.as_deref() {
                    Some(key) => Some(Arc::new(CryptoApisProvider::new(key, e.cryptoapis.as_deref(), timeout)?)),
                    None => None,
                },
                ProviderKind::Simulated => None,
            };
            slots.push(ProviderSlot { kind, provider });
        }

        if config.simulate {
            slots.push(ProviderSlot::enabled(Arc::new(SimulatedProvider::new())));
        }

        Ok(Self::new(slots, sink))
    }

    pub fn slots(&self) -> &[ProviderSlot] {
        &self.slots
    }

    /// Kinds of the providers that will actually be called
    pub fn enabled_kinds(&self) -> Vec<ProviderKind> {
        self.slots
            .iter()
            .filter(|s| s.provider.is_some())
            .map(|s| s.kind)
            .collect()
    }

    /// Query every slot for `address` and concatenate the results
    pub fn aggregate(&self, address: &str, scope: CallScope, cancel: &CancelFlag) -> Aggregation {
        let mut aggregation = Aggregation::default();

        // (provider, asset, outcome) in slot order
        let outcomes: Vec<(ProviderKind, Asset, CallOutcome)> = thread::scope(|s| {
            let mut pending = Vec::new();
            for slot in &self.slots {
                let Some(provider) = slot.provider.as_ref() else {
                    pending.push((slot.kind, slot.kind.primary_asset(), Pending::NotQueried));
                    continue;
                };
                for &asset in provider.assets() {
                    if cancel.is_cancelled() {
                        pending.push((slot.kind, asset, Pending::Skipped));
                        continue;
                    }
                    let provider = Arc::clone(provider);
                    let handle = s.spawn(move || self.call(provider.as_ref(), address, asset, scope, cancel));
                    pending.push((slot.kind, asset, Pending::Running(handle)));
                }
            }

            pending
                .into_iter()
                .map(|(kind, asset, p)| {
                    let outcome = match p {
                        Pending::NotQueried => CallOutcome::NotQueried,
                        Pending::Skipped => CallOutcome::Skipped,
                        Pending::Running(handle) => handle.join().unwrap_or(CallOutcome::Panicked),
                    };
                    (kind, asset, outcome)
                })
                .collect()
        });

        for (kind, asset, outcome) in outcomes {
            match outcome {
                CallOutcome::Observed(observation) => {
                    aggregation
                        .records
                        .push(BalanceRecord::observed(kind, asset, observation.amount()));
                }
                CallOutcome::Failed(message) => {
                    aggregation.records.push(BalanceRecord::failed(asset));
                    aggregation.failures.push(ProviderFailure {
                        provider: kind,
                        asset,
                        message,
                    });
                }
                CallOutcome::NotQueried => aggregation.records.push(BalanceRecord::not_queried(asset)),
                CallOutcome::Panicked => {
                    self.sink.record(
                        LogEvent::provider_call_failed(kind, asset, "provider call panicked")
                            .with_run(scope.run_id)
                            .with_phrase_index(scope.phrase_index),
                    );
                    aggregation.records.push(BalanceRecord::unknown(asset));
                }
                CallOutcome::Skipped => aggregation.cancelled = true,
            }
        }

        aggregation
    }

    fn call(
        &self,
        provider: &dyn BalanceProvider,
        address: &str,
        asset: Asset,
        scope: CallScope,
        cancel: &CancelFlag,
    ) -> CallOutcome {
        if cancel.is_cancelled() {
            return CallOutcome::Skipped;
        }
        let kind = provider.kind();
        let scoped = |event: LogEvent| event.with_run(scope.run_id).with_phrase_index(scope.phrase_index);

        self.sink.record(scoped(LogEvent::provider_call_started(kind, asset)));
        match provider.fetch_balance(address, asset) {
            Ok(observation) => {
                self.sink.record(scoped(LogEvent::provider_call_finished(kind, asset)));
                CallOutcome::Observed(observation)
            }
            Err(e) => {
                let message = e.to_string();
                self.sink
                    .record(scoped(LogEvent::provider_call_failed(kind, asset, message.clone())));
                CallOutcome::Failed(message)
            }
        }
    }
}

enum Pending<'scope> {
    NotQueried,
    Skipped,
    Running(thread::ScopedJoinHandle<'scope, CallOutcome>),
}

enum CallOutcome {
    Observed(Observation),
    Failed(String),
    NotQueried,
    Skipped,
    Panicked,
}
