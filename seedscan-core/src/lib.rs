//! seedscan core - mnemonic generation, address derivation and balance aggregation
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: pure data (assets, balance records, phrase results)
//! - **ports**: traits for external collaborators (BalanceProvider, AddressDeriver, EventSink)
//! - **services**: pipeline orchestration (generator, aggregator, filter, scan, logging)
//! - **adapters**: concrete implementations (provider HTTP clients, BIP-44 deriver)
//!
//! Educational tool: never enter a real seed phrase.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use config::{Config, Credentials};
use ports::{EventSink, NoopSink};
use services::{EntryPoint, LoggingService, ScanService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    Asset, BalanceRecord, BalanceSource, DerivedAddress, GeneratedPhrase, PhraseResult, ProviderKind, ScanReport,
    WalletKind, WordCount,
};
pub use services::{CancelFlag, ScanProgress};

/// Main context for seedscan operations
///
/// Holds the loaded configuration, the event log and the wired scan pipeline.
pub struct ScanContext {
    pub config: Config,
    pub logger: Arc<LoggingService>,
    pub scan_service: ScanService,
}

impl ScanContext {
    /// Load settings from `data_dir`, open its event log and wire the providers
    pub fn new(data_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        let config = Config::load(data_dir)?;
        Self::with_config(data_dir, config, entry_point)
    }

    /// Same as `new` with an already loaded (possibly adjusted) configuration
    pub fn with_config(data_dir: &Path, config: Config, entry_point: EntryPoint) -> Result<Self> {
        let logger = Arc::new(LoggingService::new(data_dir, entry_point, env!("CARGO_PKG_VERSION"))?);
        let sink: Arc<dyn EventSink> = logger.clone();
        let scan_service = ScanService::from_config(&config, sink)?;

        Ok(Self {
            config,
            logger,
            scan_service,
        })
    }
}

/// Generate `count` phrases (at most 100) and check them against the providers
/// whose credentials are present.
///
/// Never fails: a setup error yields an empty list and per-phrase failures are
/// reported inside the results or dropped.
pub fn generate_and_check(count: usize, credentials: &Credentials) -> Vec<PhraseResult> {
    let config = Config::from_credentials(credentials.clone());
    match ScanService::from_config(&config, Arc::new(NoopSink)) {
        Ok(service) => service.generate_and_check(count),
        Err(_) => Vec::new(),
    }
}
