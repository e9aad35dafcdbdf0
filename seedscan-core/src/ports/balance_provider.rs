//! Balance provider port
//!
//! Defines the interface for looking up an address balance with an external
//! block-explorer API (Etherscan, BlockCypher, simulated data, etc.)

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{Asset, ProviderKind};

/// What a provider saw for one asset on one address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Balance in whole coins
    Balance(Decimal),
    /// The address is not valid on this chain. It genuinely holds nothing there,
    /// so this is reported as a real zero rather than an error.
    InvalidAddress,
}

impl Observation {
    pub fn amount(&self) -> Decimal {
        match self {
            Observation::Balance(amount) => *amount,
            Observation::InvalidAddress => Decimal::ZERO,
        }
    }
}

/// Balance provider trait
///
/// Implementations are only constructed when their credential is present;
/// the aggregator represents unconfigured providers itself.
pub trait BalanceProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Assets this provider is asked about, one request each
    fn assets(&self) -> &[Asset];

    /// Look up the balance of `asset` on `address`
    ///
    /// Transport failures and timeouts map to `Error::ProviderTransport`,
    /// unexpected bodies to `Error::ProviderData`.
    fn fetch_balance(&self, address: &str, asset: Asset) -> Result<Observation>;
}
