//! Simulated balance provider
//!
//! Produces random balances without touching the network so the whole
//! pipeline can be exercised offline. Every record it produces is marked
//! `isReal = false`, so the filter never lets it through on its own.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Asset, ProviderKind};
use crate::ports::{BalanceProvider, Observation};

/// Chance that a simulated lookup reports a non-zero balance
pub const DEFAULT_HIT_RATE: f64 = 0.1;

pub struct SimulatedProvider {
    rng: Mutex<StdRng>,
    hit_rate: f64,
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy(), DEFAULT_HIT_RATE)
    }

    /// Deterministic provider for tests
    pub fn seeded(seed: u64, hit_rate: f64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), hit_rate)
    }

    fn from_rng(rng: StdRng, hit_rate: f64) -> Self {
        Self {
            rng: Mutex::new(rng),
            hit_rate: hit_rate.clamp(0.0, 1.0),
        }
    }

    fn random_amount(&self) -> Result<Decimal> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| Error::Other("simulated provider rng poisoned".to_string()))?;

        if !rng.gen_bool(self.hit_rate) {
            return Ok(Decimal::ZERO);
        }

        // Up to 5 whole coins, at most 8 decimal places
        let subunits: i64 = rng.gen_range(1..=500_000_000);
        Ok(Decimal::new(subunits, 8).normalize())
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceProvider for SimulatedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Simulated
    }

    fn assets(&self) -> &[Asset] {
        &Asset::ALL
    }

    fn fetch_balance(&self, _address: &str, _asset: Asset) -> Result<Observation> {
        self.random_amount().map(Observation::Balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_hit_rate_reports_zero() {
        let provider = SimulatedProvider::seeded(7, 0.0);
        for asset in Asset::ALL {
            let observation = provider.fetch_balance("0xabc", asset).unwrap();
            assert_eq!(observation.amount(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_full_hit_rate_reports_positive_amounts() {
        let provider = SimulatedProvider::seeded(7, 1.0);
        for _ in 0..20 {
            let amount = provider.fetch_balance("0xabc", Asset::Btc).unwrap().amount();
            assert!(amount > Decimal::ZERO);
            assert!(amount <= Decimal::new(5, 0));
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = SimulatedProvider::seeded(42, 0.5);
        let b = SimulatedProvider::seeded(42, 0.5);
        for asset in Asset::ALL {
            assert_eq!(
                a.fetch_balance("x", asset).unwrap(),
                b.fetch_balance("x", asset).unwrap()
            );
        }
    }

    #[test]
    fn test_hit_rate_is_clamped() {
        let provider = SimulatedProvider::seeded(1, 3.0);
        assert!(provider.fetch_balance("x", Asset::Eth).unwrap().amount() > Decimal::ZERO);
    }
}
