//! Result filter - decide what a phrase reports, if anything

use crate::domain::{BalanceRecord, DerivedAddress, PhraseResult};
use crate::services::aggregator::Aggregation;

/// Outcome of filtering one phrase's records
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub positive_real: Vec<BalanceRecord>,
    pub had_api_error: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ResultFilter {
    report_errors: bool,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self { report_errors: true }
    }
}

impl ResultFilter {
    /// `report_errors` surfaces phrases whose only signal is a failed provider call
    pub fn new(report_errors: bool) -> Self {
        Self { report_errors }
    }

    pub fn evaluate(&self, records: &[BalanceRecord]) -> FilterOutcome {
        FilterOutcome {
            positive_real: records.iter().filter(|r| r.is_positive_real()).cloned().collect(),
            had_api_error: records.iter().any(|r| r.is_error()),
        }
    }

    /// Result for a phrase whose address was derived and aggregated
    pub fn build(
        &self,
        mnemonic: &str,
        derived: &DerivedAddress,
        aggregation: &Aggregation,
    ) -> Option<PhraseResult> {
        let outcome = self.evaluate(&aggregation.records);
        let has_positive = !outcome.positive_real.is_empty();

        if !has_positive && !(outcome.had_api_error && self.report_errors) {
            return None;
        }

        let aggregate_error = if outcome.had_api_error {
            let failed: Vec<String> = aggregation
                .failures
                .iter()
                .map(|f| format!("{} {}: {}", f.provider, f.asset, f.message))
                .collect();
            Some(if failed.is_empty() {
                "provider error".to_string()
            } else {
                failed.join("; ")
            })
        } else {
            None
        };

        Some(PhraseResult {
            mnemonic: mnemonic.to_string(),
            word_count: word_count(mnemonic),
            address: Some(derived.address.clone()),
            wallet_kind: Some(derived.wallet_kind),
            balances: outcome.positive_real,
            derivation_error: None,
            aggregate_error,
        })
    }

    /// Derivation failures are always reported
    pub fn derivation_failed(&self, mnemonic: &str, message: impl Into<String>) -> PhraseResult {
        PhraseResult {
            mnemonic: mnemonic.to_string(),
            word_count: word_count(mnemonic),
            address: None,
            wallet_kind: None,
            balances: Vec::new(),
            derivation_error: Some(message.into()),
            aggregate_error: None,
        }
    }
}

fn word_count(mnemonic: &str) -> usize {
    mnemonic.split_whitespace().count()
}
