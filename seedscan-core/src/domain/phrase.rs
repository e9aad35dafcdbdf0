//! Mnemonic phrases and the per-phrase result reported to callers

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::balance::BalanceRecord;

/// Supported mnemonic lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "usize", try_from = "usize")]
pub enum WordCount {
    Twelve,
    Fifteen,
    Eighteen,
    TwentyOne,
    TwentyFour,
}

impl WordCount {
    pub const ALL: [WordCount; 5] = [
        WordCount::Twelve,
        WordCount::Fifteen,
        WordCount::Eighteen,
        WordCount::TwentyOne,
        WordCount::TwentyFour,
    ];

    pub fn words(&self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::Fifteen => 15,
            WordCount::Eighteen => 18,
            WordCount::TwentyOne => 21,
            WordCount::TwentyFour => 24,
        }
    }

    /// Bytes of entropy encoded by a phrase of this length
    pub fn entropy_bytes(&self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::Fifteen => 20,
            WordCount::Eighteen => 24,
            WordCount::TwentyOne => 28,
            WordCount::TwentyFour => 32,
        }
    }

    pub fn from_words(words: usize) -> Option<Self> {
        Self::ALL.iter().copied().find(|w| w.words() == words)
    }
}

impl From<WordCount> for usize {
    fn from(count: WordCount) -> usize {
        count.words()
    }
}

impl TryFrom<usize> for WordCount {
    type Error = String;

    fn try_from(words: usize) -> Result<Self, Self::Error> {
        WordCount::from_words(words)
            .ok_or_else(|| format!("unsupported word count: {} (expected 12, 15, 18, 21 or 24)", words))
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words())
    }
}

/// A freshly generated candidate phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPhrase {
    pub mnemonic: String,
    pub word_count: WordCount,
}

/// What kind of wallet the deriver produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletKind {
    /// BIP-44 HD node at m/44'/60'/0'/0/0
    Bip44Ethereum,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletKind::Bip44Ethereum => f.write_str("bip44-ethereum"),
        }
    }
}

/// Output of a successful derivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: String,
    pub wallet_kind: WalletKind,
}

/// The unit reported to callers, one per surfaced phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseResult {
    pub mnemonic: String,
    pub word_count: usize,
    pub address: Option<String>,
    pub wallet_kind: Option<WalletKind>,
    /// Positive real balances only
    pub balances: Vec<BalanceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_error: Option<String>,
}

impl PhraseResult {
    pub fn has_positive_balance(&self) -> bool {
        !self.balances.is_empty()
    }
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub run_id: Uuid,
    pub requested: usize,
    pub processed: usize,
    pub cancelled: bool,
    pub results: Vec<PhraseResult>,
}
