//! Phrase generator - fresh BIP-39 mnemonics from a cryptographic RNG

use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

use crate::domain::{GeneratedPhrase, WordCount};

/// Supplies the phrases of a generated scan
pub trait PhraseSource: Send + Sync {
    /// Next phrase, of `word_count` words or of a random supported length
    fn next_phrase(&self, word_count: Option<WordCount>) -> Result<GeneratedPhrase>;
}

/// Generates candidate phrases
///
/// Uses the operating system RNG by default; any `CryptoRng` can be plugged
/// in (tests use a seeded `StdRng`).
pub struct PhraseGenerator<R = OsRng> {
    rng: Mutex<R>,
}

impl PhraseGenerator<OsRng> {
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for PhraseGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng + Send> PhraseGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng: Mutex::new(rng) }
    }

    /// Generate a phrase with a word count drawn uniformly from 12/15/18/21/24
    pub fn generate(&self) -> Result<GeneratedPhrase> {
        let mut rng = self.rng.lock().map_err(|_| anyhow!("phrase generator rng poisoned"))?;
        let word_count = WordCount::ALL[rng.gen_range(0..WordCount::ALL.len())];
        encode(&mut *rng, word_count)
    }

    /// Generate a phrase with a fixed word count
    pub fn generate_with_word_count(&self, word_count: WordCount) -> Result<GeneratedPhrase> {
        let mut rng = self.rng.lock().map_err(|_| anyhow!("phrase generator rng poisoned"))?;
        encode(&mut *rng, word_count)
    }

    /// Generate `count` phrases
    pub fn generate_batch(&self, count: usize, word_count: Option<WordCount>) -> Result<Vec<GeneratedPhrase>> {
        (0..count).map(|_| self.next_phrase(word_count)).collect()
    }
}

impl<R: RngCore + CryptoRng + Send> PhraseSource for PhraseGenerator<R> {
    fn next_phrase(&self, word_count: Option<WordCount>) -> Result<GeneratedPhrase> {
        match word_count {
            Some(words) => self.generate_with_word_count(words),
            None => self.generate(),
        }
    }
}

fn encode<R: RngCore + CryptoRng>(rng: &mut R, word_count: WordCount) -> Result<GeneratedPhrase> {
    let mut entropy = vec![0u8; word_count.entropy_bytes()];
    rng.try_fill_bytes(&mut entropy)
        .map_err(|e| anyhow!("Entropy source failed: {}", e))?;

    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .with_context(|| format!("Failed to encode {} bytes of entropy", entropy.len()))?;

    Ok(GeneratedPhrase {
        mnemonic: mnemonic.to_string(),
        word_count,
    })
}
