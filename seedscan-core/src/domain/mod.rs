//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external dependencies.

pub mod asset;
pub mod balance;
mod phrase;
pub mod result;

pub use asset::Asset;
pub use balance::{BalanceRecord, BalanceSource, ProviderKind};
pub use phrase::{DerivedAddress, GeneratedPhrase, PhraseResult, ScanReport, WalletKind, WordCount};
