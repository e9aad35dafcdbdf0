//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - One blocking HTTP client per balance provider (BalanceProvider)
//! - Simulated provider for offline runs
//! - BIP-39/BIP-32 Ethereum derivation (AddressDeriver)

pub mod alchemy;
pub mod bip44;
pub mod blockcypher;
pub mod blockstream;
pub mod cryptoapis;
pub mod etherscan;
mod http;
pub mod simulated;

#[cfg(test)]
pub mod provider_mock;

pub use alchemy::AlchemyProvider;
pub use bip44::Bip44EthereumDeriver;
pub use blockcypher::BlockCypherProvider;
pub use blockstream::BlockstreamProvider;
pub use cryptoapis::CryptoApisProvider;
pub use etherscan::EtherscanProvider;
pub use simulated::SimulatedProvider;
