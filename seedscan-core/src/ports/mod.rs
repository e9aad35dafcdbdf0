//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core pipeline
//! depends only on these traits, not on concrete implementations.

mod address_deriver;
mod balance_provider;
pub mod event_sink;

pub use address_deriver::AddressDeriver;
pub use balance_provider::{BalanceProvider, Observation};
pub use event_sink::{EventSink, LogEvent, MemorySink, NoopSink};
