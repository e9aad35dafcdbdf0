//! Service layer - pipeline orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one stage of the pipeline.

pub mod aggregator;
pub mod filter;
pub mod generator;
pub mod logging;
pub mod scan;

pub use aggregator::{Aggregation, BalanceAggregator, CallScope, CancelFlag, ProviderFailure, ProviderSlot};
pub use filter::{FilterOutcome, ResultFilter};
pub use generator::{PhraseGenerator, PhraseSource};
pub use logging::{EntryPoint, EventCount, LogEntry, LoggingService};
pub use scan::{clamp_count, ScanProgress, ScanService, MAX_BATCH};
