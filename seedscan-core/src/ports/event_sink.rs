//! Event sink port
//!
//! The pipeline reports what it does through structured events at fixed
//! points (provider call start/end/failure, phrase processed, batch
//! boundaries). Where they end up is the sink's business.
//!
//! Events never carry mnemonics or addresses.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Asset, ProviderKind};

pub const SCAN_STARTED: &str = "scan_started";
pub const SCAN_FINISHED: &str = "scan_finished";
pub const SCAN_CANCELLED: &str = "scan_cancelled";
pub const PROVIDER_CALL_STARTED: &str = "provider_call_started";
pub const PROVIDER_CALL_FINISHED: &str = "provider_call_finished";
pub const PROVIDER_CALL_FAILED: &str = "provider_call_failed";
pub const PHRASE_PROCESSED: &str = "phrase_processed";
pub const PHRASE_FAILED: &str = "phrase_failed";

/// A log event to be recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrase_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    /// Create a new log event with just an event name
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            run_id: None,
            provider: None,
            asset: None,
            phrase_index: None,
            command: None,
            error_message: None,
            error_details: None,
        }
    }

    pub fn provider_call_started(provider: ProviderKind, asset: Asset) -> Self {
        Self::new(PROVIDER_CALL_STARTED).with_call(provider, asset)
    }

    pub fn provider_call_finished(provider: ProviderKind, asset: Asset) -> Self {
        Self::new(PROVIDER_CALL_FINISHED).with_call(provider, asset)
    }

    pub fn provider_call_failed(provider: ProviderKind, asset: Asset, message: impl Into<String>) -> Self {
        Self::new(PROVIDER_CALL_FAILED)
            .with_call(provider, asset)
            .with_error(message)
    }

    /// A phrase went through the pipeline. `details` summarizes the outcome.
    pub fn phrase_processed(index: usize, details: impl Into<String>) -> Self {
        Self::new(PHRASE_PROCESSED)
            .with_phrase_index(index)
            .with_error_details(details)
    }

    pub fn phrase_failed(index: usize, message: impl Into<String>) -> Self {
        Self::new(PHRASE_FAILED)
            .with_phrase_index(index)
            .with_error(message)
    }

    /// Set the batch this event belongs to
    pub fn with_run(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Set the provider and asset of a provider call
    pub fn with_call(mut self, provider: ProviderKind, asset: Asset) -> Self {
        self.provider = Some(provider.key().to_string());
        self.asset = Some(asset.symbol().to_string());
        self
    }

    pub fn with_phrase_index(mut self, index: usize) -> Self {
        self.phrase_index = Some(index as u64);
        self
    }

    /// Set the command context (for CLI events)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set error information
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Set error details or additional context
    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// Destination for pipeline events
///
/// Recording must not fail the caller; sinks swallow their own errors.
pub trait EventSink: Send + Sync {
    fn record(&self, event: LogEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn record(&self, _event: LogEvent) {}
}

/// Sink that keeps events in memory, for inspection in tests and embedders
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of the events recorded so far, in order
    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: LogEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_call_failed_event() {
        let event = LogEvent::provider_call_failed(ProviderKind::BlockCypher, Asset::Btc, "HTTP 500");
        assert_eq!(event.event, PROVIDER_CALL_FAILED);
        assert_eq!(event.provider.as_deref(), Some("blockcypher"));
        assert_eq!(event.asset.as_deref(), Some("BTC"));
        assert_eq!(event.error_message.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.record(LogEvent::new(SCAN_STARTED));
        sink.record(LogEvent::phrase_processed(0, "dropped"));
        sink.record(LogEvent::new(SCAN_FINISHED));
        assert_eq!(
            sink.event_names(),
            vec![SCAN_STARTED, PHRASE_PROCESSED, SCAN_FINISHED]
        );
        assert_eq!(sink.events()[1].phrase_index, Some(0));
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let json = serde_json::to_value(LogEvent::new("x")).unwrap();
        assert_eq!(json, serde_json::json!({"event": "x"}));
    }
}
