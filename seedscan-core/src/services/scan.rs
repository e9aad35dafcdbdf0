//! Scan service - generate → derive → aggregate → filter, one phrase at a time

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use crate::adapters::Bip44EthereumDeriver;
use crate::config::Config;
use crate::domain::{PhraseResult, ScanReport, WordCount};
use crate::ports::event_sink::{SCAN_CANCELLED, SCAN_FINISHED, SCAN_STARTED};
use crate::ports::{AddressDeriver, EventSink, LogEvent};
use crate::services::aggregator::{BalanceAggregator, CallScope, CancelFlag};
use crate::services::filter::ResultFilter;
use crate::services::generator::{PhraseGenerator, PhraseSource};

/// Largest batch a single call will process
pub const MAX_BATCH: usize = 100;

/// Bound a requested batch size to 0..=MAX_BATCH
pub fn clamp_count(count: usize) -> usize {
    count.min(MAX_BATCH)
}

/// Reported after every phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// Phrases finished so far
    pub processed: usize,
    pub total: usize,
    /// Phrases that produced a result so far
    pub reported: usize,
}

enum PhraseOutcome {
    Reported(PhraseResult),
    Dropped,
    Cancelled,
}

pub struct ScanService {
    generator: Arc<dyn PhraseSource>,
    deriver: Arc<dyn AddressDeriver>,
    aggregator: BalanceAggregator,
    filter: ResultFilter,
    sink: Arc<dyn EventSink>,
}

impl ScanService {
    pub fn new(
        deriver: Arc<dyn AddressDeriver>,
        aggregator: BalanceAggregator,
        filter: ResultFilter,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            generator: Arc::new(PhraseGenerator::new()),
            deriver,
            aggregator,
            filter,
            sink,
        }
    }

    /// Wire the production adapters for `config`
    pub fn from_config(config: &Config, sink: Arc<dyn EventSink>) -> Result<Self> {
        let deriver = Arc::new(Bip44EthereumDeriver::new()?);
        let aggregator = BalanceAggregator::from_config(config, Arc::clone(&sink))?;
        Ok(Self::new(
            deriver,
            aggregator,
            ResultFilter::new(config.report_errors),
            sink,
        ))
    }

    /// Replace the phrase source used by `scan`
    pub fn with_generator(mut self, generator: Arc<dyn PhraseSource>) -> Self {
        self.generator = generator;
        self
    }

    pub fn aggregator(&self) -> &BalanceAggregator {
        &self.aggregator
    }

    /// Generate `count` phrases (clamped to MAX_BATCH) and check each
    pub fn scan<F>(
        &self,
        count: usize,
        word_count: Option<WordCount>,
        cancel: &CancelFlag,
        mut on_progress: F,
    ) -> ScanReport
    where
        F: FnMut(ScanProgress),
    {
        let total = clamp_count(count);
        self.run(total, cancel, &mut on_progress, |index| {
            self.generator
                .next_phrase(word_count)
                .map(|p| p.mnemonic)
                .map_err(|e| format!("phrase {} could not be generated: {}", index, e))
        })
    }

    /// Run the pipeline on caller-supplied phrases
    pub fn check_phrases(&self, phrases: &[String], cancel: &CancelFlag) -> ScanReport {
        self.run(phrases.len(), cancel, &mut |_| {}, |index| Ok(phrases[index].clone()))
    }

    /// Generate and check `count` phrases, returning only the reported results
    pub fn generate_and_check(&self, count: usize) -> Vec<PhraseResult> {
        self.scan(count, None, &CancelFlag::new(), |_| {}).results
    }

    fn run<N>(
        &self,
        total: usize,
        cancel: &CancelFlag,
        on_progress: &mut dyn FnMut(ScanProgress),
        mut next_phrase: N,
    ) -> ScanReport
    where
        N: FnMut(usize) -> std::result::Result<String, String>,
    {
        let run_id = Uuid::new_v4();
        self.sink.record(
            LogEvent::new(SCAN_STARTED)
                .with_run(run_id)
                .with_error_details(format!("{} phrases", total)),
        );

        let mut report = ScanReport {
            run_id,
            requested: total,
            processed: 0,
            cancelled: false,
            results: Vec::new(),
        };

        for index in 0..total {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match next_phrase(index) {
                Ok(mnemonic) => {
                    let scope = CallScope {
                        run_id,
                        phrase_index: index,
                    };
                    let outcome = catch_unwind(AssertUnwindSafe(|| self.check_one(&mnemonic, scope, cancel)));

                    match outcome {
                        Ok(PhraseOutcome::Reported(result)) => report.results.push(result),
                        Ok(PhraseOutcome::Dropped) => {}
                        Ok(PhraseOutcome::Cancelled) => {
                            report.cancelled = true;
                            break;
                        }
                        Err(_) => self.sink.record(
                            LogEvent::phrase_failed(index, "phrase processing panicked").with_run(run_id),
                        ),
                    }
                }
                Err(message) => self
                    .sink
                    .record(LogEvent::phrase_failed(index, message).with_run(run_id)),
            }
            report.processed += 1;

            on_progress(ScanProgress {
                processed: report.processed,
                total,
                reported: report.results.len(),
            });
        }

        let summary = format!(
            "processed {}, reported {}",
            report.processed,
            report.results.len()
        );
        let closing = if report.cancelled { SCAN_CANCELLED } else { SCAN_FINISHED };
        self.sink
            .record(LogEvent::new(closing).with_run(run_id).with_error_details(summary));

        report
    }

    fn check_one(&self, mnemonic: &str, scope: CallScope, cancel: &CancelFlag) -> PhraseOutcome {
        let derived = match self.deriver.derive(mnemonic) {
            Ok(derived) => derived,
            Err(e) => {
                self.sink.record(
                    LogEvent::phrase_processed(scope.phrase_index, "derivation failed")
                        .with_run(scope.run_id)
                        .with_error(e.to_string()),
                );
                return PhraseOutcome::Reported(self.filter.derivation_failed(mnemonic, e.to_string()));
            }
        };

        let aggregation = self.aggregator.aggregate(&derived.address, scope, cancel);
        if aggregation.cancelled {
            return PhraseOutcome::Cancelled;
        }

        let result = self.filter.build(mnemonic, &derived, &aggregation);
        let details = match &result {
            Some(r) => format!("reported, {} positive balances", r.balances.len()),
            None => "dropped".to_string(),
        };
        self.sink.record(
            LogEvent::phrase_processed(scope.phrase_index, details).with_run(scope.run_id),
        );

        match result {
            Some(r) => PhraseOutcome::Reported(r),
            None => PhraseOutcome::Dropped,
        }
    }
}
