//! Check command - generate phrases and look up their balances

use std::collections::HashMap;

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use seedscan_core::services::{clamp_count, MAX_BATCH};
use seedscan_core::{OperationResult, ProviderKind, ScanReport};

use super::{cancel_on_ctrl_c, get_context, parse_word_count};
use crate::output;

pub fn run(count: usize, words: Option<usize>, simulate: bool, quiet_errors: bool, json: bool) -> Result<()> {
    let word_count = parse_word_count(words)?;
    let ctx = get_context(|config| {
        config.simulate |= simulate;
        if quiet_errors {
            config.report_errors = false;
        }
    })?;
    let _ = ctx.logger.log_command("check");

    let enabled = ctx.scan_service.aggregator().enabled_kinds();
    let total = clamp_count(count);
    if !json {
        if enabled.is_empty() {
            output::warning("No providers configured. Run 'seedscan providers' to see how to enable them.");
        }
        if count > MAX_BATCH {
            output::warning(&format!("Checking {} phrases (maximum per run)", MAX_BATCH));
        }
    }

    let cancel = cancel_on_ctrl_c();
    let progress = if json || atty::isnt(atty::Stream::Stderr) {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let report = ctx.scan_service.scan(total, word_count, &cancel, |p| {
        progress.set_position(p.processed as u64);
        progress.set_message(format!("{} reported", p.reported));
    });
    progress.finish_and_clear();

    print_report(report, &enabled, json)
}

/// Print a finished scan as JSON or as a table with a summary line
pub fn print_report(report: ScanReport, enabled: &[ProviderKind], json: bool) -> Result<()> {
    if json {
        let mut context = HashMap::new();
        context.insert(
            "providers".to_string(),
            serde_json::json!(enabled.iter().map(|k| k.key()).collect::<Vec<_>>()),
        );
        let result = OperationResult::ok_with_context(report, context);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if report.cancelled {
        output::warning(&format!(
            "Cancelled after {} of {} phrases",
            report.processed, report.requested
        ));
    }

    if report.results.is_empty() {
        println!("No phrases with balances or provider errors.");
    } else {
        println!("{}", output::results_table(&report.results));
    }

    let funded = report
        .results
        .iter()
        .filter(|r| r.has_positive_balance())
        .count();
    println!();
    println!(
        "{} {} checked, {} reported, {} with a positive balance",
        "Done:".bold(),
        report.processed,
        report.results.len(),
        funded
    );
    if funded > 0 {
        output::success("Positive balances found. Do not move funds you do not own.");
    }

    Ok(())
}
