//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use seedscan_core::PhraseResult;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Table of reported phrases, one row per phrase
pub fn results_table(results: &[PhraseResult]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["#", "Phrase", "Words", "Address", "Balances", "Errors"]);

    for (i, result) in results.iter().enumerate() {
        let address = match (&result.address, &result.derivation_error) {
            (Some(address), _) => address.clone(),
            (None, Some(err)) => format!("{} {}", "invalid:".red(), err),
            (None, None) => String::new(),
        };

        let balances = result
            .balances
            .iter()
            .map(|b| format!("{} {} ({})", b.amount.normalize(), b.currency, b.source))
            .collect::<Vec<_>>()
            .join("\n");

        let errors = result
            .aggregate_error
            .as_deref()
            .map(|e| e.replace("; ", "\n").yellow().to_string())
            .unwrap_or_default();

        table.add_row(vec![
            (i + 1).to_string(),
            result.mnemonic.clone(),
            result.word_count.to_string(),
            address,
            balances,
            errors,
        ]);
    }

    table
}
