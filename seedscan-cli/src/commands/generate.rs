//! Generate command - print fresh phrases without touching any provider

use anyhow::{Context, Result};
use seedscan_core::adapters::Bip44EthereumDeriver;
use seedscan_core::ports::{AddressDeriver, LogEvent};
use seedscan_core::services::{clamp_count, PhraseGenerator};
use seedscan_core::OperationResult;
use serde::Serialize;

use super::{get_logger, log_event, parse_word_count};
use crate::output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedEntry {
    mnemonic: String,
    word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

pub fn run(count: usize, words: Option<usize>, address: bool, json: bool) -> Result<()> {
    let word_count = parse_word_count(words)?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("generate"));

    let phrases = PhraseGenerator::new()
        .generate_batch(clamp_count(count), word_count)
        .context("Failed to generate phrases")?;

    let deriver = if address {
        Some(Bip44EthereumDeriver::new()?)
    } else {
        None
    };

    let mut entries = Vec::with_capacity(phrases.len());
    for phrase in phrases {
        let address = match &deriver {
            Some(d) => Some(d.derive(&phrase.mnemonic)?.address),
            None => None,
        };
        entries.push(GeneratedEntry {
            word_count: phrase.word_count.words(),
            mnemonic: phrase.mnemonic,
            address,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(entries))?);
        return Ok(());
    }

    if entries.is_empty() {
        output::info("Nothing to generate.");
        return Ok(());
    }

    for entry in &entries {
        match &entry.address {
            Some(address) => println!("{}  {}", address, entry.mnemonic),
            None => println!("{}", entry.mnemonic),
        }
    }

    Ok(())
}
