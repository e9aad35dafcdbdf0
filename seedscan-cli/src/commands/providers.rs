//! Providers command - show and change which balance providers a scan will call

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;
use colored::Colorize;
use seedscan_core::config::{
    Config, ENV_ALCHEMY_API_KEY, ENV_BLOCKCYPHER_TOKEN, ENV_BLOCKSTREAM_CLIENT_ID, ENV_CRYPTOAPIS_API_KEY,
    ENV_ETHERSCAN_API_KEY, ENV_SIMULATE,
};
use seedscan_core::ports::{LogEvent, NoopSink};
use seedscan_core::services::BalanceAggregator;
use seedscan_core::{OperationResult, ProviderKind};
use serde::Serialize;

use super::{get_data_dir, get_logger, load_config, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum ProvidersCommands {
    /// Store a provider credential in settings.json
    Set {
        /// Provider key (etherscan, blockcypher, alchemy, blockstream, cryptoapis)
        provider: String,
        /// API key or token; the client id for blockstream
        key: String,
        /// Client secret (blockstream only)
        #[arg(long)]
        secret: Option<String>,
        /// Base URL override
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Remove a stored provider credential and base URL
    Unset {
        /// Provider key
        provider: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderStatus {
    #[serde(skip)]
    kind: ProviderKind,
    provider: &'static str,
    name: &'static str,
    enabled: bool,
    assets: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProvidersReport {
    data_dir: String,
    request_timeout_secs: u64,
    report_errors: bool,
    simulate: bool,
    providers: Vec<ProviderStatus>,
}

fn env_hint(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Etherscan => ENV_ETHERSCAN_API_KEY,
        ProviderKind::BlockCypher => ENV_BLOCKCYPHER_TOKEN,
        ProviderKind::Alchemy => ENV_ALCHEMY_API_KEY,
        ProviderKind::Blockstream => ENV_BLOCKSTREAM_CLIENT_ID,
        ProviderKind::CryptoApis => ENV_CRYPTOAPIS_API_KEY,
        ProviderKind::Simulated => ENV_SIMULATE,
    }
}

fn parse_provider(name: &str) -> Result<ProviderKind> {
    ProviderKind::REAL
        .iter()
        .copied()
        .find(|k| k.key().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| {
            let known: Vec<_> = ProviderKind::REAL.iter().map(|k| k.key()).collect();
            anyhow!("Unknown provider '{}'. Expected one of: {}", name, known.join(", "))
        })
}

pub fn run(command: Option<ProvidersCommands>, json: bool) -> Result<()> {
    match command {
        None => show(json),
        Some(command) => update(command, json),
    }
}

fn update(command: ProvidersCommands, json: bool) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create seedscan directory: {:?}", data_dir))?;
    // Environment overrides stay out of the file
    let mut config = Config::load_with_env(&data_dir, |_| None)?;

    let (kind, action) = match command {
        ProvidersCommands::Set { provider, key, secret, base_url } => {
            let kind = parse_provider(&provider)?;
            config.set_credential(kind, Some(key), secret)?;
            if base_url.is_some() {
                config.set_endpoint(kind, base_url)?;
            }
            (kind, "set")
        }
        ProvidersCommands::Unset { provider } => {
            let kind = parse_provider(&provider)?;
            config.set_credential(kind, None, None)?;
            config.set_endpoint(kind, None)?;
            (kind, "unset")
        }
    };
    config.save(&data_dir).context("Failed to write settings.json")?;

    let logger = get_logger();
    log_event(
        &logger,
        LogEvent::new("command_executed").with_command(format!("providers {} {}", action, kind.key())),
    );

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&OperationResult::ok(serde_json::json!({
                "provider": kind.key(),
                "enabled": config.credentials.is_enabled(kind),
            })))?
        );
    } else if config.credentials.is_enabled(kind) {
        output::success(&format!("{} enabled", kind.display_name()));
    } else {
        output::success(&format!("{} disabled", kind.display_name()));
    }
    Ok(())
}

fn show(json: bool) -> Result<()> {
    let (data_dir, config) = load_config()?;
    let aggregator = BalanceAggregator::from_config(&config, Arc::new(NoopSink))?;

    let providers: Vec<ProviderStatus> = aggregator
        .slots()
        .iter()
        .map(|slot| ProviderStatus {
            kind: slot.kind,
            provider: slot.kind.key(),
            name: slot.kind.display_name(),
            enabled: slot.provider.is_some(),
            assets: match &slot.provider {
                Some(p) => p.assets().iter().map(|a| a.symbol()).collect(),
                None => vec![slot.kind.primary_asset().symbol()],
            },
            credential: config.credentials.masked(slot.kind),
            base_url: config.endpoints.get(slot.kind).map(str::to_string),
        })
        .collect();

    let report = ProvidersReport {
        data_dir: data_dir.to_string_lossy().to_string(),
        request_timeout_secs: config.request_timeout.as_secs(),
        report_errors: config.report_errors,
        simulate: config.simulate,
        providers,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(report))?);
        return Ok(());
    }

    println!("{}", "Balance Providers".bold());
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Provider", "Status", "Assets", "Credential", "Endpoint"]);
    for p in &report.providers {
        let status = if p.enabled {
            "enabled".green().to_string()
        } else {
            format!("{} (set {})", "disabled".dimmed(), env_hint(p.kind))
        };
        table.add_row(vec![
            p.name.to_string(),
            status,
            p.assets.join(", "),
            p.credential.clone().unwrap_or_default(),
            p.base_url.clone().unwrap_or_else(|| "default".to_string()),
        ]);
    }
    println!("{}", table);
    println!();

    println!("Data directory: {}", report.data_dir);
    println!("Request timeout: {}s", report.request_timeout_secs);
    println!("Report error-only phrases: {}", if report.report_errors { "yes" } else { "no" });
    if !report.simulate {
        output::info(&format!("Simulated provider is off (enable with --simulate or {}=1)", ENV_SIMULATE));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert_eq!(parse_provider("CryptoAPIs").unwrap(), ProviderKind::CryptoApis);
        assert_eq!(parse_provider(" etherscan ").unwrap(), ProviderKind::Etherscan);
        assert!(parse_provider("simulated").is_err());
    }
}
