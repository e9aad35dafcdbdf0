//! Blockstream Esplora API client
//!
//! The enterprise Esplora endpoint sits behind an OAuth2 client-credentials
//! grant. The bearer token is fetched on first use and reused until shortly
//! before it expires.
//!
//! Esplora only serves Bitcoin, so the Ethereum-format addresses this tool
//! derives are rejected with `400 Invalid Bitcoin address`. That answer is a
//! genuine zero balance, not a failure.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::http;
use crate::config::BlockstreamCredential;
use crate::domain::result::{Error, Result};
use crate::domain::{Asset, ProviderKind};
use crate::ports::{BalanceProvider, Observation};

/// Default production API URL
const BLOCKSTREAM_PRODUCTION_URL: &str = "https://enterprise.blockstream.info";

/// Default token endpoint
const BLOCKSTREAM_AUTH_URL: &str =
    "https://login.blockstream.com/realms/blockstream-public/protocol/openid-connect/token";

/// Refresh this long before the advertised expiry
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    300
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    chain_stats: ChainStats,
}

#[derive(Debug, Deserialize)]
struct ChainStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Blockstream Bitcoin balance provider
#[derive(Debug)]
pub struct BlockstreamProvider {
    client: Client,
    credential: BlockstreamCredential,
    base_url: String,
    auth_url: String,
    timeout: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl BlockstreamProvider {
    pub fn new(
        credential: &BlockstreamCredential,
        base_url: Option<&str>,
        auth_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        if credential.client_id.is_empty() || credential.client_secret.is_empty() {
            return Err(Error::config("Blockstream client id and secret cannot be empty"));
        }

        Ok(Self {
            client: http::build_client(timeout)?,
            credential: credential.clone(),
            base_url: http::resolve_base_url(ProviderKind::Blockstream, base_url, BLOCKSTREAM_PRODUCTION_URL)?,
            auth_url: http::resolve_base_url(ProviderKind::Blockstream, auth_url, BLOCKSTREAM_AUTH_URL)?,
            timeout,
            token: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, requesting a new one if needed
    fn access_token(&self) -> Result<String> {
        let mut cached = self
            .token
            .lock()
            .map_err(|_| Error::Other("Blockstream token cache poisoned".to_string()))?;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .client
            .post(&self.auth_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credential.client_id.as_str()),
                ("client_secret", self.credential.client_secret.as_str()),
                ("scope", "openid"),
            ])
            .send()
            .map_err(|e| http::map_request_error(ProviderKind::Blockstream, self.timeout, e))?;

        http::check_response_status(ProviderKind::Blockstream, &response)?;

        let data: TokenResponse = http::read_json(ProviderKind::Blockstream, self.timeout, response)?;
        let lifetime = Duration::from_secs(data.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: data.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(data.access_token)
    }

    /// Fetch the confirmed BTC balance of `address`
    pub fn get_balance(&self, address: &str) -> Result<Observation> {
        let token = self.access_token()?;
        let url = format!("{}/api/address/{}", self.base_url, address);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .map_err(|e| http::map_request_error(ProviderKind::Blockstream, self.timeout, e))?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response
                .text()
                .map_err(|e| http::map_request_error(ProviderKind::Blockstream, self.timeout, e))?;
            if http::mentions_invalid_address(&body) {
                return Ok(Observation::InvalidAddress);
            }
            return Err(Error::transport(format!(
                "Blockstream API error: HTTP 400 ({})",
                body.trim()
            )));
        }

        http::check_response_status(ProviderKind::Blockstream, &response)?;

        let data: AddressInfo = http::read_json(ProviderKind::Blockstream, self.timeout, response)?;
        parse_balance(data).map(Observation::Balance)
    }
}

fn parse_balance(data: AddressInfo) -> Result<Decimal> {
    let stats = data.chain_stats;
    let sats = stats.funded_txo_sum.checked_sub(stats.spent_txo_sum).ok_or_else(|| {
        Error::data(format!(
            "Blockstream reports more spent ({}) than funded ({})",
            stats.spent_txo_sum, stats.funded_txo_sum
        ))
    })?;
    Asset::Btc.from_subunits(u128::from(sats))
}

impl BalanceProvider for BlockstreamProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Blockstream
    }

    fn assets(&self) -> &[Asset] {
        &[Asset::Btc]
    }

    fn fetch_balance(&self, address: &str, asset: Asset) -> Result<Observation> {
        if asset != Asset::Btc {
            return Err(Error::data(format!("Blockstream does not report {}", asset)));
        }
        self.get_balance(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(id: &str, secret: &str) -> BlockstreamCredential {
        BlockstreamCredential {
            client_id: id.to_string(),
            client_secret: secret.to_string(),
        }
    }

    #[test]
    fn test_reject_partial_credential() {
        let result = BlockstreamProvider::new(&credential("id", ""), None, None, Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_balance_is_funded_minus_spent() {
        let data: AddressInfo = serde_json::from_str(
            r#"{
                "address": "bc1q...",
                "chain_stats": {"funded_txo_sum": 300000000, "spent_txo_sum": 50000000, "tx_count": 3},
                "mempool_stats": {"funded_txo_sum": 0, "spent_txo_sum": 0, "tx_count": 0}
            }"#,
        )
        .unwrap();
        assert_eq!(parse_balance(data).unwrap(), Decimal::new(25, 1));
    }

    #[test]
    fn test_overspent_is_data_error() {
        let data = AddressInfo {
            chain_stats: ChainStats {
                funded_txo_sum: 1,
                spent_txo_sum: 2,
            },
        };
        assert!(matches!(parse_balance(data), Err(Error::ProviderData(_))));
    }

    #[test]
    fn test_token_response_defaults_expiry() {
        let data: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(data.expires_in, 300);
    }
}
