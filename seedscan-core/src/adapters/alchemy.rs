//! Alchemy JSON-RPC client
//!
//! Calls `eth_getBalance` on `POST {base}/v2/{api_key}`.

use std::time::Duration;

use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::http;
use crate::domain::result::{Error, Result};
use crate::domain::{Asset, ProviderKind};
use crate::ports::{BalanceProvider, Observation};

/// Default production API URL (Ethereum mainnet)
const ALCHEMY_PRODUCTION_URL: &str = "https://eth-mainnet.g.alchemy.com";

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Alchemy balance provider
#[derive(Debug)]
pub struct AlchemyProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AlchemyProvider {
    pub fn new(api_key: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::config("Alchemy API key cannot be empty"));
        }

        Ok(Self {
            client: http::build_client(timeout)?,
            api_key: api_key.to_string(),
            base_url: http::resolve_base_url(ProviderKind::Alchemy, base_url, ALCHEMY_PRODUCTION_URL)?,
            timeout,
        })
    }

    /// Fetch the ETH balance of `address` at the latest block
    pub fn get_balance(&self, address: &str) -> Result<Decimal> {
        let url = format!("{}/v2/{}", self.base_url, self.api_key);
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getBalance",
            "params": [address, "latest"],
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| http::map_request_error(ProviderKind::Alchemy, self.timeout, e))?;

        http::check_response_status(ProviderKind::Alchemy, &response)?;

        let data: RpcResponse = http::read_json(ProviderKind::Alchemy, self.timeout, response)?;
        parse_balance(data)
    }
}

fn parse_balance(data: RpcResponse) -> Result<Decimal> {
    if let Some(error) = data.error {
        return Err(Error::data(format!(
            "Alchemy RPC error {}: {}",
            error.code, error.message
        )));
    }
    let quantity = data
        .result
        .ok_or_else(|| Error::data("Alchemy response has neither result nor error"))?;
    Asset::Eth.parse_hex_subunits(&quantity)
}

impl BalanceProvider for AlchemyProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Alchemy
    }

    fn assets(&self) -> &[Asset] {
        &[Asset::Eth]
    }

    fn fetch_balance(&self, address: &str, asset: Asset) -> Result<Observation> {
        if asset != Asset::Eth {
            return Err(Error::data(format!("Alchemy does not report {}", asset)));
        }
        self.get_balance(address).map(Observation::Balance)
    }
}
