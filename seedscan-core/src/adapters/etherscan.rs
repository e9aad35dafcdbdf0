//! Etherscan API client
//!
//! Looks up the ETH balance of an address through the Etherscan v2 account
//! module: `GET /v2/api?chainid=1&module=account&action=balance`.

use std::time::Duration;

use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::http;
use crate::domain::result::{Error, Result};
use crate::domain::{Asset, ProviderKind};
use crate::ports::{BalanceProvider, Observation};

/// Default production API URL
const ETHERSCAN_PRODUCTION_URL: &str = "https://api.etherscan.io";

/// Etherscan answers with strings throughout; `status` is "1" on success
#[derive(Debug, Deserialize)]
struct BalanceResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

/// Etherscan balance provider
#[derive(Debug)]
pub struct EtherscanProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl EtherscanProvider {
    pub fn new(api_key: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::config("Etherscan API key cannot be empty"));
        }

        Ok(Self {
            client: http::build_client(timeout)?,
            api_key: api_key.to_string(),
            base_url: http::resolve_base_url(ProviderKind::Etherscan, base_url, ETHERSCAN_PRODUCTION_URL)?,
            timeout,
        })
    }

    /// Fetch the ETH balance of `address`
    pub fn get_balance(&self, address: &str) -> Result<Decimal> {
        let url = format!("{}/v2/api", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("chainid", "1"),
                ("module", "account"),
                ("action", "balance"),
                ("address", address),
                ("tag", "latest"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .map_err(|e| http::map_request_error(ProviderKind::Etherscan, self.timeout, e))?;

        http::check_response_status(ProviderKind::Etherscan, &response)?;

        let data: BalanceResponse = http::read_json(ProviderKind::Etherscan, self.timeout, response)?;
        parse_balance(data)
    }
}

fn parse_balance(data: BalanceResponse) -> Result<Decimal> {
    if data.status != "1" {
        return Err(Error::data(format!(
            "Etherscan returned status {}: {} ({})",
            data.status, data.message, data.result
        )));
    }
    Asset::Eth.parse_subunits(&data.result)
}

impl BalanceProvider for EtherscanProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Etherscan
    }

    fn assets(&self) -> &[Asset] {
        &[Asset::Eth]
    }

    fn fetch_balance(&self, address: &str, asset: Asset) -> Result<Observation> {
        if asset != Asset::Eth {
            return Err(Error::data(format!("Etherscan does not report {}", asset)));
        }
        self.get_balance(address).map(Observation::Balance)
    }
}
