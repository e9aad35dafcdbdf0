//! CryptoAPIs.io client
//!
//! `GET /blockchain-data/ethereum/mainnet/addresses/{address}/balance` with the
//! key in the `X-API-Key` header. Amounts come back as decimal strings already
//! expressed in whole coins.

use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::http;
use crate::domain::result::{Error, Result};
use crate::domain::{Asset, ProviderKind};
use crate::ports::{BalanceProvider, Observation};

/// Default production API URL
const CRYPTOAPIS_PRODUCTION_URL: &str = "https://rest.cryptoapis.io";

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    data: BalanceData,
}

#[derive(Debug, Deserialize)]
struct BalanceData {
    item: BalanceItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceItem {
    confirmed_balance: Amount,
}

#[derive(Debug, Deserialize)]
struct Amount {
    amount: String,
    #[serde(default)]
    unit: Option<String>,
}

/// CryptoAPIs.io balance provider
#[derive(Debug)]
pub struct CryptoApisProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl CryptoApisProvider {
    pub fn new(api_key: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::config("CryptoAPIs.io API key cannot be empty"));
        }

        Ok(Self {
            client: http::build_client(timeout)?,
            api_key: api_key.to_string(),
            base_url: http::resolve_base_url(ProviderKind::CryptoApis, base_url, CRYPTOAPIS_PRODUCTION_URL)?,
            timeout,
        })
    }

    /// Fetch the confirmed ETH balance of `address`
    pub fn get_balance(&self, address: &str) -> Result<Decimal> {
        let url = format!(
            "{}/blockchain-data/ethereum/mainnet/addresses/{}/balance",
            self.base_url, address
        );

        let response = self
            .client
            .get(&url)
            .header("X-API-Key", self.api_key.as_str())
            .header("Content-Type", "application/json")
            .send()
            .map_err(|e| http::map_request_error(ProviderKind::CryptoApis, self.timeout, e))?;

        http::check_response_status(ProviderKind::CryptoApis, &response)?;

        let data: BalanceResponse = http::read_json(ProviderKind::CryptoApis, self.timeout, response)?;
        parse_balance(data)
    }
}

fn parse_balance(data: BalanceResponse) -> Result<Decimal> {
    let balance = data.data.item.confirmed_balance;
    if let Some(unit) = balance.unit.as_deref() {
        if !unit.eq_ignore_ascii_case(Asset::Eth.symbol()) {
            return Err(Error::data(format!("CryptoAPIs.io reported unexpected unit '{}'", unit)));
        }
    }
    let amount = Decimal::from_str(balance.amount.trim())
        .map_err(|e| Error::data(format!("invalid CryptoAPIs.io amount '{}': {}", balance.amount, e)))?;
    if amount.is_sign_negative() {
        return Err(Error::data(format!("negative CryptoAPIs.io amount '{}'", balance.amount)));
    }
    Ok(amount.normalize())
}

impl BalanceProvider for CryptoApisProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CryptoApis
    }

    fn assets(&self) -> &[Asset] {
        &[Asset::Eth]
    }

    fn fetch_balance(&self, address: &str, asset: Asset) -> Result<Observation> {
        if asset != Asset::Eth {
            return Err(Error::data(format!("CryptoAPIs.io does not report {}", asset)));
        }
        self.get_balance(address).map(Observation::Balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Decimal> {
        parse_balance(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_parse_confirmed_balance() {
        let amount = parse(
            r#"{
                "apiVersion": "2023-04-25",
                "requestId": "601c1710034ed6d407996b30",
                "data": {"item": {"confirmedBalance": {"amount": "0.2500", "unit": "ETH"}}}
            }"#,
        )
        .unwrap();
        assert_eq!(amount, Decimal::new(25, 2));
        assert_eq!(amount.to_string(), "0.25");
    }

    #[test]
    fn test_wrong_unit_is_data_error() {
        let err = parse(r#"{"data": {"item": {"confirmedBalance": {"amount": "1", "unit": "BTC"}}}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::ProviderData(_)));
    }

    #[test]
    fn test_garbage_amount_is_data_error() {
        assert!(parse(r#"{"data": {"item": {"confirmedBalance": {"amount": "lots"}}}}"#).is_err());
        assert!(parse(r#"{"data": {"item": {"confirmedBalance": {"amount": "-1"}}}}"#).is_err());
    }

    #[test]
    fn test_missing_item_fails_to_decode() {
        assert!(serde_json::from_str::<BalanceResponse>(r#"{"data": {}}"#).is_err());
    }
}
