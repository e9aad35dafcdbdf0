//! BlockCypher API client
//!
//! BlockCypher serves several chains behind one token, so one address is
//! looked up once per coin: `GET /v1/{coin}/main/addrs/{address}/balance`.
//! Each coin is an independent request; one failing does not affect the others.
//!
//! An Ethereum-format address is not valid on the UTXO chains. BlockCypher
//! says so with a client error, which is reported as a real zero balance.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::http;
use crate::domain::result::{Error, Result};
use crate::domain::{Asset, ProviderKind};
use crate::ports::{BalanceProvider, Observation};

/// Default production API URL
const BLOCKCYPHER_PRODUCTION_URL: &str = "https://api.blockcypher.com";

/// Balance endpoint response. Amounts are integer subunits; ETH balances can
/// exceed u64 so they are read as u128.
#[derive(Debug, Deserialize)]
struct AddressBalance {
    #[serde(default)]
    balance: Option<u128>,
    #[serde(default)]
    final_balance: Option<u128>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
}

/// BlockCypher multi-coin balance provider
#[derive(Debug)]
pub struct BlockCypherProvider {
    client: Client,
    token: String,
    base_url: String,
    timeout: Duration,
}

impl BlockCypherProvider {
    pub fn new(token: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::config("BlockCypher token cannot be empty"));
        }

        Ok(Self {
            client: http::build_client(timeout)?,
            token: token.to_string(),
            base_url: http::resolve_base_url(ProviderKind::BlockCypher, base_url, BLOCKCYPHER_PRODUCTION_URL)?,
            timeout,
        })
    }

    /// Fetch the balance of `address` on the chain of `asset`
    pub fn get_balance(&self, address: &str, asset: Asset) -> Result<Observation> {
        let url = format!(
            "{}/v1/{}/main/addrs/{}/balance",
            self.base_url,
            coin_path(asset),
            normalize_address(address, asset)
        );

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .map_err(|e| http::map_request_error(ProviderKind::BlockCypher, self.timeout, e))?;

        let status = response.status();
        if status.is_client_error() && !matches!(status.as_u16(), 401 | 403 | 429) {
            let body = response
                .text()
                .map_err(|e| http::map_request_error(ProviderKind::BlockCypher, self.timeout, e))?;
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            if http::mentions_invalid_address(&message) {
                return Ok(Observation::InvalidAddress);
            }
            return Err(Error::transport(format!(
                "BlockCypher API error: HTTP {} ({})",
                status.as_u16(),
                message.trim()
            )));
        }

        http::check_response_status(ProviderKind::BlockCypher, &response)?;

        let data: AddressBalance = http::read_json(ProviderKind::BlockCypher, self.timeout, response)?;
        parse_balance(data, asset).map(Observation::Balance)
    }
}

fn parse_balance(data: AddressBalance, asset: Asset) -> Result<rust_decimal::Decimal> {
    let subunits = data
        .final_balance
        .or(data.balance)
        .ok_or_else(|| Error::data(format!("BlockCypher {} response has no balance", asset)))?;
    asset.from_subunits(subunits)
}

/// Chain segment of the URL
fn coin_path(asset: Asset) -> &'static str {
    match asset {
        Asset::Btc => "btc",
        Asset::Eth => "eth",
        Asset::Ltc => "ltc",
        Asset::Doge => "doge",
        Asset::Dash => "dash",
    }
}

/// BlockCypher's ETH endpoints take the hex address without the 0x prefix
fn normalize_address(address: &str, asset: Asset) -> String {
    match asset {
        Asset::Eth => address
            .strip_prefix("0x")
            .unwrap_or(address)
            .to_lowercase(),
        _ => address.to_string(),
    }
}

impl BalanceProvider for BlockCypherProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::BlockCypher
    }

    fn assets(&self) -> &[Asset] {
        &Asset::ALL
    }

    fn fetch_balance(&self, address: &str, asset: Asset) -> Result<Observation> {
        self.get_balance(address, asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_reject_empty_token() {
        assert!(BlockCypherProvider::new("", None, Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_covers_all_assets() {
        let provider = BlockCypherProvider::new("tok", None, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.assets().len(), 5);
        assert!(provider.assets().contains(&Asset::Dash));
    }

    #[test]
    fn test_eth_address_normalization() {
        assert_eq!(
            normalize_address("0x9858EfFD232B4033E47d90003D41EC34EcaEda94", Asset::Eth),
            "9858effd232b4033e47d90003d41ec34ecaeda94"
        );
        assert_eq!(normalize_address("bc1qxyz", Asset::Btc), "bc1qxyz");
    }

    #[test]
    fn test_parse_prefers_final_balance() {
        let data: AddressBalance =
            serde_json::from_str(r#"{"address":"x","balance":100,"final_balance":250000000}"#).unwrap();
        assert_eq!(parse_balance(data, Asset::Ltc).unwrap(), Decimal::new(25, 1));
    }

    #[test]
    fn test_parse_large_wei_balance() {
        // 50 ETH does not fit in a u64 number of wei
        let data: AddressBalance =
            serde_json::from_str(r#"{"final_balance":50000000000000000000}"#).unwrap();
        assert_eq!(parse_balance(data, Asset::Eth).unwrap(), Decimal::new(50, 0));
    }

    #[test]
    fn test_parse_missing_balance_is_data_error() {
        let data: AddressBalance = serde_json::from_str(r#"{"address":"x"}"#).unwrap();
        assert!(matches!(parse_balance(data, Asset::Btc), Err(Error::ProviderData(_))));
    }
}
