//! Assets the providers can report on

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// A coin whose balance can be observed on an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Eth,
    Btc,
    Ltc,
    Doge,
    Dash,
}

impl Asset {
    pub const ALL: [Asset; 5] = [Asset::Btc, Asset::Eth, Asset::Ltc, Asset::Doge, Asset::Dash];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Eth => "ETH",
            Asset::Btc => "BTC",
            Asset::Ltc => "LTC",
            Asset::Doge => "DOGE",
            Asset::Dash => "DASH",
        }
    }

    /// Number of decimal places between the native subunit and one whole coin
    /// (wei for ETH, satoshi-style units for the rest)
    pub fn decimals(&self) -> u32 {
        match self {
            Asset::Eth => 18,
            Asset::Btc | Asset::Ltc | Asset::Doge | Asset::Dash => 8,
        }
    }

    /// Convert an integer amount of subunits into whole coins
    pub fn from_subunits(&self, subunits: u128) -> Result<Decimal> {
        let value = i128::try_from(subunits)
            .map_err(|_| Error::data(format!("{} amount out of range: {}", self, subunits)))?;
        Decimal::try_from_i128_with_scale(value, self.decimals())
            .map(|d| d.normalize())
            .map_err(|e| Error::data(format!("{} amount out of range: {}", self, e)))
    }

    /// Parse a decimal subunit string such as an Etherscan `result` field
    pub fn parse_subunits(&self, raw: &str) -> Result<Decimal> {
        let subunits = raw
            .trim()
            .parse::<u128>()
            .map_err(|e| Error::data(format!("invalid {} amount '{}': {}", self, raw, e)))?;
        self.from_subunits(subunits)
    }

    /// Parse a `0x`-prefixed hex subunit string (JSON-RPC quantities)
    pub fn parse_hex_subunits(&self, raw: &str) -> Result<Decimal> {
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| Error::data(format!("expected hex quantity, got '{}'", raw)))?;
        if digits.is_empty() {
            return Err(Error::data("empty hex quantity"));
        }
        let subunits = u128::from_str_radix(digits, 16)
            .map_err(|e| Error::data(format!("invalid hex quantity '{}': {}", raw, e)))?;
        self.from_subunits(subunits)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
