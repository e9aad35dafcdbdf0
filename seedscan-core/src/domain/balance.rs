//! Balance observation domain model

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::asset::Asset;

/// Balance data providers known to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Etherscan,
    BlockCypher,
    Alchemy,
    Blockstream,
    #[serde(rename = "cryptoapis")]
    CryptoApis,
    Simulated,
}

impl ProviderKind {
    /// Providers that talk to a real API, in aggregation order
    pub const REAL: [ProviderKind; 5] = [
        ProviderKind::Etherscan,
        ProviderKind::BlockCypher,
        ProviderKind::Alchemy,
        ProviderKind::Blockstream,
        ProviderKind::CryptoApis,
    ];

    /// Name reported as the `source` of a record
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Etherscan => "Etherscan API",
            ProviderKind::BlockCypher => "BlockCypher API",
            ProviderKind::Alchemy => "Alchemy API",
            ProviderKind::Blockstream => "Blockstream API",
            ProviderKind::CryptoApis => "CryptoAPIs.io",
            ProviderKind::Simulated => "Simulated",
        }
    }

    /// Short key used in settings and logs
    pub fn key(&self) -> &'static str {
        match self {
            ProviderKind::Etherscan => "etherscan",
            ProviderKind::BlockCypher => "blockcypher",
            ProviderKind::Alchemy => "alchemy",
            ProviderKind::Blockstream => "blockstream",
            ProviderKind::CryptoApis => "cryptoapis",
            ProviderKind::Simulated => "simulated",
        }
    }

    /// Asset used for the placeholder record when the provider is not configured
    pub fn primary_asset(&self) -> Asset {
        match self {
            ProviderKind::Blockstream => Asset::Btc,
            _ => Asset::Eth,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, ProviderKind::Simulated)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Provenance of a balance record
///
/// Serialized as a plain string: a provider display name, `Error`, `N/A` or `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceSource {
    /// Observed by a provider
    Provider(ProviderKind),
    /// The provider call failed (transport, status or parse)
    Error,
    /// The provider was not queried because it has no credential
    NotQueried,
    /// Provenance was lost (the provider call aborted abnormally)
    Unknown,
}

impl BalanceSource {
    /// Whether this source carries an actual observation rather than a marker
    pub fn is_observation(&self) -> bool {
        matches!(self, BalanceSource::Provider(_))
    }
}

impl fmt::Display for BalanceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceSource::Provider(kind) => f.write_str(kind.display_name()),
            BalanceSource::Error => f.write_str("Error"),
            BalanceSource::NotQueried => f.write_str("N/A"),
            BalanceSource::Unknown => f.write_str("Unknown"),
        }
    }
}

impl FromStr for BalanceSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Error" => Ok(BalanceSource::Error),
            "N/A" => Ok(BalanceSource::NotQueried),
            "Unknown" => Ok(BalanceSource::Unknown),
            other => ProviderKind::REAL
                .iter()
                .chain(std::iter::once(&ProviderKind::Simulated))
                .find(|k| k.display_name() == other)
                .map(|k| BalanceSource::Provider(*k))
                .ok_or_else(|| format!("unknown balance source: {}", other)),
        }
    }
}

impl Serialize for BalanceSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BalanceSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One observation of one asset on one address by one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRecord {
    pub currency: Asset,
    pub amount: Decimal,
    pub source: BalanceSource,
    /// False for simulated values and for failure/absence markers
    pub is_real: bool,
}

impl BalanceRecord {
    /// A value reported by a provider. Simulated providers never produce real records.
    pub fn observed(provider: ProviderKind, currency: Asset, amount: Decimal) -> Self {
        Self {
            currency,
            amount,
            source: BalanceSource::Provider(provider),
            is_real: !provider.is_simulated(),
        }
    }

    /// The provider call for this asset failed
    pub fn failed(currency: Asset) -> Self {
        Self::marker(currency, BalanceSource::Error)
    }

    /// The provider was skipped for lack of a credential
    pub fn not_queried(currency: Asset) -> Self {
        Self::marker(currency, BalanceSource::NotQueried)
    }

    /// The provider call ended without a usable outcome
    pub fn unknown(currency: Asset) -> Self {
        Self::marker(currency, BalanceSource::Unknown)
    }

    fn marker(currency: Asset, source: BalanceSource) -> Self {
        Self {
            currency,
            amount: Decimal::ZERO,
            source,
            is_real: false,
        }
    }

    /// Real, positive, and sourced from an actual observation
    pub fn is_positive_real(&self) -> bool {
        self.is_real && self.amount > Decimal::ZERO && self.source.is_observation()
    }

    pub fn is_error(&self) -> bool {
        self.source == BalanceSource::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_record() {
        let record = BalanceRecord::observed(ProviderKind::Etherscan, Asset::Eth, Decimal::ONE);
        assert!(record.is_real);
        assert!(record.is_positive_real());
        assert_eq!(record.source.to_string(), "Etherscan API");
    }

    #[test]
    fn test_simulated_record_is_never_real() {
        let record =
            BalanceRecord::observed(ProviderKind::Simulated, Asset::Btc, Decimal::new(5, 1));
        assert!(!record.is_real);
        assert!(!record.is_positive_real());
    }

    #[test]
    fn test_markers_are_not_real() {
        for record in [
            BalanceRecord::failed(Asset::Eth),
            BalanceRecord::not_queried(Asset::Eth),
            BalanceRecord::unknown(Asset::Btc),
        ] {
            assert!(!record.is_real);
            assert_eq!(record.amount, Decimal::ZERO);
            assert!(!record.is_positive_real());
        }
        assert!(BalanceRecord::failed(Asset::Eth).is_error());
        assert!(!BalanceRecord::not_queried(Asset::Eth).is_error());
    }

    #[test]
    fn test_real_marker_never_counts_as_positive() {
        // Hand-built record violating the constructor invariant
        let forged = BalanceRecord {
            currency: Asset::Eth,
            amount: Decimal::ONE,
            source: BalanceSource::Error,
            is_real: true,
        };
        assert!(!forged.is_positive_real());
    }

    #[test]
    fn test_source_serialization() {
        let record = BalanceRecord::not_queried(Asset::Eth);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "N/A");
        assert_eq!(json["currency"], "ETH");
        assert_eq!(json["isReal"], false);

        let parsed: BalanceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            "CryptoAPIs.io".parse::<BalanceSource>().unwrap(),
            BalanceSource::Provider(ProviderKind::CryptoApis)
        );
        assert_eq!("Unknown".parse::<BalanceSource>().unwrap(), BalanceSource::Unknown);
        assert!("Somebody".parse::<BalanceSource>().is_err());
    }
}
