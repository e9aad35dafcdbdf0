//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "providers": {
//!     "etherscan": { "apiKey": "...", "baseUrl": "..." },
//!     "blockstream": { "clientId": "...", "clientSecret": "..." },
//!     ...
//!   },
//!   "scan": { "requestTimeoutSecs": 15, "reportErrors": true, "simulate": false }
//! }
//! ```
//! Credentials can also come from `SEEDSCAN_*` environment variables, which
//! take precedence over the file.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::ProviderKind;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

pub const ENV_ETHERSCAN_API_KEY: &str = "SEEDSCAN_ETHERSCAN_API_KEY";
pub const ENV_BLOCKCYPHER_TOKEN: &str = "SEEDSCAN_BLOCKCYPHER_TOKEN";
pub const ENV_ALCHEMY_API_KEY: &str = "SEEDSCAN_ALCHEMY_API_KEY";
pub const ENV_BLOCKSTREAM_CLIENT_ID: &str = "SEEDSCAN_BLOCKSTREAM_CLIENT_ID";
pub const ENV_BLOCKSTREAM_CLIENT_SECRET: &str = "SEEDSCAN_BLOCKSTREAM_CLIENT_SECRET";
pub const ENV_CRYPTOAPIS_API_KEY: &str = "SEEDSCAN_CRYPTOAPIS_API_KEY";
pub const ENV_SIMULATE: &str = "SEEDSCAN_SIMULATE";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    providers: ProviderSettings,
    #[serde(default)]
    scan: ScanSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderSettings {
    #[serde(default)]
    etherscan: KeyedProvider,
    #[serde(default)]
    blockcypher: TokenProvider,
    #[serde(default)]
    alchemy: KeyedProvider,
    #[serde(default)]
    blockstream: BlockstreamProvider,
    #[serde(default)]
    cryptoapis: KeyedProvider,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyedProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockstreamProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanSettings {
    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_true")]
    report_errors: bool,
    #[serde(default)]
    simulate: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            report_errors: true,
            simulate: false,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

/// Client id and secret for Blockstream's client-credentials grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockstreamCredential {
    pub client_id: String,
    pub client_secret: String,
}

/// Optional per-provider API keys/secrets. A provider is queried iff its entry is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub etherscan: Option<String>,
    pub blockcypher: Option<String>,
    pub alchemy: Option<String>,
    pub blockstream: Option<BlockstreamCredential>,
    pub cryptoapis: Option<String>,
}

impl Credentials {
    pub fn is_enabled(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Etherscan => self.etherscan.is_some(),
            ProviderKind::BlockCypher => self.blockcypher.is_some(),
            ProviderKind::Alchemy => self.alchemy.is_some(),
            ProviderKind::Blockstream => self.blockstream.is_some(),
            ProviderKind::CryptoApis => self.cryptoapis.is_some(),
            ProviderKind::Simulated => false,
        }
    }

    /// Blank and whitespace-only secrets count as absent; the rest are trimmed.
    /// A Blockstream credential needs both halves.
    pub fn normalized(self) -> Self {
        let blockstream = self.blockstream.and_then(|b| {
            Some(BlockstreamCredential {
                client_id: non_empty(Some(b.client_id))?,
                client_secret: non_empty(Some(b.client_secret))?,
            })
        });
        Self {
            etherscan: non_empty(self.etherscan),
            blockcypher: non_empty(self.blockcypher),
            alchemy: non_empty(self.alchemy),
            blockstream,
            cryptoapis: non_empty(self.cryptoapis),
        }
    }

    /// Masked form of the credential for display, None when absent
    pub fn masked(&self, kind: ProviderKind) -> Option<String> {
        let secret = match kind {
            ProviderKind::Etherscan => self.etherscan.as_deref(),
            ProviderKind::BlockCypher => self.blockcypher.as_deref(),
            ProviderKind::Alchemy => self.alchemy.as_deref(),
            ProviderKind::Blockstream => self.blockstream.as_ref().map(|c| c.client_id.as_str()),
            ProviderKind::CryptoApis => self.cryptoapis.as_deref(),
            ProviderKind::Simulated => None,
        }?;
        Some(mask_secret(secret))
    }
}

/// Base URL overrides, mostly for pointing providers at a mock server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub etherscan: Option<String>,
    pub blockcypher: Option<String>,
    pub alchemy: Option<String>,
    pub blockstream: Option<String>,
    pub blockstream_auth: Option<String>,
    pub cryptoapis: Option<String>,
}

impl Endpoints {
    /// Point every provider at the same host
    pub fn all(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            etherscan: Some(base.to_string()),
            blockcypher: Some(base.to_string()),
            alchemy: Some(base.to_string()),
            blockstream: Some(base.to_string()),
            blockstream_auth: Some(format!("{}/oauth/token", base)),
            cryptoapis: Some(base.to_string()),
        }
    }

    /// Base URL override for `kind`, if any
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Etherscan => self.etherscan.as_deref(),
            ProviderKind::BlockCypher => self.blockcypher.as_deref(),
            ProviderKind::Alchemy => self.alchemy.as_deref(),
            ProviderKind::Blockstream => self.blockstream.as_deref(),
            ProviderKind::CryptoApis => self.cryptoapis.as_deref(),
            ProviderKind::Simulated => None,
        }
    }
}

/// seedscan configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
    /// Surface phrases whose only signal is a provider error
    pub report_errors: bool,
    /// Add the simulated provider to every scan
    pub simulate: bool,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_credentials(Credentials::default())
    }
}

impl Config {
    /// Configuration with the given credentials and defaults for everything else
    pub fn from_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: credentials.normalized(),
            endpoints: Endpoints::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            report_errors: true,
            simulate: false,
            _raw_settings: SettingsFile::default(),
        }
    }

    /// Load config from the data directory, applying environment overrides
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_env(data_dir, |key| std::env::var(key).ok())
    }

    /// Load config using `env` to look up override variables
    pub fn load_with_env<F>(data_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let env = |key: &str| non_empty(env(key));
        let p = &raw.providers;

        let blockstream_id = env(ENV_BLOCKSTREAM_CLIENT_ID).or_else(|| non_empty(p.blockstream.client_id.clone()));
        let blockstream_secret =
            env(ENV_BLOCKSTREAM_CLIENT_SECRET).or_else(|| non_empty(p.blockstream.client_secret.clone()));

        let credentials = Credentials {
            etherscan: env(ENV_ETHERSCAN_API_KEY).or_else(|| non_empty(p.etherscan.api_key.clone())),
            blockcypher: env(ENV_BLOCKCYPHER_TOKEN).or_else(|| non_empty(p.blockcypher.token.clone())),
            alchemy: env(ENV_ALCHEMY_API_KEY).or_else(|| non_empty(p.alchemy.api_key.clone())),
            blockstream: match (blockstream_id, blockstream_secret) {
                (Some(client_id), Some(client_secret)) => Some(BlockstreamCredential {
                    client_id,
                    client_secret,
                }),
                _ => None,
            },
            cryptoapis: env(ENV_CRYPTOAPIS_API_KEY).or_else(|| non_empty(p.cryptoapis.api_key.clone())),
        };

        let endpoints = Endpoints {
            etherscan: non_empty(p.etherscan.base_url.clone()),
            blockcypher: non_empty(p.blockcypher.base_url.clone()),
            alchemy: non_empty(p.alchemy.base_url.clone()),
            blockstream: non_empty(p.blockstream.base_url.clone()),
            blockstream_auth: non_empty(p.blockstream.auth_url.clone()),
            cryptoapis: non_empty(p.cryptoapis.base_url.clone()),
        };

        let simulate = match env(ENV_SIMULATE).as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.scan.simulate,
        };

        Ok(Self {
            credentials,
            endpoints,
            request_timeout: Duration::from_secs(raw.scan.request_timeout_secs.max(1)),
            report_errors: raw.scan.report_errors,
            simulate,
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory
    /// Preserves settings this struct doesn't manage. Secrets that came from
    /// the environment are written too, so only call this on explicit request.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            self._raw_settings.clone()
        };

        let c = &self.credentials;
        let e = &self.endpoints;
        let p = &mut settings.providers;
        p.etherscan = KeyedProvider {
            api_key: c.etherscan.clone(),
            base_url: e.etherscan.clone(),
        };
        p.blockcypher = TokenProvider {
            token: c.blockcypher.clone(),
            base_url: e.blockcypher.clone(),
        };
        p.alchemy = KeyedProvider {
            api_key: c.alchemy.clone(),
            base_url: e.alchemy.clone(),
        };
        p.blockstream = BlockstreamProvider {
            client_id: c.blockstream.as_ref().map(|b| b.client_id.clone()),
            client_secret: c.blockstream.as_ref().map(|b| b.client_secret.clone()),
            base_url: e.blockstream.clone(),
            auth_url: e.blockstream_auth.clone(),
        };
        p.cryptoapis = KeyedProvider {
            api_key: c.cryptoapis.clone(),
            base_url: e.cryptoapis.clone(),
        };
        settings.scan = ScanSettings {
            request_timeout_secs: self.request_timeout.as_secs(),
            report_errors: self.report_errors,
            simulate: self.simulate,
        };

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Set the credential of `kind`; `None` or a blank value removes it.
    /// Blockstream takes its client id as `key` and needs `secret` as well.
    pub fn set_credential(&mut self, kind: ProviderKind, key: Option<String>, secret: Option<String>) -> Result<()> {
        let key = non_empty(key);
        let c = &mut self.credentials;
        match kind {
            ProviderKind::Etherscan => c.etherscan = key,
            ProviderKind::BlockCypher => c.blockcypher = key,
            ProviderKind::Alchemy => c.alchemy = key,
            ProviderKind::CryptoApis => c.cryptoapis = key,
            ProviderKind::Blockstream => {
                c.blockstream = match (key, non_empty(secret)) {
                    (Some(client_id), Some(client_secret)) => Some(BlockstreamCredential {
                        client_id,
                        client_secret,
                    }),
                    (None, _) => None,
                    (Some(_), None) => {
                        return Err(Error::config("Blockstream needs both a client id and a client secret"))
                    }
                }
            }
            ProviderKind::Simulated => return Err(Error::config("The simulated provider takes no credential")),
        }
        Ok(())
    }

    /// Override or reset (`None`) the base URL of `kind`
    pub fn set_endpoint(&mut self, kind: ProviderKind, base_url: Option<String>) -> Result<()> {
        let base_url = non_empty(base_url);
        let e = &mut self.endpoints;
        match kind {
            ProviderKind::Etherscan => e.etherscan = base_url,
            ProviderKind::BlockCypher => e.blockcypher = base_url,
            ProviderKind::Alchemy => e.alchemy = base_url,
            ProviderKind::Blockstream => e.blockstream = base_url,
            ProviderKind::CryptoApis => e.cryptoapis = base_url,
            ProviderKind::Simulated => return Err(Error::config("The simulated provider has no endpoint")),
        }
        Ok(())
    }

    /// Providers that will actually be queried, in aggregation order
    pub fn enabled_providers(&self) -> Vec<ProviderKind> {
        let mut enabled: Vec<ProviderKind> = ProviderKind::REAL
            .iter()
            .copied()
            .filter(|k| self.credentials.is_enabled(*k))
            .collect();
        if self.simulate {
            enabled.push(ProviderKind::Simulated);
        }
        enabled
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        "****".to_string()
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}
