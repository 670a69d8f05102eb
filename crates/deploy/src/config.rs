//! Configuration loading.
//!
//! Settings are layered with figment: built-in defaults, then `FundMe.toml` (if it exists),
//! then `FUNDME_*` environment variables. The result is resolved once into an immutable
//! [`DeployContext`] that is passed explicitly to everything that needs it.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::network::{
    ChainConfig, DevelopmentChains, HARDHAT_NETWORK, LOCAL_CHAIN_ID, LOCALHOST_NETWORK,
    NetworkConfig, NetworkConfigTable, SEPOLIA_CHAIN_ID, SEPOLIA_NETWORK,
};

/// The default name for the configuration file.
pub const CONFIG_FILENAME: &str = "FundMe.toml";

/// Prefix of the environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "FUNDME_";

/// Default Etherscan API endpoint (multichain v2 API).
pub const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Default decimals of the mock price feed.
pub const DEFAULT_MOCK_DECIMALS: u8 = 8;
/// Default answer of the mock price feed: 2000 USD with 8 decimals.
pub const DEFAULT_MOCK_INITIAL_ANSWER: i64 = 200_000_000_000;

/// A named account, either an index into the node's `eth_accounts` or a fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedAccount {
    Index(usize),
    Address(Address),
}

/// Parameters of the `MockV3Aggregator` deployed on development chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    pub decimals: u8,
    pub initial_answer: i64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_MOCK_DECIMALS,
            initial_answer: DEFAULT_MOCK_INITIAL_ANSWER,
        }
    }
}

/// Block explorer settings. The API key is not part of the file, it comes from the CLI/env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtherscanConfig {
    pub api_url: Url,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_ETHERSCAN_API_URL).expect("default Etherscan URL is valid"),
        }
    }
}

/// Chain parameters as written in the configuration file, keyed by chain id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub name: String,
    pub eth_usd_price_feed: Option<Address>,
}

/// The raw, file-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Network used when none is given on the command line.
    pub default_network: String,
    /// Names of the networks treated as local development chains.
    pub development_chains: Vec<String>,
    /// Directory containing the compiler artifacts.
    pub artifacts: PathBuf,
    /// Directory where deployment records are stored.
    pub deployments: PathBuf,
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Chain parameters keyed by chain id (as a string, TOML keys are strings).
    pub chains: BTreeMap<String, ChainSettings>,
    pub named_accounts: BTreeMap<String, NamedAccount>,
    pub mocks: MockConfig,
    pub etherscan: EtherscanConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let local = || NetworkConfig {
            url: Url::parse("http://127.0.0.1:8545/").ok(),
            chain_id: Some(LOCAL_CHAIN_ID),
            block_confirmations: None,
        };

        Self {
            default_network: HARDHAT_NETWORK.to_string(),
            development_chains: vec![HARDHAT_NETWORK.to_string(), LOCALHOST_NETWORK.to_string()],
            artifacts: PathBuf::from("artifacts"),
            deployments: PathBuf::from("deployments"),
            networks: BTreeMap::from([
                (HARDHAT_NETWORK.to_string(), local()),
                (LOCALHOST_NETWORK.to_string(), local()),
                (
                    SEPOLIA_NETWORK.to_string(),
                    NetworkConfig {
                        url: None,
                        chain_id: Some(SEPOLIA_CHAIN_ID),
                        block_confirmations: Some(3),
                    },
                ),
            ]),
            chains: BTreeMap::from([(
                SEPOLIA_CHAIN_ID.to_string(),
                ChainSettings {
                    name: SEPOLIA_NETWORK.to_string(),
                    eth_usd_price_feed: ChainConfig::default().eth_usd_price_feed,
                },
            )]),
            named_accounts: BTreeMap::from([
                ("deployer".to_string(), NamedAccount::Index(0)),
                ("user".to_string(), NamedAccount::Index(1)),
            ]),
            mocks: MockConfig::default(),
            etherscan: EtherscanConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, the given TOML file (if it exists) and the environment.
    pub fn load(path: &Path) -> Result<Self> {
        Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    /// The layered figment used by [`Settings::load`].
    pub fn figment(path: &Path) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));

        let figment = if path.exists() {
            tracing::debug!(path = %path.display(), "Loading configuration file");
            figment.merge(Toml::file(path))
        } else {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            figment
        };

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Write these settings as TOML. Refuses to overwrite an existing file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Configuration file already exists: {}", path.display());
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;

        Ok(())
    }

    /// Parse the chain table, whose keys must be chain ids.
    pub fn chain_table(&self) -> Result<NetworkConfigTable> {
        let chains = self
            .chains
            .iter()
            .map(|(id, chain)| {
                let chain_id = id
                    .parse::<u64>()
                    .with_context(|| format!("Invalid chain id in [chains]: `{}`", id))?;
                Ok(ChainConfig {
                    chain_id,
                    name: chain.name.clone(),
                    eth_usd_price_feed: chain.eth_usd_price_feed,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(NetworkConfigTable::new(chains))
    }

    /// Resolve the settings for `network` into an immutable [`DeployContext`].
    ///
    /// `rpc_url` overrides the URL of the network and `etherscan_api_key` enables verification.
    pub fn resolve(
        &self,
        network: Option<&str>,
        rpc_url: Option<Url>,
        etherscan_api_key: Option<String>,
    ) -> Result<DeployContext> {
        let name = network.unwrap_or(&self.default_network).to_string();

        let mut network_config = self
            .networks
            .get(&name)
            .cloned()
            .with_context(|| format!("Unknown network `{}`", name))?;

        if let Some(url) = rpc_url {
            network_config.url = Some(url);
        }

        let verification = etherscan_api_key
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| VerificationSettings {
                api_key,
                api_url: self.etherscan.api_url.clone(),
            });

        Ok(DeployContext {
            network: name,
            network_config,
            development_chains: DevelopmentChains::new(self.development_chains.iter().cloned()),
            chains: self.chain_table()?,
            named_accounts: self.named_accounts.clone(),
            mocks: self.mocks,
            artifacts: self.artifacts.clone(),
            deployments: self.deployments.clone(),
            verification,
        })
    }
}

/// Credentials and endpoint for source verification.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationSettings {
    pub api_key: String,
    pub api_url: Url,
}

impl std::fmt::Debug for VerificationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationSettings")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

/// Everything a deployment run needs to know about its environment, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContext {
    /// Name of the selected network.
    pub network: String,
    pub network_config: NetworkConfig,
    pub development_chains: DevelopmentChains,
    pub chains: NetworkConfigTable,
    pub named_accounts: BTreeMap<String, NamedAccount>,
    pub mocks: MockConfig,
    pub artifacts: PathBuf,
    pub deployments: PathBuf,
    /// Present only when an Etherscan API key is configured.
    pub verification: Option<VerificationSettings>,
}

impl DeployContext {
    /// Whether the selected network is a development chain.
    pub fn is_development(&self) -> bool {
        self.development_chains.contains(&self.network)
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.network_config.chain_id
    }

    /// The RPC URL of the selected network.
    pub fn rpc_url(&self) -> Result<&Url> {
        self.network_config
            .url
            .as_ref()
            .with_context(|| format!("No RPC URL configured for network `{}`", self.network))
    }
}
