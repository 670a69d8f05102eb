//! Network classification and per-chain parameters.

use std::collections::{BTreeMap, BTreeSet};

use alloy_core::primitives::Address;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::DeployError;

/// Names of the networks created by the default configuration.
pub const HARDHAT_NETWORK: &str = "hardhat";
pub const LOCALHOST_NETWORK: &str = "localhost";
pub const SEPOLIA_NETWORK: &str = "sepolia";

/// Chain id of Sepolia.
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
/// Chain id used by local hardhat/anvil nodes.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Chainlink ETH/USD price feed on Sepolia.
pub const SEPOLIA_ETH_USD_PRICE_FEED: Address =
    alloy_core::primitives::address!("694AA1769357215DE4FAC081bf1f309aDC325306");

/// Confirmations waited for when a network does not configure its own.
pub const DEFAULT_BLOCK_CONFIRMATIONS: u64 = 1;

/// Connection parameters for a named network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint of the node.
    pub url: Option<Url>,
    /// Chain id reported by the network.
    pub chain_id: Option<u64>,
    /// Number of blocks to wait for after a deployment transaction is mined.
    pub block_confirmations: Option<u64>,
}

impl NetworkConfig {
    /// Confirmations to wait for, falling back to [`DEFAULT_BLOCK_CONFIRMATIONS`].
    pub fn confirmations(&self) -> u64 {
        self.block_confirmations.unwrap_or(DEFAULT_BLOCK_CONFIRMATIONS)
    }
}

/// Chain-specific parameters of a public network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub eth_usd_price_feed: Option<Address>,
}

/// Networks treated as local and ephemeral.
///
/// Development networks use mocks instead of external contracts and are never verified.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct DevelopmentChains(BTreeSet<String>);

impl DevelopmentChains {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Whether `network` is a development network.
    pub fn contains(&self, network: &str) -> bool {
        self.0.contains(network)
    }
}

impl Default for DevelopmentChains {
    fn default() -> Self {
        Self::new([HARDHAT_NETWORK, LOCALHOST_NETWORK])
    }
}

/// Lookup table from chain id to [`ChainConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct NetworkConfigTable(BTreeMap<u64, ChainConfig>);

impl NetworkConfigTable {
    pub fn new(chains: impl IntoIterator<Item = ChainConfig>) -> Self {
        Self(
            chains
                .into_iter()
                .map(|chain| (chain.chain_id, chain))
                .collect(),
        )
    }

    /// Get the configuration of `chain_id`.
    ///
    /// `network` is only used to build the error when the chain is unknown.
    pub fn get(&self, network: &str, chain_id: Option<u64>) -> Result<&ChainConfig, DeployError> {
        chain_id
            .and_then(|id| self.0.get(&id))
            .ok_or_else(|| DeployError::MissingConfiguration {
                network: network.to_string(),
                chain_id,
            })
    }

    /// Get the ETH/USD price feed configured for `chain_id`.
    pub fn eth_usd_price_feed(
        &self,
        network: &str,
        chain_id: Option<u64>,
    ) -> Result<Address, DeployError> {
        self.get(network, chain_id)?
            .eth_usd_price_feed
            .ok_or_else(|| DeployError::MissingConfiguration {
                network: network.to_string(),
                chain_id,
            })
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            name: SEPOLIA_NETWORK.to_string(),
            eth_usd_price_feed: Some(SEPOLIA_ETH_USD_PRICE_FEED),
        }
    }
}
