//! Deployment records and their file-backed store.
//!
//! Records live at `<root>/<network>/<Contract>.json`, one file per contract.

use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{abi::AbiValue, traits::DeploymentLookup};

/// The outcome of a single contract deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub address: Address,
    pub constructor_args: Vec<AbiValue>,
    pub confirmations_waited: u64,
    pub transaction_hash: Option<B256>,
    /// Unix timestamp of the deployment.
    pub deployed_at: i64,
}

/// File-backed store of the deployments of one network.
#[derive(Debug, Clone)]
pub struct DeploymentStore {
    network: String,
    dir: PathBuf,
}

impl DeploymentStore {
    /// Open the store of `network` below `root`. Nothing is created until a record is saved.
    pub fn new(root: &Path, network: &str) -> Self {
        Self {
            network: network.to_string(),
            dir: root.join(network),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    fn record_path(&self, contract_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", contract_name))
    }

    /// Persist `record`, replacing any previous deployment of the same contract.
    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.record_path(&record.contract_name);
        let json = serde_json::to_string_pretty(record)
            .context("Failed to serialize deployment record")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(
            contract = %record.contract_name,
            path = %path.display(),
            "Saved deployment record"
        );

        Ok(())
    }

    /// Load the record of `contract_name`, if it was deployed on this network.
    pub fn load(&self, contract_name: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(contract_name);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(record))
    }

    /// Load every record of this network, sorted by contract name.
    pub fn all(&self) -> Result<Vec<DeploymentRecord>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?
        {
            let path = entry.context("Failed to read directory entry")?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            records.push(
                serde_json::from_str::<DeploymentRecord>(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?,
            );
        }

        records.sort_by(|a, b| a.contract_name.cmp(&b.contract_name));
        Ok(records)
    }
}

impl DeploymentLookup for DeploymentStore {
    async fn get(&self, contract_name: &str) -> Result<Option<DeploymentRecord>> {
        self.load(contract_name)
    }
}
