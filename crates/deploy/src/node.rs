//! JSON-RPC node backend.
//!
//! Transactions are sent with `eth_sendTransaction`, so they are signed by the node
//! (hardhat/anvil dev accounts, or any node holding unlocked accounts).

use std::{collections::BTreeMap, time::Duration};

use alloy_core::primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::{
    abi,
    artifacts::ArtifactStore,
    config::{DeployContext, NamedAccount},
    rpc,
    traits::{ContractDeployer, DeployRequest, Deployed, NamedAccounts},
};

/// Default maximum time to wait for a transaction to be mined and confirmed.
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default interval between receipt/block polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Transaction fields accepted by `eth_sendTransaction`. Gas is left to the node.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// The subset of a transaction receipt the deployment needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub block_number: u64,
    /// `0x1` on success, `0x0` on revert. Absent on pre-byzantium chains.
    pub status: Option<String>,
    pub contract_address: Option<Address>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref().is_none_or(|status| status == "0x1")
    }
}

/// Deserialize a u64 from a hex string (with 0x prefix).
fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    rpc::parse_quantity(&s).map_err(serde::de::Error::custom)
}

/// A node reachable over JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcNode {
    client: reqwest::Client,
    url: Url,
    artifacts: ArtifactStore,
    named_accounts: BTreeMap<String, NamedAccount>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl RpcNode {
    pub fn new(
        url: Url,
        artifacts: ArtifactStore,
        named_accounts: BTreeMap<String, NamedAccount>,
    ) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            url,
            artifacts,
            named_accounts,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Connect to the network selected in `ctx`.
    pub fn from_context(ctx: &DeployContext) -> Result<Self> {
        Self::new(
            ctx.rpc_url()?.clone(),
            ArtifactStore::new(&ctx.artifacts),
            ctx.named_accounts.clone(),
        )
    }

    /// Override how receipts and confirmations are polled.
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.receipt_timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<T> {
        rpc::json_rpc_call(&self.client, self.url.as_str(), method, params).await
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id: String = self.call("eth_chainId", vec![]).await?;
        rpc::parse_quantity(&chain_id)
    }

    pub async fn block_number(&self) -> Result<u64> {
        let number: String = self.call("eth_blockNumber", vec![]).await?;
        rpc::parse_quantity(&number)
    }

    /// Accounts managed by the node.
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        self.call("eth_accounts", vec![]).await
    }

    pub async fn balance(&self, address: Address) -> Result<U256> {
        self.call("eth_getBalance", vec![json!(address), json!("latest")])
            .await
            .with_context(|| format!("Failed to get balance of {}", address))
    }

    /// Submit a transaction and return its hash.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256> {
        self.call("eth_sendTransaction", vec![json!(tx)]).await
    }

    /// Wait until `hash` is mined and `confirmations` blocks deep.
    ///
    /// Fails if the transaction reverted.
    pub async fn wait_for_receipt(
        &self,
        hash: B256,
        confirmations: u64,
    ) -> Result<TransactionReceipt> {
        let receipt = rpc::poll_until(
            &format!("receipt of {}", hash),
            self.receipt_timeout,
            self.poll_interval,
            || async move {
                self.call::<Option<TransactionReceipt>>(
                    "eth_getTransactionReceipt",
                    vec![json!(hash)],
                )
                .await
            },
        )
        .await?;

        if !receipt.succeeded() {
            anyhow::bail!("Transaction {} reverted", hash);
        }

        if confirmations > 1 {
            let target = receipt.block_number + confirmations - 1;
            tracing::info!(
                tx_hash = %hash,
                block = receipt.block_number,
                confirmations,
                "Waiting for confirmations..."
            );

            rpc::poll_until(
                &format!("{} confirmations of {}", confirmations, hash),
                self.receipt_timeout,
                self.poll_interval,
                || async move {
                    let current = self.block_number().await?;
                    Ok::<_, anyhow::Error>((current >= target).then_some(()))
                },
            )
            .await?;
        }

        Ok(receipt)
    }
}

impl ContractDeployer for RpcNode {
    async fn deploy(&self, request: DeployRequest) -> Result<Deployed> {
        let artifact = self.artifacts.artifact(&request.name)?;
        let bytecode = artifact.bytecode_bytes()?;

        tracing::info!(
            contract = %request.name,
            from = %request.from,
            args = ?request.args.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Deploying contract..."
        );

        let tx = TransactionRequest {
            from: request.from,
            data: Some(abi::encode_deployment(&bytecode, &request.args)),
            ..Default::default()
        };

        let hash = self
            .send_transaction(&tx)
            .await
            .with_context(|| format!("Failed to send deployment transaction of {}", request.name))?;

        tracing::info!(contract = %request.name, tx_hash = %hash, "Deployment transaction sent");

        let receipt = self
            .wait_for_receipt(hash, request.wait_confirmations.max(1))
            .await?;

        let address = receipt
            .contract_address
            .with_context(|| format!("Receipt of {} has no contract address", hash))?;

        tracing::info!(
            contract = %request.name,
            address = %address,
            block = receipt.block_number,
            "Contract deployed"
        );

        Ok(Deployed {
            address,
            transaction_hash: Some(receipt.transaction_hash),
        })
    }

    async fn has_code(&self, address: Address) -> Result<bool> {
        let code: String = self
            .call("eth_getCode", vec![json!(address), json!("latest")])
            .await
            .with_context(|| format!("Failed to get code at {}", address))?;

        Ok(!code.trim_start_matches("0x").is_empty())
    }
}

impl NamedAccounts for RpcNode {
    async fn named_account(&self, name: &str) -> Result<Address> {
        let account = self
            .named_accounts
            .get(name)
            .with_context(|| format!("Named account `{}` is not configured", name))?;

        match *account {
            NamedAccount::Address(address) => Ok(address),
            NamedAccount::Index(index) => {
                let accounts = self.accounts().await?;
                accounts.get(index).copied().with_context(|| {
                    format!(
                        "Named account `{}` uses index {}, but the node only manages {} account(s)",
                        name,
                        index,
                        accounts.len()
                    )
                })
            }
        }
    }
}
