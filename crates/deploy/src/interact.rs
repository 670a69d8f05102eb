//! Interaction with a deployed FundMe contract.

use alloy_core::primitives::{
    Address, B256, U256,
    utils::{format_ether, parse_ether},
};
use anyhow::{Context, Result};

use crate::{
    DeploymentStore, abi,
    node::{RpcNode, TransactionRequest},
    scripts::{DEPLOYER_ACCOUNT, FUND_ME},
    traits::NamedAccounts,
};

/// Default amount sent by [`fund`], in ETH.
pub const DEFAULT_FUND_AMOUNT: &str = "0.1";

/// Confirmations waited for by interactions.
const INTERACTION_CONFIRMATIONS: u64 = 1;

/// Withdrawal entry points of FundMe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Withdrawal {
    #[default]
    Standard,
    /// Gas-optimised variant reading the funders array from memory.
    Cheaper,
}

impl Withdrawal {
    pub fn signature(&self) -> &'static str {
        match self {
            Self::Standard => "withdraw()",
            Self::Cheaper => "cheaperWithdraw()",
        }
    }
}

/// Result of an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionResult {
    pub contract: Address,
    pub transaction_hash: B256,
    /// Balance of the contract after the transaction was mined.
    pub contract_balance: U256,
}

/// Parse an ETH amount such as `0.1` into wei.
pub fn parse_amount(amount: &str) -> Result<U256> {
    parse_ether(amount).with_context(|| format!("Invalid ETH amount: {}", amount))
}

fn fund_me_address(store: &DeploymentStore) -> Result<Address> {
    store
        .load(FUND_ME)?
        .map(|record| record.address)
        .with_context(|| {
            format!(
                "{} is not deployed on network `{}`, run `deploy` first",
                FUND_ME,
                store.network()
            )
        })
}

async fn call_fund_me(
    node: &RpcNode,
    store: &DeploymentStore,
    signature: &str,
    value: Option<U256>,
) -> Result<InteractionResult> {
    let contract = fund_me_address(store)?;
    let from = node.named_account(DEPLOYER_ACCOUNT).await?;

    let hash = node
        .send_transaction(&TransactionRequest {
            from,
            to: Some(contract),
            value,
            data: Some(abi::encode_call(signature, &[])),
        })
        .await
        .with_context(|| format!("Failed to call {} on {}", signature, contract))?;

    node.wait_for_receipt(hash, INTERACTION_CONFIRMATIONS).await?;

    let contract_balance = node.balance(contract).await?;

    Ok(InteractionResult {
        contract,
        transaction_hash: hash,
        contract_balance,
    })
}

/// Send `amount` wei to FundMe's `fund()` from the deployer.
pub async fn fund(
    node: &RpcNode,
    store: &DeploymentStore,
    amount: U256,
) -> Result<InteractionResult> {
    tracing::info!(amount = %format_ether(amount), "Funding contract...");

    let result = call_fund_me(node, store, "fund()", Some(amount)).await?;

    tracing::info!(
        contract = %result.contract,
        tx_hash = %result.transaction_hash,
        balance = %format_ether(result.contract_balance),
        "Contract funded"
    );

    Ok(result)
}

/// Withdraw every funded ETH back to the owner.
pub async fn withdraw(
    node: &RpcNode,
    store: &DeploymentStore,
    withdrawal: Withdrawal,
) -> Result<InteractionResult> {
    tracing::info!(method = %withdrawal.signature(), "Withdrawing funds...");

    let result = call_fund_me(node, store, withdrawal.signature(), None).await?;

    tracing::info!(
        contract = %result.contract,
        tx_hash = %result.transaction_hash,
        balance = %format_ether(result.contract_balance),
        "Funds withdrawn"
    );

    Ok(result)
}
