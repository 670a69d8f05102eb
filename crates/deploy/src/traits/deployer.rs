//! Contract creation capability.

use std::future::Future;

use alloy_core::primitives::{Address, B256};
use anyhow::Result;

use crate::abi::AbiValue;

/// A request to deploy a compiled contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    /// Name of the contract artifact.
    pub name: String,
    /// Constructor arguments, in declaration order.
    pub args: Vec<AbiValue>,
    /// Account sending the creation transaction.
    pub from: Address,
    /// Number of confirmations to wait for before returning.
    pub wait_confirmations: u64,
}

/// A deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    pub address: Address,
    pub transaction_hash: Option<B256>,
}

/// Something able to create contracts on chain.
pub trait ContractDeployer {
    /// Deploy a contract and wait for the requested confirmations.
    fn deploy(&self, request: DeployRequest) -> impl Future<Output = Result<Deployed>> + Send;

    /// Whether contract code is currently present at `address`.
    fn has_code(&self, address: Address) -> impl Future<Output = Result<bool>> + Send;
}
