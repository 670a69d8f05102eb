//! Mocks for development chains.

use alloy_core::primitives::{Address, I256, U256};

use super::deploy_contract;
use crate::{
    DeployContext, DeployError, DeploymentRecord, abi::AbiValue, config::MockConfig,
    traits::ContractDeployer,
};

/// Name of the Chainlink aggregator mock artifact.
pub const MOCK_V3_AGGREGATOR: &str = "MockV3Aggregator";

/// Constructor arguments of `MockV3Aggregator(uint8 decimals, int256 initialAnswer)`.
pub fn mock_args(mocks: &MockConfig) -> Vec<AbiValue> {
    let magnitude = I256::from_raw(U256::from(mocks.initial_answer.unsigned_abs()));
    let initial_answer = if mocks.initial_answer < 0 {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };

    vec![
        AbiValue::Uint(U256::from(mocks.decimals)),
        AbiValue::Int(initial_answer),
    ]
}

/// Deploy the price feed mock on development chains.
///
/// Returns `None` on other networks, where the real price feed is used.
pub async fn deploy_mocks<D: ContractDeployer>(
    ctx: &DeployContext,
    deployer: Address,
    contracts: &D,
) -> Result<Option<DeploymentRecord>, DeployError> {
    if !ctx.is_development() {
        tracing::debug!(network = %ctx.network, "Not a development network, no mocks needed");
        return Ok(None);
    }

    tracing::info!(network = %ctx.network, "Local network detected, deploying mocks...");

    let record = deploy_contract(
        contracts,
        MOCK_V3_AGGREGATOR,
        mock_args(&ctx.mocks),
        deployer,
        ctx.network_config.confirmations(),
    )
    .await?;

    tracing::info!(address = %record.address, "Mocks deployed");

    Ok(Some(record))
}
