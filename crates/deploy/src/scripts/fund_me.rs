//! FundMe deployment.

use alloy_core::primitives::Address;

use super::{MOCK_V3_AGGREGATOR, deploy_contract};
use crate::{
    DeployContext, DeployError, DeploymentRecord,
    abi::AbiValue,
    traits::{ContractDeployer, DeploymentLookup},
};

/// Name of the FundMe contract artifact.
pub const FUND_ME: &str = "FundMe";

/// Resolve the ETH/USD price feed FundMe is constructed with.
///
/// Development chains use the previously deployed mock and never read the chain table.
/// A recorded mock whose address holds no code (the local node was restarted) counts as
/// missing. Other chains must have a price feed in the chain table.
pub async fn resolve_price_feed<L, D>(
    ctx: &DeployContext,
    lookup: &L,
    contracts: &D,
) -> Result<Address, DeployError>
where
    L: DeploymentLookup,
    D: ContractDeployer,
{
    if !ctx.is_development() {
        return ctx.chains.eth_usd_price_feed(&ctx.network, ctx.chain_id());
    }

    let lookup_error = |e: anyhow::Error| DeployError::Lookup {
        contract: MOCK_V3_AGGREGATOR.to_string(),
        source: e.into(),
    };
    let missing = || DeployError::MissingDependency {
        contract: MOCK_V3_AGGREGATOR.to_string(),
        network: ctx.network.clone(),
    };

    let mock = lookup
        .get(MOCK_V3_AGGREGATOR)
        .await
        .map_err(lookup_error)?
        .ok_or_else(missing)?;

    if !contracts.has_code(mock.address).await.map_err(lookup_error)? {
        tracing::warn!(
            address = %mock.address,
            "Recorded mock price feed has no code on the node, redeploy the mocks"
        );
        return Err(missing());
    }

    tracing::debug!(address = %mock.address, "Using mock price feed");
    Ok(mock.address)
}

/// Deploy FundMe on the network of `ctx`, from `deployer`.
pub async fn deploy_fund_me<L, D>(
    ctx: &DeployContext,
    deployer: Address,
    lookup: &L,
    contracts: &D,
) -> Result<DeploymentRecord, DeployError>
where
    L: DeploymentLookup,
    D: ContractDeployer,
{
    let price_feed = resolve_price_feed(ctx, lookup, contracts).await?;
    let args = vec![AbiValue::Address(price_feed)];
    let confirmations = ctx.network_config.confirmations();

    tracing::info!(
        network = %ctx.network,
        price_feed = %price_feed,
        confirmations,
        "Deploying FundMe..."
    );

    let record = deploy_contract(contracts, FUND_ME, args, deployer, confirmations).await?;

    tracing::info!(address = %record.address, "FundMe deployed");

    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use alloy_core::primitives::Address;

    use super::*;
    use crate::{
        network::{NetworkConfigTable, SEPOLIA_CHAIN_ID, SEPOLIA_ETH_USD_PRICE_FEED},
        scripts::{
            maybe_verify,
            tests::{FakeLookup, FakeNode, FakeVerifier, context},
        },
        verify::VerificationOutcome,
    };

    fn mock_record(address: Address) -> DeploymentRecord {
        DeploymentRecord {
            contract_name: MOCK_V3_AGGREGATOR.to_string(),
            address,
            constructor_args: vec![],
            confirmations_waited: 1,
            transaction_hash: None,
            deployed_at: 0,
        }
    }

    #[tokio::test]
    async fn test_development_chain_uses_mock() {
        let mock = Address::repeat_byte(0xaa);
        let ctx = context("hardhat", None);
        let lookup = FakeLookup(vec![mock_record(mock)]);
        let node = FakeNode::default();
        let verifier = FakeVerifier::default();

        let record = deploy_fund_me(&ctx, Address::repeat_byte(0xde), &lookup, &node)
            .await
            .unwrap();

        assert_eq!(record.contract_name, FUND_ME);
        assert_eq!(record.constructor_args, vec![AbiValue::Address(mock)]);
        assert_eq!(record.confirmations_waited, 1);

        let requests = node.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, FUND_ME);
        assert_eq!(requests[0].args, vec![AbiValue::Address(mock)]);
        assert_eq!(requests[0].from, Address::repeat_byte(0xde));
        assert_eq!(requests[0].wait_confirmations, 1);

        assert!(maybe_verify(&ctx, &record, Some(&verifier)).await.is_none());
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_development_chain_ignores_chain_table() {
        for network in ["hardhat", "localhost"] {
            let mut ctx = context(network, None);
            ctx.chains = NetworkConfigTable::default();
            ctx.network_config.chain_id = None;

            let mock = Address::repeat_byte(0x01);
            let lookup = FakeLookup(vec![mock_record(mock)]);

            assert_eq!(
                resolve_price_feed(&ctx, &lookup, &FakeNode::default())
                    .await
                    .unwrap(),
                mock
            );
        }
    }

    #[tokio::test]
    async fn test_stale_mock_is_missing() {
        let ctx = context("localhost", None);
        let lookup = FakeLookup(vec![mock_record(Address::repeat_byte(0xaa))]);
        let node = FakeNode {
            wiped: true,
            ..Default::default()
        };

        let err = deploy_fund_me(&ctx, Address::ZERO, &lookup, &node)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::MissingDependency { ref contract, .. } if contract == MOCK_V3_AGGREGATOR
        ));
        assert!(node.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_development_chain_without_mock() {
        let ctx = context("hardhat", None);
        let node = FakeNode::default();

        let err = deploy_fund_me(&ctx, Address::ZERO, &FakeLookup::default(), &node)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::MissingDependency { ref contract, .. } if contract == MOCK_V3_AGGREGATOR
        ));
        assert!(node.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_network_uses_chain_table_and_verifies() {
        let ctx = context("sepolia", Some("KEY"));
        assert_eq!(ctx.chain_id(), Some(SEPOLIA_CHAIN_ID));

        let node = FakeNode::default();
        let verifier = FakeVerifier::default();

        let record = deploy_fund_me(
            &ctx,
            Address::repeat_byte(0xde),
            &FakeLookup::default(),
            &node,
        )
        .await
        .unwrap();

        let expected = vec![AbiValue::Address(SEPOLIA_ETH_USD_PRICE_FEED)];
        assert_eq!(record.constructor_args, expected);
        assert_eq!(record.confirmations_waited, 3);

        let outcome = maybe_verify(&ctx, &record, Some(&verifier)).await;
        assert_eq!(outcome, Some(VerificationOutcome::Verified));

        let requests = verifier.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].address, record.address);
        assert_eq!(requests[0].constructor_args, expected);
    }

    #[tokio::test]
    async fn test_public_network_missing_configuration() {
        let mut ctx = context("sepolia", Some("KEY"));
        ctx.chains = NetworkConfigTable::default();
        let node = FakeNode::default();

        let err = deploy_fund_me(&ctx, Address::ZERO, &FakeLookup::default(), &node)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::MissingConfiguration { chain_id: Some(SEPOLIA_CHAIN_ID), .. }
        ));
        assert!(node.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_already_verified_does_not_fail() {
        let ctx = context("sepolia", Some("KEY"));
        let node = FakeNode::default();
        let verifier = FakeVerifier {
            fail_with: Some("Contract already Verified"),
            ..Default::default()
        };

        let record = deploy_fund_me(&ctx, Address::ZERO, &FakeLookup::default(), &node)
            .await
            .unwrap();

        for _ in 0..2 {
            assert_eq!(
                maybe_verify(&ctx, &record, Some(&verifier)).await,
                Some(VerificationOutcome::AlreadyVerified)
            );
        }
    }

    #[tokio::test]
    async fn test_deploy_failure_propagates() {
        let ctx = context("sepolia", None);
        let node = FakeNode {
            fail_with: Some("nonce too low"),
            ..Default::default()
        };

        let err = deploy_fund_me(&ctx, Address::ZERO, &FakeLookup::default(), &node)
            .await
            .unwrap_err();

        let DeployError::DeploymentFailure { contract, source } = err else {
            panic!("expected a deployment failure");
        };
        assert_eq!(contract, FUND_ME);
        assert!(source.to_string().contains("nonce too low"));
    }
}
