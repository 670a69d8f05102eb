//! Deployment scripts.
//!
//! Scripts run in declaration order. Each one carries tags, and a run only executes the
//! scripts sharing at least one tag with the requested set (`all` selects everything).

mod fund_me;
mod mocks;

pub use fund_me::{FUND_ME, deploy_fund_me, resolve_price_feed};
pub use mocks::{MOCK_V3_AGGREGATOR, deploy_mocks, mock_args};

use alloy_core::primitives::Address;
use strum::IntoEnumIterator;

use crate::{
    DeployContext, DeployError, DeploymentRecord, DeploymentStore,
    abi::AbiValue,
    traits::{
        ContractDeployer, DeployRequest, NamedAccounts, SourceVerifier, VerificationRequest,
    },
    verify::{VerificationOutcome, verify_contract},
};

/// Name of the account deploying the contracts.
pub const DEPLOYER_ACCOUNT: &str = "deployer";

/// The deployment scripts, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Script {
    /// Price feed mock for development chains.
    Mocks,
    /// The FundMe contract.
    FundMe,
}

impl Script {
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Self::Mocks => &["all", "mocks"],
            Self::FundMe => &["all", "fundme"],
        }
    }

    /// Whether this script is selected by `tags`.
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|tag| self.tags().contains(&tag.as_ref()))
    }

    /// The scripts selected by `tags`, in execution order.
    pub fn selected<S: AsRef<str>>(tags: &[S]) -> Vec<Self> {
        Self::iter().filter(|script| script.matches(tags)).collect()
    }
}

/// Deploy `name` through `contracts` and build its [`DeploymentRecord`].
pub(crate) async fn deploy_contract<D: ContractDeployer>(
    contracts: &D,
    name: &str,
    args: Vec<AbiValue>,
    from: Address,
    wait_confirmations: u64,
) -> Result<DeploymentRecord, DeployError> {
    let deployed = contracts
        .deploy(DeployRequest {
            name: name.to_string(),
            args: args.clone(),
            from,
            wait_confirmations,
        })
        .await
        .map_err(|e| DeployError::DeploymentFailure {
            contract: name.to_string(),
            source: e.into(),
        })?;

    Ok(DeploymentRecord {
        contract_name: name.to_string(),
        address: deployed.address,
        constructor_args: args,
        confirmations_waited: wait_confirmations,
        transaction_hash: deployed.transaction_hash,
        deployed_at: chrono::Utc::now().timestamp(),
    })
}

/// Verify `record` if the network and the configuration allow it.
///
/// Returns `None` when verification was skipped: on development chains, or when no API
/// key is configured, whatever `verifier` is given.
pub async fn maybe_verify<V: SourceVerifier>(
    ctx: &DeployContext,
    record: &DeploymentRecord,
    verifier: Option<&V>,
) -> Option<VerificationOutcome> {
    if ctx.is_development() {
        tracing::debug!(network = %ctx.network, "Development network, skipping verification");
        return None;
    }

    let (Some(_), Some(verifier)) = (&ctx.verification, verifier) else {
        tracing::debug!(network = %ctx.network, "No Etherscan API key, skipping verification");
        return None;
    };

    let request = VerificationRequest {
        address: record.address,
        contract_name: record.contract_name.clone(),
        constructor_args: record.constructor_args.clone(),
    };

    Some(verify_contract(verifier, &request).await)
}

/// Summary of a script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records of the contracts deployed by this run, in deployment order.
    pub deployments: Vec<DeploymentRecord>,
    /// Verification outcomes, for the deployments that were verified.
    pub verifications: Vec<(String, VerificationOutcome)>,
}

/// Run the scripts selected by `tags` against `node`, persisting every deployment in `store`.
///
/// Deployment failures abort the run; verification failures are only logged.
pub async fn run_scripts<N, V>(
    ctx: &DeployContext,
    tags: &[String],
    node: &N,
    store: &DeploymentStore,
    verifier: Option<&V>,
) -> Result<RunReport, DeployError>
where
    N: ContractDeployer + NamedAccounts,
    V: SourceVerifier,
{
    let scripts = Script::selected(tags);
    if scripts.is_empty() {
        tracing::warn!(tags = ?tags, "No deployment script matches the given tags");
        return Ok(RunReport::default());
    }

    let deployer = node.named_account(DEPLOYER_ACCOUNT).await.map_err(|e| {
        DeployError::MissingNamedAccount {
            name: DEPLOYER_ACCOUNT.to_string(),
            source: e.into(),
        }
    })?;

    tracing::info!(
        network = %ctx.network,
        deployer = %deployer,
        scripts = ?scripts.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "Running deployment scripts"
    );

    let mut report = RunReport::default();

    for script in scripts {
        let record = match script {
            Script::Mocks => deploy_mocks(ctx, deployer, node).await?,
            Script::FundMe => Some(deploy_fund_me(ctx, deployer, store, node).await?),
        };

        let Some(record) = record else { continue };

        store.save(&record).map_err(|e| DeployError::Store {
            contract: record.contract_name.clone(),
            source: e.into(),
        })?;

        if script == Script::FundMe {
            if let Some(outcome) = maybe_verify(ctx, &record, verifier).await {
                report
                    .verifications
                    .push((record.contract_name.clone(), outcome));
            }
        }

        report.deployments.push(record);
    }

    tracing::info!(
        network = %ctx.network,
        deployed = report.deployments.len(),
        "Deployment finished"
    );

    Ok(report)
}
