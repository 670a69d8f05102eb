//! Errors that abort a deployment run.

/// Boxed error carried as the source of a [`DeployError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal errors raised while resolving configuration or deploying contracts.
///
/// Verification problems are deliberately absent: they are reported through
/// [`crate::VerificationOutcome`] and never abort a run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The chain is not a development chain and has no usable entry in the network config table.
    #[error("no network configuration for chain id {chain_id:?} (network `{network}`)")]
    MissingConfiguration {
        network: String,
        chain_id: Option<u64>,
    },

    /// A contract this deployment depends on has not been deployed yet.
    #[error("`{contract}` has not been deployed on network `{network}`, deploy it first")]
    MissingDependency { contract: String, network: String },

    /// The deploy capability rejected the deployment.
    #[error("failed to deploy `{contract}`")]
    DeploymentFailure {
        contract: String,
        #[source]
        source: BoxError,
    },

    /// A recorded dependency could not be read from the store or checked on chain.
    #[error("failed to look up deployment of `{contract}`")]
    Lookup {
        contract: String,
        #[source]
        source: BoxError,
    },

    /// A deployment succeeded but its record could not be persisted.
    #[error("failed to record deployment of `{contract}`")]
    Store {
        contract: String,
        #[source]
        source: BoxError,
    },

    /// A named account could not be resolved to an address.
    #[error("failed to resolve named account `{name}`")]
    MissingNamedAccount {
        name: String,
        #[source]
        source: BoxError,
    },
}
