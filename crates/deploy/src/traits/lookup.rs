use std::future::Future;

use anyhow::Result;

use crate::DeploymentRecord;

/// Access to contracts deployed earlier on the current network.
pub trait DeploymentLookup {
    /// Get the deployment of `contract_name`, or `None` if it was never deployed.
    fn get(
        &self,
        contract_name: &str,
    ) -> impl Future<Output = Result<Option<DeploymentRecord>>> + Send;
}
