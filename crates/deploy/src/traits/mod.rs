//! Capabilities the deployment scripts are written against.
//!
//! The scripts never talk to a node or a block explorer directly; they receive
//! implementations of these traits. [`crate::RpcNode`], [`crate::DeploymentStore`]
//! and [`crate::EtherscanVerifier`] are the production implementations.

mod accounts;
mod deployer;
mod lookup;
mod verifier;

pub use accounts::NamedAccounts;
pub use deployer::{ContractDeployer, DeployRequest, Deployed};
pub use lookup::DeploymentLookup;
pub use verifier::{SourceVerifier, VerificationRequest};
