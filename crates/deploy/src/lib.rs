//! fundme-deploy - Deployment library for the FundMe crowdfunding contract.
//!
//! This crate resolves network-dependent configuration (mock price feed on development
//! chains, the real one elsewhere), deploys the contracts through a JSON-RPC node and
//! verifies their sources on Etherscan on a best-effort basis.

pub mod abi;
pub mod artifacts;
pub mod config;
mod deployments;
mod error;
mod etherscan;
pub mod interact;
pub mod network;
mod node;
pub mod rpc;
pub mod scripts;
pub mod traits;
pub mod verify;

pub use abi::AbiValue;
pub use artifacts::ArtifactStore;
pub use config::{CONFIG_FILENAME, DeployContext, NamedAccount, Settings, VerificationSettings};
pub use deployments::{DeploymentRecord, DeploymentStore};
pub use error::{BoxError, DeployError};
pub use etherscan::EtherscanVerifier;
pub use interact::{DEFAULT_FUND_AMOUNT, Withdrawal};
pub use network::{ChainConfig, DevelopmentChains, NetworkConfig, NetworkConfigTable};
pub use node::{RpcNode, TransactionReceipt, TransactionRequest};
pub use scripts::{RunReport, Script, run_scripts};
pub use verify::{VerificationOutcome, classify_verification_error, verify_contract};
