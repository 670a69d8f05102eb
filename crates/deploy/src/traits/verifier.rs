//! Source verification capability.

use std::future::Future;

use alloy_core::primitives::Address;
use anyhow::Result;

use crate::abi::AbiValue;

/// A request to publish the source of a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub address: Address,
    pub contract_name: String,
    pub constructor_args: Vec<AbiValue>,
}

/// An external source verification service (a block explorer).
///
/// Implementations report every failure as an error, including "already verified";
/// classification is done by [`crate::verify::verify_contract`].
pub trait SourceVerifier {
    fn verify(&self, request: &VerificationRequest) -> impl Future<Output = Result<()>> + Send;
}
