use std::future::Future;

use alloy_core::primitives::Address;
use anyhow::Result;

/// Resolution of named accounts (`deployer`, `user`, ...) to addresses.
pub trait NamedAccounts {
    fn named_account(&self, name: &str) -> impl Future<Output = Result<Address>> + Send;
}
