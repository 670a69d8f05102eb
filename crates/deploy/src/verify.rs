//! Best-effort source verification.
//!
//! Verification never aborts a run: every result is turned into a
//! [`VerificationOutcome`] and logged.

use std::fmt;

use crate::traits::{SourceVerifier, VerificationRequest};

/// Result of a verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The explorer accepted the source.
    Verified,
    /// The explorer already had the source. Equivalent to success.
    AlreadyVerified,
    /// Verification failed for another reason.
    Failed(String),
}

impl VerificationOutcome {
    /// Whether the contract source is published after this attempt.
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified | Self::AlreadyVerified)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.write_str("verified"),
            Self::AlreadyVerified => f.write_str("already verified"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Classify the error message of a failed verification.
///
/// Explorers do not expose a machine-readable code for "already verified", only a
/// sentence such as `Contract source code already verified`. The match is therefore on
/// the text, case-insensitively, and will break if the explorer rewords it.
pub fn classify_verification_error(message: &str) -> VerificationOutcome {
    if message.to_lowercase().contains("already verified") {
        VerificationOutcome::AlreadyVerified
    } else {
        VerificationOutcome::Failed(message.to_string())
    }
}

/// Submit `request` to `verifier` and classify the result. Never fails.
pub async fn verify_contract<V: SourceVerifier>(
    verifier: &V,
    request: &VerificationRequest,
) -> VerificationOutcome {
    tracing::info!(
        contract = %request.contract_name,
        address = %request.address,
        "Verifying contract..."
    );

    let outcome = match verifier.verify(request).await {
        Ok(()) => VerificationOutcome::Verified,
        Err(e) => classify_verification_error(&format!("{:#}", e)),
    };

    match &outcome {
        VerificationOutcome::Verified => {
            tracing::info!(
                contract = %request.contract_name,
                address = %request.address,
                "Contract verified"
            );
        }
        VerificationOutcome::AlreadyVerified => {
            tracing::info!(
                contract = %request.contract_name,
                address = %request.address,
                "Contract already verified"
            );
        }
        VerificationOutcome::Failed(reason) => {
            tracing::warn!(
                contract = %request.contract_name,
                address = %request.address,
                reason = %reason,
                "Contract verification failed, continuing"
            );
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy_core::primitives::Address;
    use anyhow::Result;

    use super::*;
    use crate::abi::AbiValue;

    struct FailingVerifier {
        message: &'static str,
        calls: AtomicUsize,
    }

    impl SourceVerifier for FailingVerifier {
        async fn verify(&self, _request: &VerificationRequest) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("{}", self.message)
        }
    }

    struct OkVerifier;

    impl SourceVerifier for OkVerifier {
        async fn verify(&self, _request: &VerificationRequest) -> Result<()> {
            Ok(())
        }
    }

    fn request() -> VerificationRequest {
        VerificationRequest {
            address: Address::repeat_byte(0x42),
            contract_name: "FundMe".to_string(),
            constructor_args: vec![AbiValue::Address(Address::repeat_byte(0x01))],
        }
    }

    #[test]
    fn test_classify_already_verified() {
        for message in [
            "Contract already Verified",
            "Contract source code already verified",
            "ALREADY VERIFIED",
            "Etherscan: already verified at 0x1234",
        ] {
            assert_eq!(
                classify_verification_error(message),
                VerificationOutcome::AlreadyVerified,
                "{message}"
            );
        }
    }

    #[test]
    fn test_classify_other_failures() {
        assert_eq!(
            classify_verification_error("Invalid API Key"),
            VerificationOutcome::Failed("Invalid API Key".to_string())
        );
        assert!(matches!(
            classify_verification_error("Unable to verify: not yet verified"),
            VerificationOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_success_is_verified() {
        assert_eq!(
            verify_contract(&OkVerifier, &request()).await,
            VerificationOutcome::Verified
        );
    }

    #[tokio::test]
    async fn test_already_verified_is_idempotent() {
        let verifier = FailingVerifier {
            message: "Contract already Verified",
            calls: AtomicUsize::new(0),
        };

        for _ in 0..3 {
            let outcome = verify_contract(&verifier, &request()).await;
            assert_eq!(outcome, VerificationOutcome::AlreadyVerified);
            assert!(outcome.is_verified());
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_is_not_escalated() {
        let verifier = FailingVerifier {
            message: "Fail - Unable to verify",
            calls: AtomicUsize::new(0),
        };

        let outcome = verify_contract(&verifier, &request()).await;
        assert_eq!(
            outcome,
            VerificationOutcome::Failed("Fail - Unable to verify".to_string())
        );
        assert!(!outcome.is_verified());
    }
}
