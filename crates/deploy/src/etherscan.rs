//! Etherscan source verification.
//!
//! Submits the standard JSON compiler input of a contract to the Etherscan v2 API
//! (`verifysourcecode`) and polls `checkverifystatus` until the explorer decides.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::{
    abi,
    artifacts::ArtifactStore,
    config::VerificationSettings,
    rpc,
    traits::{SourceVerifier, VerificationRequest},
};

/// Maximum time to wait for the explorer to process a submission.
const STATUS_TIMEOUT: Duration = Duration::from_secs(120);

/// Interval between status polls.
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Maximum time to wait for the explorer to index a freshly deployed contract.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Number of characters of an unexpected response body kept in error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Raw Etherscan API response. `status` is `"1"` on success, `"0"` on failure.
#[derive(Debug, Clone, Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: String,
}

/// State of a verification submission.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SubmissionStatus {
    Pending,
    Verified,
    Rejected(String),
}

fn parse_status(response: &EtherscanResponse) -> SubmissionStatus {
    let result = response.result.trim();
    if result.to_lowercase().starts_with("pending") {
        SubmissionStatus::Pending
    } else if response.status == "1" || result.eq_ignore_ascii_case("Pass - Verified") {
        SubmissionStatus::Verified
    } else {
        SubmissionStatus::Rejected(result.to_string())
    }
}

/// Whether a failed submission is worth retrying because the explorer has not indexed
/// the contract bytecode yet.
fn is_not_indexed_yet(result: &str) -> bool {
    let result = result.to_lowercase();
    result.contains("unable to locate contractcode") || result.contains("does not have bytecode")
}

/// [`SourceVerifier`] backed by the Etherscan API.
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    settings: VerificationSettings,
    chain_id: u64,
    artifacts: ArtifactStore,
    poll_interval: Duration,
    submit_timeout: Duration,
    status_timeout: Duration,
}

impl EtherscanVerifier {
    pub fn new(
        settings: VerificationSettings,
        chain_id: u64,
        artifacts: ArtifactStore,
    ) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            settings,
            chain_id,
            artifacts,
            poll_interval: STATUS_POLL_INTERVAL,
            submit_timeout: SUBMIT_TIMEOUT,
            status_timeout: STATUS_TIMEOUT,
        })
    }

    /// Override how often the explorer is polled, and for how long.
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.submit_timeout = timeout;
        self.status_timeout = timeout;
        self
    }

    fn api_url(&self) -> Url {
        let mut url = self.settings.api_url.clone();
        url.query_pairs_mut()
            .append_pair("chainid", &self.chain_id.to_string());
        url
    }

    /// Send `request` and decode the explorer's answer.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<EtherscanResponse> {
        let response = request.send().await.context("Failed to reach Etherscan")?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Etherscan response")?;

        serde_json::from_str(&body).with_context(|| {
            format!(
                "Unexpected Etherscan response ({}): {}",
                status,
                body.chars().take(BODY_EXCERPT_LEN).collect::<String>()
            )
        })
    }

    async fn submit(&self, request: &VerificationRequest) -> Result<String> {
        let artifact = self.artifacts.artifact(&request.contract_name)?;
        let build_info = self.artifacts.build_info(&request.contract_name)?;

        let source_code = serde_json::to_string(&build_info.input)
            .context("Failed to serialize compiler input")?;
        let address = request.address.to_string();
        let contract_name = artifact.fully_qualified_name();
        let compiler_version = format!("v{}", build_info.solc_long_version);
        let constructor_args = abi::encode_args_hex(&request.constructor_args);

        let form = [
            ("apikey", self.settings.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("codeformat", "solidity-standard-json-input"),
            ("sourceCode", source_code.as_str()),
            ("contractaddress", address.as_str()),
            ("contractname", contract_name.as_str()),
            ("compilerversion", compiler_version.as_str()),
            // Etherscan's own spelling.
            ("constructorArguements", constructor_args.as_str()),
        ];

        // Only an explorer that has not indexed the contract yet is retried. Transport and
        // decoding failures end the submission with their own message.
        rpc::poll_until(
            "Etherscan to index the contract",
            self.submit_timeout,
            self.poll_interval,
            || async move {
                let response = match self
                    .send(self.client.post(self.api_url()).form(&form))
                    .await
                {
                    Ok(response) => response,
                    Err(e) => return Ok(Some(Err(format!("{:#}", e)))),
                };

                let outcome = match response.status.as_str() {
                    "1" => Some(Ok(response.result)),
                    _ if is_not_indexed_yet(&response.result) => {
                        tracing::debug!(result = %response.result, "Contract not indexed yet");
                        None
                    }
                    _ => Some(Err(format!("{}: {}", response.message, response.result))),
                };

                Ok::<_, anyhow::Error>(outcome)
            },
        )
        .await?
        .map_err(|reason| anyhow::anyhow!(reason))
    }

    async fn wait_for_status(&self, guid: &str) -> Result<()> {
        let status = rpc::poll_until(
            "verification result",
            self.status_timeout,
            self.poll_interval,
            || async move {
                let request = self.client.get(self.api_url()).query(&[
                    ("apikey", self.settings.api_key.as_str()),
                    ("module", "contract"),
                    ("action", "checkverifystatus"),
                    ("guid", guid),
                ]);
                let response = match self.send(request).await {
                    Ok(response) => response,
                    Err(e) => return Ok(Some(SubmissionStatus::Rejected(format!("{:#}", e)))),
                };

                Ok::<_, anyhow::Error>(match parse_status(&response) {
                    SubmissionStatus::Pending => None,
                    status => Some(status),
                })
            },
        )
        .await?;

        match status {
            SubmissionStatus::Rejected(reason) => anyhow::bail!(reason),
            _ => Ok(()),
        }
    }
}

impl SourceVerifier for EtherscanVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<()> {
        let guid = self.submit(request).await?;
        tracing::debug!(guid = %guid, "Verification submitted");
        self.wait_for_status(&guid).await
    }
}
