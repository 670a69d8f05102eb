//! fundme is a CLI tool to deploy, verify and fund the FundMe crowdfunding contract.

mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use fundme_deploy::{
    ArtifactStore, DeployContext, DeploymentStore, EtherscanVerifier, RpcNode, Settings,
    interact, run_scripts, scripts::maybe_verify,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt().with_max_level(cli.verbosity).init();

    let config_path = PathBuf::from(&cli.config);

    match cli.command {
        Command::Init => {
            Settings::default().save_to_file(&config_path)?;
            tracing::info!(path = %config_path.display(), "Configuration written");
        }
        ref command => {
            let settings = Settings::load(&config_path)?;
            let ctx = settings.resolve(
                cli.network.as_deref(),
                cli.rpc_url.clone(),
                cli.etherscan_api_key.clone(),
            )?;

            tracing::info!(
                network = %ctx.network,
                chain_id = ?ctx.chain_id(),
                development = ctx.is_development(),
                verification = ctx.verification.is_some(),
                "Configuration loaded"
            );

            run(&ctx, command).await?;
        }
    }

    Ok(())
}

async fn run(ctx: &DeployContext, command: &Command) -> Result<()> {
    let store = DeploymentStore::new(&ctx.deployments, &ctx.network);

    match command {
        Command::Deploy { tags } => {
            let node = connect(ctx).await?;
            let verifier = verifier(ctx)?;
            run_scripts(ctx, tags, &node, &store, verifier.as_ref()).await?;
        }
        Command::Verify { contract, address } => {
            let mut record = store.load(contract)?.with_context(|| {
                format!("{} is not deployed on network `{}`", contract, ctx.network)
            })?;
            if let Some(address) = address {
                record.address = *address;
            }
            let verifier = verifier(ctx)?;
            match maybe_verify(ctx, &record, verifier.as_ref()).await {
                Some(outcome) => tracing::info!(
                    contract = %record.contract_name,
                    address = %record.address,
                    outcome = %outcome,
                    published = outcome.is_verified(),
                    "Verification finished"
                ),
                None => tracing::info!(
                    network = %ctx.network,
                    "Verification skipped: development network or no Etherscan API key"
                ),
            }
        }
        Command::Fund { amount } => {
            let node = connect(ctx).await?;
            interact::fund(&node, &store, interact::parse_amount(amount)?).await?;
        }
        Command::Withdraw { cheaper } => {
            let node = connect(ctx).await?;
            interact::withdraw(&node, &store, Command::withdrawal(*cheaper)).await?;
        }
        Command::Deployments => {
            let records = store.all()?;
            if records.is_empty() {
                tracing::info!(network = %ctx.network, "No deployments");
            }
            for record in records {
                tracing::info!(
                    contract = %record.contract_name,
                    address = %record.address,
                    args = ?record
                        .constructor_args
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>(),
                    "Deployment"
                );
            }
        }
        Command::Init => unreachable!("init runs before the configuration is loaded"),
    }

    Ok(())
}

/// Connect to the node of the selected network and check it serves the expected chain.
async fn connect(ctx: &DeployContext) -> Result<RpcNode> {
    let node = RpcNode::from_context(ctx)?;

    let chain_id = node
        .chain_id()
        .await
        .with_context(|| format!("Failed to reach the node at {}", node.url()))?;

    if let Some(expected) = ctx.chain_id() {
        if chain_id != expected {
            anyhow::bail!(
                "Network `{}` expects chain id {}, but the node at {} reports {}",
                ctx.network,
                expected,
                node.url(),
                chain_id
            );
        }
    }

    Ok(node)
}

/// Build the Etherscan verifier, only when an API key is configured.
fn verifier(ctx: &DeployContext) -> Result<Option<EtherscanVerifier>> {
    let (Some(settings), Some(chain_id)) = (&ctx.verification, ctx.chain_id()) else {
        return Ok(None);
    };

    EtherscanVerifier::new(
        settings.clone(),
        chain_id,
        ArtifactStore::new(&ctx.artifacts),
    )
    .map(Some)
}
