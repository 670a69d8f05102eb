use alloy_core::primitives::Address;
use clap::{Parser, Subcommand};
use fundme_deploy::{CONFIG_FILENAME, DEFAULT_FUND_AMOUNT, Withdrawal};
use tracing::level_filters::LevelFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "fundme")]
#[command(
    author,
    version,
    about = "Deploy and interact with the FundMe crowdfunding contract"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "FUNDME_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the configuration file.
    ///
    /// Built-in defaults are used for every key the file does not set.
    #[arg(long, alias = "conf", env = "FUNDME_CONFIG", default_value = CONFIG_FILENAME)]
    pub config: String,

    /// The network to use, as named in the configuration.
    ///
    /// If not provided, the `default_network` of the configuration is used (hardhat).
    #[arg(short, long, env = "FUNDME_NETWORK")]
    pub network: Option<String>,

    /// Override the JSON-RPC URL of the selected network.
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<Url>,

    /// Etherscan API key. Contracts are only verified when it is set.
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the deployment scripts.
    Deploy {
        /// Only run the scripts carrying one of these tags.
        #[arg(long, value_delimiter = ',', default_value = "all")]
        tags: Vec<String>,
    },

    /// Verify a deployed contract on Etherscan.
    Verify {
        /// Name of the deployed contract.
        #[arg(long, default_value = "FundMe")]
        contract: String,

        /// Address to verify instead of the recorded one.
        #[arg(long)]
        address: Option<Address>,
    },

    /// Fund the deployed FundMe contract from the deployer account.
    Fund {
        /// Amount to send, in ETH.
        #[arg(long, default_value = DEFAULT_FUND_AMOUNT)]
        amount: String,
    },

    /// Withdraw the funds of the deployed FundMe contract to its owner.
    Withdraw {
        /// Use the gas-optimised `cheaperWithdraw()` entry point.
        #[arg(long)]
        cheaper: bool,
    },

    /// List the contracts deployed on the selected network.
    Deployments,

    /// Write the default configuration file.
    Init,
}

impl Command {
    pub fn withdrawal(cheaper: bool) -> Withdrawal {
        if cheaper {
            Withdrawal::Cheaper
        } else {
            Withdrawal::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deploy_tags() {
        let cli = Cli::try_parse_from([
            "fundme",
            "--network",
            "sepolia",
            "deploy",
            "--tags",
            "mocks,fundme",
        ])
        .unwrap();

        assert_eq!(cli.network.as_deref(), Some("sepolia"));
        let Command::Deploy { tags } = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(tags, vec!["mocks", "fundme"]);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["fundme", "fund"]).unwrap();
        assert_eq!(cli.config, CONFIG_FILENAME);

        let Command::Fund { amount } = cli.command else {
            panic!("expected fund");
        };
        assert_eq!(amount, "0.1");
    }

    #[test]
    fn test_verify_address_override() {
        let cli = Cli::try_parse_from([
            "fundme",
            "verify",
            "--address",
            "0x694AA1769357215DE4FAC081bf1f309aDC325306",
        ])
        .unwrap();

        let Command::Verify { contract, address } = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(contract, "FundMe");
        assert!(address.is_some());
    }

    #[test]
    fn test_withdraw_flag() {
        let cli = Cli::try_parse_from(["fundme", "withdraw", "--cheaper"]).unwrap();
        let Command::Withdraw { cheaper } = cli.command else {
            panic!("expected withdraw");
        };
        assert_eq!(Command::withdrawal(cheaper), Withdrawal::Cheaper);
    }
}
