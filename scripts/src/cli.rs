//! Definitions of CLI arguments and commands for the upgrade scripts

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use crate::{
    builder::AptosCliBuilder,
    commands::Deployer,
    constants::{
        APTOS_COMMAND, DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_GAS_UNIT_PRICE,
        DEFAULT_MAX_GAS_AMOUNT, DEFAULT_MAX_RETRIES, DEFAULT_MODULE_NAME, DEFAULT_PACKAGE_DIR,
        JUNGLE_RUN_APP_KEY,
    },
    errors::DeployError,
    registry::ContractRegistry,
    serializer::MoveBytecodeSerializer,
    submitter::{RestSubmitter, SubmitterConfig},
    types::{DeploymentReport, Network, UpgradeRequest},
};

/// Upgrade Move contracts on an Aptos network
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Private key of the account sending the upgrade, in hex
    #[arg(short, long, env = "APTOS_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Address of the account sending the upgrade
    #[arg(short, long, env = "APTOS_ACCOUNT_ADDRESS")]
    pub account_address: String,

    /// The network to upgrade on
    #[arg(
        short,
        long,
        env = "APTOS_NETWORK",
        value_enum,
        ignore_case = true,
        default_value_t = Network::Testnet
    )]
    pub network: Network,

    /// Node REST endpoint, defaults to the network's public fullnode
    #[arg(long, env = "APTOS_NODE_URL")]
    pub node_url: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The commands supported by the scripts
#[derive(Subcommand)]
pub enum Command {
    /// Build the contract package and submit it through the contract's
    /// `upgrade_contract` entry function
    Upgrade(UpgradeArgs),
}

impl Command {
    /// Run the command, signing transactions with `priv_key` as `account_address`
    pub async fn run(
        self,
        priv_key: &str,
        account_address: &str,
        network: Network,
        node_url: Option<String>,
    ) -> Result<DeploymentReport, DeployError> {
        match self {
            Command::Upgrade(args) => {
                let config = args.submitter_config(node_url);
                let submitter = RestSubmitter::new(priv_key, account_address, config)?;
                let deployer = Deployer::new(
                    ContractRegistry::builtin(),
                    AptosCliBuilder::new(&args.aptos_bin),
                    MoveBytecodeSerializer,
                    submitter,
                );

                deployer.run(&args.request(network)).await
            }
        }
    }
}

/// Upgrade a registered contract
#[derive(Args)]
pub struct UpgradeArgs {
    /// Registry key of the contract to upgrade
    #[arg(long, env = "APTOS_APP_KEY", default_value = JUNGLE_RUN_APP_KEY)]
    pub app: String,

    /// Contract address overriding the registry entry
    #[arg(short, long, env = "APTOS_CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Module exposing the `upgrade_contract` entry function
    #[arg(short, long, env = "APTOS_CONTRACT_MODULE_NAME", default_value = DEFAULT_MODULE_NAME)]
    pub module_name: String,

    /// Directory of the Move package to build
    #[arg(long, env = "APTOS_PACKAGE_DIR", default_value = DEFAULT_PACKAGE_DIR)]
    pub package_dir: PathBuf,

    /// Aptos CLI binary used to compile the package
    #[arg(long, env = "APTOS_CLI", default_value = APTOS_COMMAND)]
    pub aptos_bin: String,

    /// Maximum gas units the upgrade may consume
    #[arg(long, default_value_t = DEFAULT_MAX_GAS_AMOUNT)]
    pub max_gas: u64,

    /// Price per gas unit, in octas
    #[arg(long, default_value_t = DEFAULT_GAS_UNIT_PRICE)]
    pub gas_unit_price: u64,

    /// Seconds to wait for the upgrade transaction to be committed
    #[arg(long, default_value_t = DEFAULT_CONFIRMATION_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Times a transient network failure is retried during submission
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub retries: usize,
}

impl UpgradeArgs {
    /// The pipeline request described by the arguments
    pub fn request(&self, network: Network) -> UpgradeRequest {
        UpgradeRequest {
            network,
            app_key: self.app.clone(),
            contract_address: self.contract_address.clone(),
            module_name: self.module_name.clone(),
            package_dir: self.package_dir.clone(),
        }
    }

    /// The submitter settings described by the arguments
    pub fn submitter_config(&self, node_url: Option<String>) -> SubmitterConfig {
        SubmitterConfig {
            node_url,
            max_gas_amount: self.max_gas,
            gas_unit_price: self.gas_unit_price,
            confirmation_timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.retries,
            ..Default::default()
        }
    }
}
