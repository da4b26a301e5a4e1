use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use upgrade_scripts::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let Cli {
        private_key,
        account_address,
        network,
        node_url,
        command,
    } = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match command
        .run(&private_key, &account_address, network, node_url)
        .await
    {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
