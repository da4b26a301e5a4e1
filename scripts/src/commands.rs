//! Implementation of the upgrade pipeline

use itertools::Itertools;
use tracing::info;

use crate::{
    builder::PackageBuilder,
    constants::UPGRADE_FUNCTION_NAME,
    errors::DeployError,
    registry::ContractRegistry,
    serializer::PackageSerializer,
    submitter::TransactionSubmitter,
    types::{DeploymentReport, EntryFunctionCall, UpgradeRequest},
};

/// Runs the build → serialize → submit pipeline for a single contract upgrade.
///
/// Each stage consumes the output of the previous one, and the first failing
/// stage aborts the run; nothing is retried at this level.
pub struct Deployer<B, S, T> {
    /// The registry the upgrade target is resolved from
    registry: ContractRegistry,
    /// Compiles the package
    builder: B,
    /// Turns the build artifact into the upgrade payload
    serializer: S,
    /// Signs and submits the upgrade transaction
    submitter: T,
}

impl<B, S, T> Deployer<B, S, T>
where
    B: PackageBuilder,
    S: PackageSerializer,
    T: TransactionSubmitter,
{
    /// Create a deployer from its collaborators
    pub fn new(registry: ContractRegistry, builder: B, serializer: S, submitter: T) -> Self {
        Self {
            registry,
            builder,
            serializer,
            submitter,
        }
    }

    /// Upgrade the contract described by `request`, returning the committed transaction
    pub async fn run(&self, request: &UpgradeRequest) -> Result<DeploymentReport, DeployError> {
        let target = self.registry.resolve_target(
            request.network,
            &request.app_key,
            request.contract_address.as_deref(),
            &request.module_name,
        )?;
        info!(
            "Upgrading `{}` on {} at {}",
            target.app_key, request.network, target.address
        );

        let artifact = self.builder.build(&request.package_dir, &target)?;
        info!("Package built successfully");

        let serialized = self.serializer.serialize(&artifact)?;
        info!("Package serialized successfully");

        let call = EntryFunctionCall {
            module_id: target.module_id(),
            function: UPGRADE_FUNCTION_NAME.to_string(),
            type_arguments: vec![],
            arguments: serialized.to_entry_arguments(),
        };
        let transaction_hash = self.submitter.submit(request.network, &call).await?;

        let deployed_files = artifact
            .mv_files()
            .into_iter()
            .map(|path| path.to_path_buf())
            .collect_vec();
        info!(
            "Deployed: [{}]",
            deployed_files.iter().map(|p| p.display()).join(", ")
        );
        info!("Tx hash {}", transaction_hash);

        Ok(DeploymentReport {
            network: request.network,
            module_id: call.module_id,
            deployed_files,
            transaction_hash,
        })
    }
}
