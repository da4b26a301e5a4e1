//! The static registry of managed contract addresses

use std::collections::BTreeMap;

use crate::{
    constants::{
        JUNGLE_RUN_APP_KEY, JUNGLE_RUN_DEVNET_ADDRESS, JUNGLE_RUN_MAINNET_ADDRESS,
        JUNGLE_RUN_TESTNET_ADDRESS,
    },
    errors::DeployError,
    types::{ContractTarget, Network},
    utils::validate_address,
};

/// A read-only mapping from network and application key to contract address.
///
/// An empty address marks a contract that has not been published on that network.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    /// Addresses keyed by network, then application key
    entries: BTreeMap<Network, BTreeMap<String, String>>,
}

impl ContractRegistry {
    /// The registry of contracts managed by these scripts
    pub fn builtin() -> Self {
        Self::from_entries([
            (Network::Mainnet, JUNGLE_RUN_APP_KEY, JUNGLE_RUN_MAINNET_ADDRESS),
            (Network::Testnet, JUNGLE_RUN_APP_KEY, JUNGLE_RUN_TESTNET_ADDRESS),
            (Network::Devnet, JUNGLE_RUN_APP_KEY, JUNGLE_RUN_DEVNET_ADDRESS),
        ])
    }

    /// Build a registry from `(network, app key, address)` rows
    pub fn from_entries<'a>(rows: impl IntoIterator<Item = (Network, &'a str, &'a str)>) -> Self {
        let mut entries: BTreeMap<Network, BTreeMap<String, String>> = BTreeMap::new();
        for (network, app_key, address) in rows {
            entries
                .entry(network)
                .or_default()
                .insert(app_key.to_string(), address.to_string());
        }

        Self { entries }
    }

    /// The raw registry entry, which may be empty
    pub fn lookup(&self, network: Network, app_key: &str) -> Option<&str> {
        self.entries
            .get(&network)
            .and_then(|apps| apps.get(app_key))
            .map(String::as_str)
    }

    /// Resolve the published address of `app_key` on `network`
    pub fn resolve(&self, network: Network, app_key: &str) -> Result<&str, DeployError> {
        match self.lookup(network, app_key) {
            None => Err(DeployError::Configuration(format!(
                "no contract `{}` registered on {}",
                app_key, network
            ))),
            Some(address) if address.trim().is_empty() => Err(DeployError::Configuration(
                format!("contract `{}` is not deployed on {}", app_key, network),
            )),
            Some(address) => Ok(address),
        }
    }

    /// Resolve the upgrade target, preferring a non-blank explicit address
    /// over the registry entry
    pub fn resolve_target(
        &self,
        network: Network,
        app_key: &str,
        address_override: Option<&str>,
        module_name: &str,
    ) -> Result<ContractTarget, DeployError> {
        let address = match address_override.map(str::trim) {
            Some(address) if !address.is_empty() => address,
            _ => self.resolve(network, app_key)?,
        };
        validate_address(address)?;

        if module_name.trim().is_empty() {
            return Err(DeployError::Configuration(
                "contract module name must not be empty".to_string(),
            ));
        }

        Ok(ContractTarget {
            app_key: app_key.to_string(),
            address: address.to_string(),
            module_name: module_name.to_string(),
        })
    }
}
