//! Type definitions used throughout the scripts

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use serde_json::Value;

use crate::{
    constants::{DEVNET_NODE_URL, MAINNET_NODE_URL, TESTNET_NODE_URL},
    utils::encode_hex,
};

/// The networks a contract can be upgraded on
#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Network {
    /// The main network
    Mainnet,
    /// The test network
    Testnet,
    /// The development network
    Devnet,
}

impl Network {
    /// All networks, in registry order
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Testnet, Network::Devnet];

    /// The public fullnode REST endpoint for the network
    pub fn default_node_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_NODE_URL,
            Network::Testnet => TESTNET_NODE_URL,
            Network::Devnet => DEVNET_NODE_URL,
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "MAINNET"),
            Network::Testnet => write!(f, "TESTNET"),
            Network::Devnet => write!(f, "DEVNET"),
        }
    }
}

/// The on-chain contract an upgrade is aimed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractTarget {
    /// The named address under which the package is compiled
    pub app_key: String,
    /// The account address the package is published at
    pub address: String,
    /// The module exposing the upgrade entry function
    pub module_name: String,
}

impl ContractTarget {
    /// The `<address>::<module>` identifier of the upgrade module
    pub fn module_id(&self) -> String {
        format!("{}::{}", self.address, self.module_name)
    }
}

/// A single compiled Move module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    /// The module name, taken from the file stem
    pub name: String,
    /// The path of the `.mv` file the bytecode was read from
    pub path: PathBuf,
    /// The module bytecode
    pub bytecode: Vec<u8>,
}

/// The output of compiling a Move package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// The package name declared in the manifest
    pub package_name: String,
    /// The package source directory
    pub package_dir: PathBuf,
    /// The BCS-encoded package metadata
    pub metadata: Vec<u8>,
    /// The compiled modules, ordered by file name
    pub modules: Vec<CompiledModule>,
}

impl BuildArtifact {
    /// The module files produced by the build
    pub fn mv_files(&self) -> Vec<&Path> {
        self.modules.iter().map(|m| m.path.as_path()).collect()
    }
}

/// The wire-ready upgrade payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedPackage {
    /// The package metadata blob
    pub meta: Vec<u8>,
    /// The module bytecode blobs, in publishing order
    pub bytecodes: Vec<Vec<u8>>,
}

impl SerializedPackage {
    /// The `[meta, bytecodes]` positional arguments of the upgrade call,
    /// encoded as the node's JSON API expects `vector<u8>` values
    pub fn to_entry_arguments(&self) -> Vec<Value> {
        let bytecodes = self
            .bytecodes
            .iter()
            .map(|code| Value::String(encode_hex(code)))
            .collect();

        vec![
            Value::String(encode_hex(&self.meta)),
            Value::Array(bytecodes),
        ]
    }
}

/// An entry function invocation assembled for submission
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFunctionCall {
    /// The `<address>::<module>` identifier of the called module
    pub module_id: String,
    /// The called function
    pub function: String,
    /// The type arguments of the call
    pub type_arguments: Vec<String>,
    /// The JSON-encoded positional arguments of the call
    pub arguments: Vec<Value>,
}

impl EntryFunctionCall {
    /// The fully-qualified `<address>::<module>::<function>` identifier
    pub fn function_id(&self) -> String {
        format!("{}::{}", self.module_id, self.function)
    }
}

/// The parameters of a single upgrade run
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
    /// The network to upgrade on
    pub network: Network,
    /// The registry key of the contract being upgraded
    pub app_key: String,
    /// An address overriding the registry lookup
    pub contract_address: Option<String>,
    /// The module exposing the upgrade entry function
    pub module_name: String,
    /// The Move package source directory
    pub package_dir: PathBuf,
}

/// The outcome of a successful upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    /// The network the upgrade was submitted to
    pub network: Network,
    /// The `<address>::<module>` identifier of the upgraded module
    pub module_id: String,
    /// The module files that were deployed
    pub deployed_files: Vec<PathBuf>,
    /// The hash of the committed upgrade transaction
    pub transaction_hash: String,
}
