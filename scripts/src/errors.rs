//! Definitions of errors that can occur during the execution of the upgrade scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the upgrade scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// The target contract could not be resolved for the chosen network,
    /// or the process configuration is otherwise invalid
    Configuration(String),
    /// Error compiling the Move package
    Build(String),
    /// Error transforming a build artifact into the upgrade payload
    Serialization(String),
    /// Error talking to the node, or the node rejected / failed the transaction
    Network(String),
    /// Error loading the signing key or signing the transaction
    Signing(String),
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::Configuration(s) => write!(f, "configuration error: {}", s),
            DeployError::Build(s) => write!(f, "error building package: {}", s),
            DeployError::Serialization(s) => write!(f, "error serializing package: {}", s),
            DeployError::Network(s) => write!(f, "error submitting transaction: {}", s),
            DeployError::Signing(s) => write!(f, "error signing transaction: {}", s),
        }
    }
}

impl Error for DeployError {}
