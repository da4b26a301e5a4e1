//! Compiling Move packages into deployable build artifacts

use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use itertools::Itertools;
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{
        APTOS_COMMAND, BUILD_PATH_SEGMENT, BYTECODE_MODULES_PATH_SEGMENT, COMPILE_COMMAND,
        MOVE_MANIFEST_FILE, MOVE_MODULE_EXTENSION, MOVE_SUBCOMMAND, PACKAGE_METADATA_FILE,
        SAVE_METADATA_FLAG,
    },
    errors::DeployError,
    types::{BuildArtifact, CompiledModule, ContractTarget},
    utils::command_success_or,
};

/// Compiles a Move package for the given upgrade target
pub trait PackageBuilder {
    /// Build the package in `package_dir`, binding its named address to the target
    fn build(
        &self,
        package_dir: &Path,
        target: &ContractTarget,
    ) -> Result<BuildArtifact, DeployError>;
}

/// Builds packages by shelling out to the Aptos CLI.
///
/// Assumes the CLI binary is locally available.
#[derive(Debug, Clone)]
pub struct AptosCliBuilder {
    /// The Aptos CLI binary to invoke
    aptos_bin: String,
}

impl AptosCliBuilder {
    /// Create a builder invoking the given CLI binary
    pub fn new(aptos_bin: impl Into<String>) -> Self {
        Self {
            aptos_bin: aptos_bin.into(),
        }
    }

    /// The compile command for the package
    fn compile_command(&self, package_dir: &Path, target: &ContractTarget) -> Command {
        let mut cmd = Command::new(&self.aptos_bin);
        cmd.arg(MOVE_SUBCOMMAND);
        cmd.arg(COMPILE_COMMAND);
        cmd.arg("--package-dir");
        cmd.arg(package_dir);
        // Emit `package-metadata.bcs` next to the bytecode
        cmd.arg(SAVE_METADATA_FLAG);
        // Compile against the address the package is already published at
        cmd.arg("--named-addresses");
        cmd.arg(format!("{}={}", target.app_key, target.address));

        cmd
    }
}

impl Default for AptosCliBuilder {
    fn default() -> Self {
        Self::new(APTOS_COMMAND)
    }
}

impl PackageBuilder for AptosCliBuilder {
    fn build(
        &self,
        package_dir: &Path,
        target: &ContractTarget,
    ) -> Result<BuildArtifact, DeployError> {
        // Fail on a bad package directory before spending time in the compiler
        read_package_name(package_dir)?;

        debug!("Compiling package in {}", package_dir.display());
        command_success_or(
            self.compile_command(package_dir, target),
            "Failed to compile Move package",
        )?;

        read_build_artifact(package_dir)
    }
}

/// The subset of `Move.toml` the scripts care about
#[derive(Debug, Deserialize)]
struct MoveManifest {
    /// The `[package]` section
    package: ManifestPackage,
}

/// The `[package]` section of `Move.toml`
#[derive(Debug, Deserialize)]
struct ManifestPackage {
    /// The package name, which also names its build directory
    name: String,
}

/// Read the package name from the manifest in `package_dir`
pub fn read_package_name(package_dir: &Path) -> Result<String, DeployError> {
    let manifest_path = package_dir.join(MOVE_MANIFEST_FILE);
    let contents = fs::read_to_string(&manifest_path).map_err(|e| {
        DeployError::Build(format!("reading {}: {}", manifest_path.display(), e))
    })?;

    let manifest: MoveManifest = toml::from_str(&contents).map_err(|e| {
        DeployError::Build(format!("parsing {}: {}", manifest_path.display(), e))
    })?;

    Ok(manifest.package.name)
}

/// Read the compiled output of the package in `package_dir`.
///
/// Only the package's own modules are collected; dependency modules live in
/// sub-directories of `bytecode_modules` and are skipped.
pub fn read_build_artifact(package_dir: &Path) -> Result<BuildArtifact, DeployError> {
    let package_name = read_package_name(package_dir)?;
    let build_dir = package_dir.join(BUILD_PATH_SEGMENT).join(&package_name);

    let metadata_path = build_dir.join(PACKAGE_METADATA_FILE);
    let metadata = fs::read(&metadata_path).map_err(|e| {
        DeployError::Build(format!("reading {}: {}", metadata_path.display(), e))
    })?;

    let modules_dir = build_dir.join(BYTECODE_MODULES_PATH_SEGMENT);
    let module_paths: Vec<PathBuf> = fs::read_dir(&modules_dir)
        .map_err(|e| DeployError::Build(format!("reading {}: {}", modules_dir.display(), e)))?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            (path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == MOVE_MODULE_EXTENSION))
            .then_some(path)
        })
        .sorted()
        .collect();

    let modules = module_paths
        .into_iter()
        .map(read_module)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Read {} modules of package `{}`",
        modules.len(),
        package_name
    );

    Ok(BuildArtifact {
        package_name,
        package_dir: package_dir.to_path_buf(),
        metadata,
        modules,
    })
}

/// Read a single compiled module from disk
fn read_module(path: PathBuf) -> Result<CompiledModule, DeployError> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| DeployError::Build(format!("bad module path {}", path.display())))?;
    let bytecode = fs::read(&path)
        .map_err(|e| DeployError::Build(format!("reading {}: {}", path.display(), e)))?;

    Ok(CompiledModule {
        name,
        path,
        bytecode,
    })
}
