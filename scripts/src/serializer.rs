//! Transforming build artifacts into the upgrade payload

use crate::{
    constants::MOVE_MAGIC,
    errors::DeployError,
    types::{BuildArtifact, SerializedPackage},
};

/// Transforms a build artifact into the `[meta, bytecodes]` upgrade payload
pub trait PackageSerializer {
    /// Serialize `artifact`, failing if it is structurally invalid
    fn serialize(&self, artifact: &BuildArtifact) -> Result<SerializedPackage, DeployError>;
}

/// Serializes compiled Move packages, checking every module carries
/// the Move bytecode header
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveBytecodeSerializer;

impl PackageSerializer for MoveBytecodeSerializer {
    fn serialize(&self, artifact: &BuildArtifact) -> Result<SerializedPackage, DeployError> {
        if artifact.metadata.is_empty() {
            return Err(DeployError::Serialization(format!(
                "package `{}` has no metadata",
                artifact.package_name
            )));
        }
        if artifact.modules.is_empty() {
            return Err(DeployError::Serialization(format!(
                "package `{}` has no modules",
                artifact.package_name
            )));
        }

        let bytecodes = artifact
            .modules
            .iter()
            .map(|module| {
                if !module.bytecode.starts_with(&MOVE_MAGIC) {
                    return Err(DeployError::Serialization(format!(
                        "module `{}` is not valid Move bytecode",
                        module.name
                    )));
                }
                Ok(module.bytecode.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SerializedPackage {
            meta: artifact.metadata.clone(),
            bytecodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::types::CompiledModule;

    /// A module whose bytecode is the Move header followed by `body`
    fn module(name: &str, body: &[u8]) -> CompiledModule {
        let mut bytecode = MOVE_MAGIC.to_vec();
        bytecode.extend_from_slice(body);
        CompiledModule {
            name: name.to_string(),
            path: PathBuf::from(format!("build/JungleRun/bytecode_modules/{name}.mv")),
            bytecode,
        }
    }

    /// A package artifact holding `modules`
    fn artifact(modules: Vec<CompiledModule>) -> BuildArtifact {
        BuildArtifact {
            package_name: "JungleRun".to_string(),
            package_dir: PathBuf::from("contract"),
            metadata: vec![0x0a, 0x0b],
            modules,
        }
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let artifact = artifact(vec![module("assets", &[1, 2]), module("game", &[3])]);

        let first = MoveBytecodeSerializer.serialize(&artifact).unwrap();
        let second = MoveBytecodeSerializer.serialize(&artifact).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.meta, artifact.metadata);
        assert_eq!(first.bytecodes.len(), 2);
        assert_eq!(first.bytecodes[1], artifact.modules[1].bytecode);
    }

    #[test]
    fn test_entry_arguments_are_hex() {
        let artifact = artifact(vec![module("assets", &[0xff])]);
        let serialized = MoveBytecodeSerializer.serialize(&artifact).unwrap();

        assert_eq!(
            serialized.to_entry_arguments(),
            vec![json!("0x0a0b"), json!(["0xa11ceb0bff"])]
        );
    }

    #[test]
    fn test_rejects_empty_package() {
        let err = MoveBytecodeSerializer
            .serialize(&artifact(vec![]))
            .unwrap_err();
        assert!(matches!(err, DeployError::Serialization(_)));

        let mut no_meta = artifact(vec![module("assets", &[])]);
        no_meta.metadata.clear();
        let err = MoveBytecodeSerializer.serialize(&no_meta).unwrap_err();
        assert!(matches!(err, DeployError::Serialization(_)));
    }

    #[test]
    fn test_rejects_non_move_module() {
        let mut bad = module("assets", &[]);
        bad.bytecode = b"not bytecode".to_vec();

        let err = MoveBytecodeSerializer
            .serialize(&artifact(vec![bad]))
            .unwrap_err();
        assert!(matches!(err, DeployError::Serialization(_)));
    }
}
