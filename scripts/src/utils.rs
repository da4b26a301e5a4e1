//! Utilities for the upgrade scripts.

use std::process::{Command, Stdio};

use ed25519_dalek::{SigningKey, SECRET_KEY_LENGTH};

use crate::{
    constants::{ADDRESS_HEX_LENGTH, ED25519_PRIVATE_KEY_PREFIX},
    errors::DeployError,
};

/// Strip an optional `0x` prefix from a hex string
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// Decode a hex string, with or without a `0x` prefix
pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_hex_prefix(s.trim()))
}

/// Encode bytes as a `0x`-prefixed hex string
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Check that `address` is a `0x`-prefixed account address of at most 64 hex digits
pub fn validate_address(address: &str) -> Result<(), DeployError> {
    let digits = address.strip_prefix("0x").ok_or_else(|| {
        DeployError::Configuration(format!("address `{}` is missing the 0x prefix", address))
    })?;

    if digits.is_empty()
        || digits.len() > ADDRESS_HEX_LENGTH
        || !digits.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(DeployError::Configuration(format!(
            "`{}` is not a valid account address",
            address
        )));
    }

    Ok(())
}

/// Parse a hex-encoded Ed25519 private key.
///
/// Accepts the raw 32-byte secret with an optional `0x` prefix, as well as the
/// `ed25519-priv-0x...` form emitted by newer tooling.
pub fn parse_signing_key(priv_key: &str) -> Result<SigningKey, DeployError> {
    let priv_key = priv_key.trim();
    let priv_key = priv_key
        .strip_prefix(ED25519_PRIVATE_KEY_PREFIX)
        .unwrap_or(priv_key);

    let bytes = decode_hex(priv_key).map_err(|e| DeployError::Signing(e.to_string()))?;
    let secret: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|bytes: Vec<u8>| {
        DeployError::Signing(format!(
            "expected a {}-byte private key, got {} bytes",
            SECRET_KEY_LENGTH,
            bytes.len()
        ))
    })?;

    Ok(SigningKey::from_bytes(&secret))
}

/// Run `cmd` with inherited stdio, mapping a spawn failure or
/// a non-zero exit status to a build error
pub fn command_success_or(mut cmd: Command, err_msg: &str) -> Result<(), DeployError> {
    cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    let status = cmd
        .status()
        .map_err(|e| DeployError::Build(format!("{}: {}", err_msg, e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(DeployError::Build(format!("{} ({})", err_msg, status)))
    }
}
