//! Constants used in the upgrade scripts

use std::time::Duration;

/// The application key of the contract managed by these scripts
pub const JUNGLE_RUN_APP_KEY: &str = "jungle_run";

/// The `jungle_run` contract address on mainnet, empty while unpublished
pub const JUNGLE_RUN_MAINNET_ADDRESS: &str = "";

/// The `jungle_run` contract address on testnet
pub const JUNGLE_RUN_TESTNET_ADDRESS: &str =
    "0x80ecb10bc51544c131b74e90a33977ed99378f56065d964f5d17b961674d82af";

/// The `jungle_run` contract address on devnet, empty while unpublished
pub const JUNGLE_RUN_DEVNET_ADDRESS: &str = "";

/// The module exposing the upgrade entry function
pub const DEFAULT_MODULE_NAME: &str = "assets";

/// The entry function invoked to upgrade the contract
pub const UPGRADE_FUNCTION_NAME: &str = "upgrade_contract";

/// The default directory, relative to the working directory, holding the Move package
pub const DEFAULT_PACKAGE_DIR: &str = "contract";

/// The mainnet fullnode REST endpoint
pub const MAINNET_NODE_URL: &str = "https://fullnode.mainnet.aptoslabs.com/v1";

/// The testnet fullnode REST endpoint
pub const TESTNET_NODE_URL: &str = "https://fullnode.testnet.aptoslabs.com/v1";

/// The devnet fullnode REST endpoint
pub const DEVNET_NODE_URL: &str = "https://fullnode.devnet.aptoslabs.com/v1";

// ---------
// | Build |
// ---------

/// The name of the Aptos CLI command
pub const APTOS_COMMAND: &str = "aptos";

/// The Move subcommand of the Aptos CLI
pub const MOVE_SUBCOMMAND: &str = "move";

/// The compile command
pub const COMPILE_COMMAND: &str = "compile";

/// The flag instructing the compiler to emit the package metadata
pub const SAVE_METADATA_FLAG: &str = "--save-metadata";

/// The name of the Move package manifest
pub const MOVE_MANIFEST_FILE: &str = "Move.toml";

/// The name of the build directory
pub const BUILD_PATH_SEGMENT: &str = "build";

/// The name of the directory holding compiled modules
pub const BYTECODE_MODULES_PATH_SEGMENT: &str = "bytecode_modules";

/// The name of the serialized package metadata file
pub const PACKAGE_METADATA_FILE: &str = "package-metadata.bcs";

/// The extension of a compiled Move module
pub const MOVE_MODULE_EXTENSION: &str = "mv";

/// The magic bytes every compiled Move module starts with
pub const MOVE_MAGIC: [u8; 4] = [0xA1, 0x1C, 0xEB, 0x0B];

// ----------
// | Submit |
// ----------

/// The default maximum amount of gas units the upgrade may consume
pub const DEFAULT_MAX_GAS_AMOUNT: u64 = 200_000;

/// The default price per gas unit, in octas
pub const DEFAULT_GAS_UNIT_PRICE: u64 = 100;

/// How long after the current ledger time a submitted transaction stays valid
pub const DEFAULT_EXPIRATION_SECS: u64 = 600;

/// The timeout applied to every individual request to the node
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for a submitted transaction to be committed
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 60;

/// The interval at which the node is polled for the transaction status
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The number of times a transient request failure is retried
pub const DEFAULT_MAX_RETRIES: usize = 1;

/// The delay before retrying a transient request failure
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// The signature scheme tag expected by the node
pub const ED25519_SIGNATURE_TYPE: &str = "ed25519_signature";

/// The payload tag of an entry function call
pub const ENTRY_FUNCTION_PAYLOAD_TYPE: &str = "entry_function_payload";

/// The transaction type reported for a transaction still in mempool
pub const PENDING_TRANSACTION_TYPE: &str = "pending_transaction";

/// The prefix used by newer tooling when exporting Ed25519 private keys
pub const ED25519_PRIVATE_KEY_PREFIX: &str = "ed25519-priv-";

/// The number of hex digits in a full account address
pub const ADDRESS_HEX_LENGTH: usize = 64;
