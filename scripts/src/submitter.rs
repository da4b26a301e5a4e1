//! Signing and submitting entry function transactions through a node's REST API

use std::{
    fmt::{self, Display},
    time::Duration,
};

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

use crate::{
    constants::{
        DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_EXPIRATION_SECS, DEFAULT_GAS_UNIT_PRICE,
        DEFAULT_MAX_GAS_AMOUNT, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL,
        DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_BACKOFF, ED25519_SIGNATURE_TYPE,
        ENTRY_FUNCTION_PAYLOAD_TYPE, PENDING_TRANSACTION_TYPE,
    },
    errors::DeployError,
    types::{EntryFunctionCall, Network},
    utils::{decode_hex, encode_hex, parse_signing_key, validate_address},
};

/// Signs and submits an entry function call, resolving to the transaction hash
/// once the network has accepted it
#[async_trait]
pub trait TransactionSubmitter {
    /// Submit `call` on `network`
    async fn submit(&self, network: Network, call: &EntryFunctionCall)
        -> Result<String, DeployError>;
}

/// Tunables of the REST submitter
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// A node endpoint overriding the network's public fullnode
    pub node_url: Option<String>,
    /// The maximum number of gas units the transaction may consume
    pub max_gas_amount: u64,
    /// The price paid per gas unit
    pub gas_unit_price: u64,
    /// Seconds past the ledger time after which the transaction expires
    pub expiration_secs: u64,
    /// The timeout of a single request
    pub request_timeout: Duration,
    /// How long to wait for the transaction to be committed
    pub confirmation_timeout: Duration,
    /// The delay between transaction status polls
    pub poll_interval: Duration,
    /// How many times a transient request failure is retried
    pub max_retries: usize,
    /// The delay before a retry
    pub retry_backoff: Duration,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            node_url: None,
            max_gas_amount: DEFAULT_MAX_GAS_AMOUNT,
            gas_unit_price: DEFAULT_GAS_UNIT_PRICE,
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

// -------------
// | API types |
// -------------

/// The `GET /accounts/{address}` response
#[derive(Debug, Deserialize)]
struct AccountData {
    /// The next sequence number of the account, as a decimal string
    sequence_number: String,
}

/// The `GET /` ledger info response
#[derive(Debug, Deserialize)]
struct LedgerInfo {
    /// The ledger time in microseconds, as a decimal string
    ledger_timestamp: String,
}

/// The `POST /transactions` response
#[derive(Debug, Deserialize)]
struct SubmittedTransaction {
    /// The transaction hash
    hash: String,
}

/// The fields of `GET /transactions/by_hash/{hash}` needed to judge the outcome
#[derive(Debug, Deserialize)]
struct TransactionStatus {
    /// `pending_transaction` until committed
    #[serde(rename = "type")]
    kind: String,
    /// Whether execution succeeded, absent while pending
    #[serde(default)]
    success: Option<bool>,
    /// The VM status message, absent while pending
    #[serde(default)]
    vm_status: Option<String>,
}

/// The error body returned by the node
#[derive(Debug, Deserialize)]
struct ApiError {
    /// A human-readable description of the error
    message: String,
}

/// A failed request, classified by whether retrying it can help
#[derive(Debug)]
enum RequestFailure {
    /// Connectivity problems, timeouts, rate limiting and server errors
    Transient(String),
    /// The node rejected the request
    Rejected(String),
}

impl Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::Transient(s) | RequestFailure::Rejected(s) => write!(f, "{}", s),
        }
    }
}

// --------------
// | Submitter |
// --------------

/// Submits transactions signed by a single Ed25519 account through the node REST API
pub struct RestSubmitter {
    /// The HTTP client
    http: reqwest::Client,
    /// The key signing every transaction
    signing_key: SigningKey,
    /// The account the transactions are sent from
    sender: String,
    /// Gas, timeout and retry settings
    config: SubmitterConfig,
}

impl RestSubmitter {
    /// Sets up a submitter from the hex-encoded private key and address of the sender
    pub fn new(priv_key: &str, sender: &str, config: SubmitterConfig) -> Result<Self, DeployError> {
        let signing_key = parse_signing_key(priv_key)?;
        validate_address(sender)?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DeployError::Network(e.to_string()))?;

        Ok(Self {
            http,
            signing_key,
            sender: sender.to_string(),
            config,
        })
    }

    /// The REST endpoint used for `network`
    pub fn node_url(&self, network: Network) -> String {
        self.config
            .node_url
            .as_deref()
            .unwrap_or(network.default_node_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Fetch the next sequence number of the sender
    async fn sequence_number(&self, node: &str) -> Result<u64, DeployError> {
        let url = format!("{}/accounts/{}", node, self.sender);
        let account: AccountData = self
            .request_json("fetching account", || self.http.get(&url))
            .await?
            .ok_or_else(|| {
                DeployError::Network(format!("account {} does not exist", self.sender))
            })?;

        account
            .sequence_number
            .parse()
            .map_err(|e| DeployError::Network(format!("bad sequence number: {}", e)))
    }

    /// Fetch the ledger time in seconds
    async fn ledger_timestamp_secs(&self, node: &str) -> Result<u64, DeployError> {
        let info: LedgerInfo = self
            .request_json("fetching ledger info", || self.http.get(node))
            .await?
            .ok_or_else(|| DeployError::Network("ledger info not found".to_string()))?;

        let micros: u64 = info
            .ledger_timestamp
            .parse()
            .map_err(|e| DeployError::Network(format!("bad ledger timestamp: {}", e)))?;
        Ok(micros / 1_000_000)
    }

    /// Assemble the unsigned transaction request for `call`
    fn transaction_request(
        &self,
        call: &EntryFunctionCall,
        sequence_number: u64,
        expiration_timestamp_secs: u64,
    ) -> Value {
        json!({
            "sender": self.sender,
            "sequence_number": sequence_number.to_string(),
            "max_gas_amount": self.config.max_gas_amount.to_string(),
            "gas_unit_price": self.config.gas_unit_price.to_string(),
            "expiration_timestamp_secs": expiration_timestamp_secs.to_string(),
            "payload": {
                "type": ENTRY_FUNCTION_PAYLOAD_TYPE,
                "function": call.function_id(),
                "type_arguments": call.type_arguments,
                "arguments": call.arguments,
            },
        })
    }

    /// Have the node encode the request into the message to be signed, then sign it
    async fn sign(&self, node: &str, request: &Value) -> Result<Value, DeployError> {
        let url = format!("{}/transactions/encode_submission", node);
        let message: String = self
            .request_json("encoding transaction", || self.http.post(&url).json(request))
            .await?
            .ok_or_else(|| DeployError::Network("encode endpoint not found".to_string()))?;
        let message = decode_hex(&message)
            .map_err(|e| DeployError::Signing(format!("bad signing message: {}", e)))?;

        let signature = self.signing_key.sign(&message);
        let mut signed = request.clone();
        signed["signature"] = json!({
            "type": ED25519_SIGNATURE_TYPE,
            "public_key": encode_hex(&self.signing_key.verifying_key().to_bytes()),
            "signature": encode_hex(&signature.to_bytes()),
        });

        Ok(signed)
    }

    /// Poll the node until the transaction is committed, failing if it did not execute
    async fn wait_for_transaction(&self, node: &str, hash: &str) -> Result<(), DeployError> {
        let url = format!("{}/transactions/by_hash/{}", node, hash);
        // A timeout too large to represent means waiting indefinitely
        let deadline = Instant::now().checked_add(self.config.confirmation_timeout);

        loop {
            let status: Option<TransactionStatus> = self
                .request_json("fetching transaction", || self.http.get(&url))
                .await?;
            trace!("Transaction status: {:?}", status);

            // A missing or pending transaction has not been committed yet
            if let Some(status) = status.filter(|s| s.kind != PENDING_TRANSACTION_TYPE) {
                if status.success == Some(true) {
                    return Ok(());
                }

                return Err(DeployError::Network(format!(
                    "transaction {} failed: {}",
                    hash,
                    status
                        .vm_status
                        .unwrap_or_else(|| "unknown status".to_string())
                )));
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(DeployError::Network(format!(
                    "timed out after {:?} waiting for transaction {}",
                    self.config.confirmation_timeout, hash
                )));
            }
            sleep(self.config.poll_interval).await;
        }
    }

    /// Send a request, retrying transient failures up to `max_retries` times.
    ///
    /// Resolves to `None` if the node answers 404.
    async fn request_json<T: DeserializeOwned>(
        &self,
        what: &str,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Option<T>, DeployError> {
        let mut attempt = 0;
        loop {
            match Self::try_request(build()).await {
                Ok(value) => return Ok(value),
                Err(RequestFailure::Transient(e)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} failed ({}), retrying in {:?}",
                        what, e, self.config.retry_backoff
                    );
                    sleep(self.config.retry_backoff).await;
                }
                Err(e) => return Err(DeployError::Network(format!("{}: {}", what, e))),
            }
        }
    }

    /// Send a single request and decode the JSON response
    async fn try_request<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<Option<T>, RequestFailure> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                RequestFailure::Transient(e.to_string())
            } else {
                RequestFailure::Rejected(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            let message = format!("{}: {}", status, message);

            return Err(
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    RequestFailure::Transient(message)
                } else {
                    RequestFailure::Rejected(message)
                },
            );
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| RequestFailure::Rejected(format!("bad response body: {}", e)))
    }
}

#[async_trait]
impl TransactionSubmitter for RestSubmitter {
    async fn submit(
        &self,
        network: Network,
        call: &EntryFunctionCall,
    ) -> Result<String, DeployError> {
        let node = self.node_url(network);
        debug!("Submitting {} to {} via {}", call.function_id(), network, node);

        let sequence_number = self.sequence_number(&node).await?;
        let expiration = self.ledger_timestamp_secs(&node).await? + self.config.expiration_secs;
        let request = self.transaction_request(call, sequence_number, expiration);

        // The transaction is signed once, so a retried submission re-sends
        // the identical transaction
        let signed = self.sign(&node, &request).await?;
        let url = format!("{}/transactions", node);
        let SubmittedTransaction { hash } = self
            .request_json("submitting transaction", || self.http.post(&url).json(&signed))
            .await?
            .ok_or_else(|| DeployError::Network("submit endpoint not found".to_string()))?;

        info!("Transaction {} submitted, waiting for confirmation...", hash);
        self.wait_for_transaction(&node, &hash).await?;

        Ok(hash)
    }
}
