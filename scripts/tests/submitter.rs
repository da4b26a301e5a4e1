//! Tests of the REST submitter against a mock node

use std::time::Duration;

use ed25519_dalek::{Signer, SigningKey};
use eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use upgrade_scripts::{
    errors::DeployError,
    submitter::{RestSubmitter, SubmitterConfig, TransactionSubmitter},
    types::{EntryFunctionCall, Network},
    utils::{encode_hex, parse_signing_key},
};

/// A fixed test key, never used on a live network
const TEST_KEY: &str = "0x9bf49a6a0755f953811fce125f2683d50429c3bb49e074147e0089a52eae155f";
/// The sender of the test transactions
const SENDER: &str = "0xcafe";
/// The hash returned by the mock node
const TX_HASH: &str = "0xabc123";
/// The signing message returned by the mock node
const SIGNING_MESSAGE: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];

fn config(server: &MockServer) -> SubmitterConfig {
    SubmitterConfig {
        node_url: Some(server.url("/v1")),
        confirmation_timeout: Duration::from_millis(500),
        poll_interval: Duration::from_millis(10),
        retry_backoff: Duration::from_millis(10),
        ..Default::default()
    }
}

fn upgrade_call() -> EntryFunctionCall {
    EntryFunctionCall {
        module_id: "0x42::assets".to_string(),
        function: "upgrade_contract".to_string(),
        type_arguments: vec![],
        arguments: vec![json!("0x0102"), json!(["0xa11ceb0b"])],
    }
}

/// Mock the account, ledger info and encoding endpoints
fn mock_prelude(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path(format!("/v1/accounts/{SENDER}"));
        then.status(200).json_body(json!({
            "sequence_number": "7",
            "authentication_key": "0x00",
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1");
        then.status(200).json_body(json!({
            "chain_id": 2,
            "ledger_timestamp": "1700000000000000",
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/v1/transactions/encode_submission");
        then.status(200)
            .json_body(json!(encode_hex(&SIGNING_MESSAGE)));
    });
}

/// Mock the submission endpoint
fn mock_submit(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path("/v1/transactions");
        then.status(202).json_body(json!({ "hash": TX_HASH }));
    })
}

/// Mock the transaction status endpoint
fn mock_status(server: &MockServer, body: serde_json::Value) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v1/transactions/by_hash/{TX_HASH}"));
        then.status(200).json_body(body);
    })
}

#[tokio::test]
async fn test_submit_signs_and_waits_for_commit() -> Result<()> {
    let server = MockServer::start();
    mock_prelude(&server);

    let key: SigningKey = parse_signing_key(TEST_KEY)?;
    let signature = key.sign(&SIGNING_MESSAGE);
    let submit = server.mock(|when, then| {
        when.method(POST).path("/v1/transactions").json_body_includes(
            json!({
                "sender": SENDER,
                "sequence_number": "7",
                "expiration_timestamp_secs": "1700000600",
                "signature": {
                    "type": "ed25519_signature",
                    "public_key": encode_hex(&key.verifying_key().to_bytes()),
                    "signature": encode_hex(&signature.to_bytes()),
                },
            })
            .to_string(),
        );
        then.status(202).json_body(json!({ "hash": TX_HASH }));
    });
    let status = mock_status(
        &server,
        json!({
            "type": "user_transaction",
            "hash": TX_HASH,
            "success": true,
            "vm_status": "Executed successfully",
        }),
    );

    let submitter = RestSubmitter::new(TEST_KEY, SENDER, config(&server))?;
    let hash = submitter.submit(Network::Testnet, &upgrade_call()).await?;

    assert_eq!(hash, TX_HASH);
    assert_eq!(submit.calls(), 1);
    assert_eq!(status.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_failed_execution_is_network_error() -> Result<()> {
    let server = MockServer::start();
    mock_prelude(&server);
    mock_submit(&server);
    mock_status(
        &server,
        json!({
            "type": "user_transaction",
            "hash": TX_HASH,
            "success": false,
            "vm_status": "Move abort in 0x42::assets: ENOT_ADMIN(0x1)",
        }),
    );

    let submitter = RestSubmitter::new(TEST_KEY, SENDER, config(&server))?;
    let err = submitter
        .submit(Network::Testnet, &upgrade_call())
        .await
        .unwrap_err();

    match err {
        DeployError::Network(msg) => assert!(msg.contains("ENOT_ADMIN")),
        other => panic!("unexpected error: {other}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_pending_transaction_times_out() -> Result<()> {
    let server = MockServer::start();
    mock_prelude(&server);
    mock_submit(&server);
    let status = mock_status(
        &server,
        json!({ "type": "pending_transaction", "hash": TX_HASH }),
    );

    let submitter = RestSubmitter::new(TEST_KEY, SENDER, config(&server))?;
    let err = submitter
        .submit(Network::Testnet, &upgrade_call())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Network(_)));
    assert!(status.calls() > 1);

    Ok(())
}

#[tokio::test]
async fn test_unbounded_confirmation_timeout() -> Result<()> {
    let server = MockServer::start();
    mock_prelude(&server);
    mock_submit(&server);
    mock_status(
        &server,
        json!({
            "type": "user_transaction",
            "hash": TX_HASH,
            "success": true,
            "vm_status": "Executed successfully",
        }),
    );

    let config = SubmitterConfig {
        confirmation_timeout: Duration::from_secs(u64::MAX),
        ..config(&server)
    };
    let submitter = RestSubmitter::new(TEST_KEY, SENDER, config)?;
    let hash = submitter.submit(Network::Testnet, &upgrade_call()).await?;

    assert_eq!(hash, TX_HASH);

    Ok(())
}

#[tokio::test]
async fn test_unknown_transaction_keeps_polling() -> Result<()> {
    let server = MockServer::start();
    mock_prelude(&server);
    mock_submit(&server);

    // The node does not know the transaction until it has been indexed
    let mut missing = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v1/transactions/by_hash/{TX_HASH}"));
        then.status(404).json_body(json!({
            "message": "Transaction not found",
            "error_code": "transaction_not_found",
        }));
    });

    let submitter = RestSubmitter::new(TEST_KEY, SENDER, config(&server))?;
    let submission = tokio::spawn(async move {
        submitter.submit(Network::Testnet, &upgrade_call()).await
    });

    while missing.calls() < 2 && !submission.is_finished() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    missing.delete();
    let status = mock_status(
        &server,
        json!({
            "type": "user_transaction",
            "hash": TX_HASH,
            "success": true,
            "vm_status": "Executed successfully",
        }),
    );

    let hash = submission.await??;
    assert_eq!(hash, TX_HASH);
    assert!(status.calls() >= 1);

    Ok(())
}

#[tokio::test]
async fn test_transient_failure_retried_once() -> Result<()> {
    let server = MockServer::start();
    let account = server.mock(|when, then| {
        when.method(GET).path(format!("/v1/accounts/{SENDER}"));
        then.status(503).body("upstream unavailable");
    });

    let submitter = RestSubmitter::new(TEST_KEY, SENDER, config(&server))?;
    let err = submitter
        .submit(Network::Testnet, &upgrade_call())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Network(_)));
    assert_eq!(account.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_rejection_not_retried() -> Result<()> {
    let server = MockServer::start();
    mock_prelude(&server);
    let submit = server.mock(|when, then| {
        when.method(POST).path("/v1/transactions");
        then.status(400).json_body(json!({
            "message": "Invalid transaction: SEQUENCE_NUMBER_TOO_OLD",
            "error_code": "vm_error",
        }));
    });

    let submitter = RestSubmitter::new(TEST_KEY, SENDER, config(&server))?;
    let err = submitter
        .submit(Network::Testnet, &upgrade_call())
        .await
        .unwrap_err();

    match err {
        DeployError::Network(msg) => assert!(msg.contains("SEQUENCE_NUMBER_TOO_OLD")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(submit.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_malformed_request_not_retried() -> Result<()> {
    let config = SubmitterConfig {
        node_url: Some("not a url".to_string()),
        retry_backoff: Duration::from_secs(30),
        ..Default::default()
    };
    let submitter = RestSubmitter::new(TEST_KEY, SENDER, config)?;

    // A retry would sleep through the backoff first
    let err = tokio::time::timeout(
        Duration::from_secs(5),
        submitter.submit(Network::Testnet, &upgrade_call()),
    )
    .await?
    .unwrap_err();

    assert!(matches!(err, DeployError::Network(_)));

    Ok(())
}

#[test]
fn test_bad_credentials_rejected() {
    let config = SubmitterConfig::default();

    assert!(matches!(
        RestSubmitter::new("0xnothex", SENDER, config.clone()),
        Err(DeployError::Signing(_))
    ));
    assert!(matches!(
        RestSubmitter::new(TEST_KEY, "cafe", config),
        Err(DeployError::Configuration(_))
    ));
}

#[test]
fn test_node_url_per_network() -> Result<()> {
    let submitter = RestSubmitter::new(TEST_KEY, SENDER, SubmitterConfig::default())?;
    assert_eq!(
        submitter.node_url(Network::Mainnet),
        "https://fullnode.mainnet.aptoslabs.com/v1"
    );

    let submitter = RestSubmitter::new(
        TEST_KEY,
        SENDER,
        SubmitterConfig {
            node_url: Some("http://localhost:8080/v1/".to_string()),
            ..Default::default()
        },
    )?;
    assert_eq!(
        submitter.node_url(Network::Devnet),
        "http://localhost:8080/v1"
    );

    Ok(())
}
