mod common;

use std::time::{Duration, Instant};

use alloy_primitives::B256;
use common::*;
use settlement_node::chain::Receipt;
use settlement_node::errors::{ChainError, WaitError};

#[tokio::test]
async fn test_timeout_is_a_hard_deadline() {
    let h = harness().await;
    let hash = B256::repeat_byte(9);

    let started = Instant::now();
    let err = h.waiter.wait_mined(hash, Duration::from_millis(50)).await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(
        err,
        WaitError::Timeout {
            hash,
            after: Duration::from_millis(50)
        }
    );
    assert!(elapsed >= Duration::from_millis(50), "returned early: {:?}", elapsed);
    assert!(elapsed <= Duration::from_millis(70), "returned late: {:?}", elapsed);
    assert!(h.chain.with(|s| s.receipt_lookups) > 1);
}

#[tokio::test]
async fn test_wait_is_idempotent_and_read_only() {
    let h = harness().await;
    let hash = B256::repeat_byte(1);
    h.chain.mine(hash, true, Vec::new());

    let first = h.waiter.wait_mined(hash, MINE_TIMEOUT).await.unwrap();
    let second = h.waiter.wait_mined(hash, MINE_TIMEOUT).await.unwrap();

    assert_eq!(first, second);
    assert!(h.chain.sent_nonces().is_empty());
    assert_eq!(h.chain.with(|s| s.receipt_lookups), 2);
}

#[tokio::test]
async fn test_unmined_receipt_is_interim() {
    let h = harness().await;
    let hash = B256::repeat_byte(2);
    h.chain.with(|s| {
        s.receipts.insert(
            hash,
            Receipt {
                transaction_hash: hash,
                block_number: None,
                status: false,
                gas_used: None,
                logs: Vec::new(),
            },
        )
    });

    let chain = h.chain.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        chain.mine(hash, true, Vec::new());
    });

    let receipt = h.waiter.wait_mined(hash, MINE_TIMEOUT).await.unwrap();
    assert!(receipt.is_mined());
    assert!(receipt.succeeded());
}

#[tokio::test]
async fn test_wait_many_keeps_input_order() {
    let h = harness().await;
    let hashes = [B256::repeat_byte(1), B256::repeat_byte(2), B256::repeat_byte(3)];

    // Mine in reverse order.
    let chain = h.chain.clone();
    tokio::spawn(async move {
        for (i, hash) in hashes.iter().rev().enumerate() {
            tokio::time::sleep(Duration::from_millis(10 * (i as u64 + 1))).await;
            chain.mine(*hash, true, Vec::new());
        }
    });

    let receipts = h.waiter.wait_many_mined(&hashes, MINE_TIMEOUT).await.unwrap();
    let got: Vec<B256> = receipts.iter().map(|r| r.transaction_hash).collect();
    assert_eq!(got, hashes.to_vec());
}

#[tokio::test]
async fn test_wait_many_fails_on_any_timeout() {
    let h = harness().await;
    let mined = B256::repeat_byte(1);
    let missing = B256::repeat_byte(2);
    h.chain.mine(mined, true, Vec::new());

    let err = h
        .waiter
        .wait_many_mined(&[mined, missing], Duration::from_millis(40))
        .await
        .unwrap_err();
    assert!(matches!(err, WaitError::Timeout { hash, .. } if hash == missing));
}

#[tokio::test]
async fn test_transport_error_is_not_a_timeout() {
    let h = harness().await;
    h.chain
        .with(|s| s.receipt_error = Some(ChainError::Transport("connection refused".into())));

    let err = h
        .waiter
        .wait_mined(B256::repeat_byte(4), MINE_TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err, WaitError::Chain(ChainError::Transport("connection refused".into())));
}
