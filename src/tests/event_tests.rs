// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use alloy_primitives::{B256, U256};
use alloy_sol_types::SolEvent;

use crate::abi::contract::{AccountRegistry, Rollup};
use crate::error::KernelError;
use crate::events::{decode_event, EventKind, RollupEvent};
use crate::types::enums::BatchType;
use crate::types::id::{BatchId, PubkeyId};

#[test]
fn test_new_batch_event() {
    let event = Rollup::NewBatch {
        batchID: U256::from(17),
        accountRoot: B256::repeat_byte(4),
        batchType: 3,
    };
    let decoded = decode_event(&[Rollup::NewBatch::SIGNATURE_HASH], &event.encode_data()).unwrap();
    assert_eq!(
        decoded,
        Some(RollupEvent::NewBatch {
            batch_id: BatchId(17),
            account_root: B256::repeat_byte(4),
            batch_type: BatchType::Create2Transfer,
        })
    );
}

#[test]
fn test_new_batch_with_unknown_type() {
    let event = Rollup::NewBatch {
        batchID: U256::from(1),
        accountRoot: B256::ZERO,
        batchType: 7,
    };
    assert_eq!(
        decode_event(&[Rollup::NewBatch::SIGNATURE_HASH], &event.encode_data()),
        Err(KernelError::InvalidBatchType(7))
    );
}

#[test]
fn test_rollback_status_event() {
    let event = Rollup::RollbackStatus {
        startID: U256::from(40),
        nDeleted: U256::from(3),
        completed: true,
    };
    let decoded = decode_event(&[Rollup::RollbackStatus::SIGNATURE_HASH], &event.encode_data())
        .unwrap()
        .unwrap();
    assert_eq!(decoded.kind(), EventKind::RollbackStatus);
    assert_eq!(
        decoded,
        RollupEvent::RollbackStatus {
            start_id: BatchId(40),
            deleted: 3,
            completed: true
        }
    );
}

#[test]
fn test_registry_events() {
    let single = AccountRegistry::SinglePubkeyRegistered { pubkeyID: U256::from(5) };
    assert_eq!(
        decode_event(&[AccountRegistry::SinglePubkeyRegistered::SIGNATURE_HASH], &single.encode_data()).unwrap(),
        Some(RollupEvent::SinglePubkeyRegistered { pubkey_id: PubkeyId(5) })
    );

    let batch = AccountRegistry::BatchPubkeyRegistered {
        startID: U256::from(16),
        endID: U256::from(31),
    };
    assert_eq!(
        decode_event(&[AccountRegistry::BatchPubkeyRegistered::SIGNATURE_HASH], &batch.encode_data()).unwrap(),
        Some(RollupEvent::BatchPubkeyRegistered {
            start_id: PubkeyId(16),
            end_id: PubkeyId(31)
        })
    );
}

#[test]
fn test_foreign_logs_are_skipped() {
    assert_eq!(decode_event(&[B256::repeat_byte(1)], &[]).unwrap(), None);
    assert_eq!(decode_event(&[], &[]).unwrap(), None);
}

#[test]
fn test_truncated_payload_fails() {
    let result = decode_event(&[Rollup::DepositsFinalised::SIGNATURE_HASH], &[0u8; 8]);
    assert!(matches!(result, Err(KernelError::Decoding(_))));
}

#[test]
fn test_topic_table_covers_every_kind() {
    for kind in EventKind::ALL {
        assert_eq!(EventKind::from_topic(&kind.topic()), Some(kind));
    }
}
