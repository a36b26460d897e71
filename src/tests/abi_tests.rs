// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Revert, SolCall, SolError};

use crate::abi::contract::{self, AccountRegistry, Rollup};
use crate::abi::*;
use crate::dispute::CommitmentInclusionProof;
use crate::error::KernelError;
use crate::tests::fixtures::*;
use crate::types::batch::ContractBatch;
use crate::types::commitment::{Commitment, CommitmentBody, DepositBody};
use crate::types::enums::BatchType;
use crate::types::id::BatchId;
use crate::types::state::SubtreeVacancyProof;

#[test]
fn test_submit_transfer_calldata() {
    let commitments = vec![transfer_commitment(1), transfer_commitment(2)];
    let data = encode_submit_batch(BatchType::Transfer, &commitments).unwrap();

    assert_eq!(&data[..4], Rollup::submitTransferCall::SELECTOR.as_slice());
    let call = Rollup::submitTransferCall::abi_decode(&data, true).unwrap();
    assert_eq!(call.stateRoots, vec![B256::repeat_byte(1), B256::repeat_byte(2)]);
    assert_eq!(call.feeReceivers, vec![U256::from(1), U256::from(2)]);
    assert_eq!(call.signatures[1], commitments[1].body.signature().unwrap().to_words());
    assert_eq!(call.txss[0], txs(1));
}

#[test]
fn test_submit_create2transfer_uses_own_selector() {
    let data = encode_submit_batch(BatchType::Create2Transfer, &[c2t_commitment(1)]).unwrap();
    assert_eq!(&data[..4], Rollup::submitCreate2TransferCall::SELECTOR.as_slice());
}

#[test]
fn test_submit_mass_migration_meta() {
    let data = encode_submit_batch(BatchType::MassMigration, &[mass_migration_commitment(5)]).unwrap();
    let call = Rollup::submitMassMigrationCall::abi_decode(&data, true).unwrap();

    assert_eq!(call.meta, vec![[U256::from(2), U256::from(1), U256::from(100), U256::from(5)]]);
    assert_eq!(call.withdrawRoots, vec![B256::repeat_byte(0xBB)]);
}

#[test]
fn test_submit_rejects_bad_batches() {
    assert!(matches!(
        encode_submit_batch(BatchType::Transfer, &[]),
        Err(KernelError::Encoding(_))
    ));
    assert!(matches!(
        encode_submit_batch(BatchType::Transfer, &[c2t_commitment(1)]),
        Err(KernelError::Encoding(_))
    ));
    let genesis = Commitment::new(B256::ZERO, CommitmentBody::Genesis);
    assert!(matches!(
        encode_submit_batch(BatchType::Genesis, &[genesis]),
        Err(KernelError::Encoding(_))
    ));
}

#[test]
fn test_submit_deposits_calldata() {
    let previous_batch = transfer_batch(3, 3);
    let previous = CommitmentInclusionProof::for_commitment(&previous_batch, 2).unwrap();
    let vacant = SubtreeVacancyProof {
        path_at_depth: 7,
        witness: vec![B256::repeat_byte(4), B256::repeat_byte(5)],
    };

    let data = encode_submit_deposits(&previous, &vacant);
    assert_eq!(&data[..4], Rollup::submitDepositsCall::SELECTOR.as_slice());
    let call = Rollup::submitDepositsCall::abi_decode(&data, true).unwrap();
    assert_eq!(call.previous.path, U256::from(2));
    assert_eq!(call.previous.commitment.stateRoot, previous.state_root);
    assert_eq!(call.previous.witness, previous.witness);
    assert_eq!(call.vacant.pathAtDepth, U256::from(7));
    assert_eq!(call.vacant.witness, vacant.witness);
}

#[test]
fn test_deposit_batches_use_their_own_call() {
    let deposit = Commitment::new(
        B256::repeat_byte(1),
        CommitmentBody::Deposit(DepositBody {
            subtree_id: U256::from(1),
            subtree_root: B256::repeat_byte(2),
        }),
    );
    match encode_submit_batch(BatchType::Deposit, &[deposit]) {
        Err(KernelError::Encoding(msg)) => assert!(msg.contains("encode_submit_deposits")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_register_batch_calldata() {
    let keys: Vec<_> = (1..=16).map(|seed| wallet(seed).public_key()).collect();
    let data = encode_register_batch(&keys).unwrap();

    assert_eq!(&data[..4], AccountRegistry::registerBatchCall::SELECTOR.as_slice());
    let call = AccountRegistry::registerBatchCall::abi_decode(&data, true).unwrap();
    assert_eq!(call.pubkeys[0], keys[0].to_words());
    assert_eq!(call.pubkeys[15], keys[15].to_words());

    assert!(matches!(encode_register_batch(&keys[..15]), Err(KernelError::Encoding(_))));
    assert!(matches!(encode_register_batch(&[]), Err(KernelError::Encoding(_))));
}

#[test]
fn test_simple_transactions() {
    assert_eq!(
        encode_keep_rolling_back().as_ref(),
        Rollup::keepRollingBackCall::SELECTOR.as_slice()
    );

    let withdraw = Rollup::withdrawStakeCall::abi_decode(&encode_withdraw_stake(BatchId(12)), true).unwrap();
    assert_eq!(withdraw.batchID, U256::from(12));

    let key = wallet(1).public_key();
    let register = AccountRegistry::registerCall::abi_decode(&encode_register_pubkey(&key), true).unwrap();
    assert_eq!(register.pubkey, key.to_words());
}

#[test]
fn test_invalid_batch_marker_decoding() {
    let healthy = Rollup::invalidBatchMarkerCall::abi_encode_returns(&(U256::ZERO,));
    assert_eq!(decode_invalid_batch_marker(&healthy).unwrap(), None);

    let rolling = Rollup::invalidBatchMarkerCall::abi_encode_returns(&(U256::from(5),));
    assert_eq!(decode_invalid_batch_marker(&rolling).unwrap(), Some(BatchId(5)));

    assert!(matches!(decode_invalid_batch_marker(&[1, 2, 3]), Err(KernelError::Decoding(_))));
}

#[test]
fn test_get_batch_decoding() {
    let expected = ContractBatch {
        id: BatchId(3),
        hash: B256::repeat_byte(9),
        batch_type: BatchType::Transfer,
        size: 2,
        committer: Address::repeat_byte(1),
        finalisation_block: 640,
    };
    let returned = Rollup::getBatchCall::abi_encode_returns(&(contract::Batch {
        commitmentRoot: expected.hash,
        meta: expected.meta(),
    },));

    assert_eq!(decode_get_batch(BatchId(3), &returned).unwrap(), expected);

    let call = Rollup::getBatchCall::abi_decode(&encode_get_batch(BatchId(3)), true).unwrap();
    assert_eq!(call.batchID, U256::from(3));
}

#[test]
fn test_next_batch_id_decoding() {
    let returned = Rollup::nextBatchIDCall::abi_encode_returns(&(U256::from(44),));
    assert_eq!(decode_next_batch_id(&returned).unwrap(), BatchId(44));
    assert_eq!(&encode_next_batch_id()[..], Rollup::nextBatchIDCall::SELECTOR.as_slice());
}

#[test]
fn test_revert_reason_decoding() {
    let data = Revert {
        reason: "Commitment not present in batch".into(),
    }
    .abi_encode();
    assert_eq!(
        decode_revert_reason(&data).as_deref(),
        Some("Commitment not present in batch")
    );
    assert_eq!(decode_revert_reason(&[]), None);
}
