// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Decoding of settlement-contract logs into typed events.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::abi::contract::{AccountRegistry, Rollup};
use crate::abi::word_to_u64;
use crate::error::{KernelError, Result};
use crate::types::enums::BatchType;
use crate::types::id::{BatchId, PubkeyId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewBatch,
    DepositsFinalised,
    RollbackStatus,
    StakeWithdraw,
    SinglePubkeyRegistered,
    BatchPubkeyRegistered,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::NewBatch,
        EventKind::DepositsFinalised,
        EventKind::RollbackStatus,
        EventKind::StakeWithdraw,
        EventKind::SinglePubkeyRegistered,
        EventKind::BatchPubkeyRegistered,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::NewBatch => "NewBatch",
            EventKind::DepositsFinalised => "DepositsFinalised",
            EventKind::RollbackStatus => "RollbackStatus",
            EventKind::StakeWithdraw => "StakeWithdraw",
            EventKind::SinglePubkeyRegistered => "SinglePubkeyRegistered",
            EventKind::BatchPubkeyRegistered => "BatchPubkeyRegistered",
        }
    }

    /// First log topic (event signature hash).
    pub fn topic(&self) -> B256 {
        match self {
            EventKind::NewBatch => Rollup::NewBatch::SIGNATURE_HASH,
            EventKind::DepositsFinalised => Rollup::DepositsFinalised::SIGNATURE_HASH,
            EventKind::RollbackStatus => Rollup::RollbackStatus::SIGNATURE_HASH,
            EventKind::StakeWithdraw => Rollup::StakeWithdraw::SIGNATURE_HASH,
            EventKind::SinglePubkeyRegistered => AccountRegistry::SinglePubkeyRegistered::SIGNATURE_HASH,
            EventKind::BatchPubkeyRegistered => AccountRegistry::BatchPubkeyRegistered::SIGNATURE_HASH,
        }
    }

    pub fn from_topic(topic: &B256) -> Option<Self> {
        EVENT_TOPICS.get(topic).copied()
    }
}

static EVENT_TOPICS: Lazy<FxHashMap<B256, EventKind>> =
    Lazy::new(|| EventKind::ALL.iter().map(|kind| (kind.topic(), *kind)).collect());

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollupEvent {
    NewBatch {
        batch_id: BatchId,
        account_root: B256,
        batch_type: BatchType,
    },
    DepositsFinalised {
        subtree_id: U256,
        subtree_root: B256,
        path_to_subtree: U256,
    },
    RollbackStatus {
        start_id: BatchId,
        deleted: u64,
        completed: bool,
    },
    StakeWithdraw {
        committer: Address,
        batch_id: BatchId,
    },
    SinglePubkeyRegistered {
        pubkey_id: PubkeyId,
    },
    BatchPubkeyRegistered {
        start_id: PubkeyId,
        end_id: PubkeyId,
    },
}

impl RollupEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RollupEvent::NewBatch { .. } => EventKind::NewBatch,
            RollupEvent::DepositsFinalised { .. } => EventKind::DepositsFinalised,
            RollupEvent::RollbackStatus { .. } => EventKind::RollbackStatus,
            RollupEvent::StakeWithdraw { .. } => EventKind::StakeWithdraw,
            RollupEvent::SinglePubkeyRegistered { .. } => EventKind::SinglePubkeyRegistered,
            RollupEvent::BatchPubkeyRegistered { .. } => EventKind::BatchPubkeyRegistered,
        }
    }
}

/// Decode one log. `Ok(None)` for logs that are not settlement events.
pub fn decode_event(topics: &[B256], data: &[u8]) -> Result<Option<RollupEvent>> {
    let kind = match topics.first().and_then(EventKind::from_topic) {
        Some(kind) => kind,
        None => return Ok(None),
    };
    let topics = topics.iter().copied();
    let bad = |e: alloy_sol_types::Error| KernelError::Decoding(format!("{}: {}", kind.name(), e));

    let event = match kind {
        EventKind::NewBatch => {
            let ev = Rollup::NewBatch::decode_raw_log(topics, data, true).map_err(bad)?;
            RollupEvent::NewBatch {
                batch_id: BatchId(word_to_u64(ev.batchID)?),
                account_root: ev.accountRoot,
                batch_type: BatchType::from_u8(ev.batchType).ok_or(KernelError::InvalidBatchType(ev.batchType))?,
            }
        }
        EventKind::DepositsFinalised => {
            let ev = Rollup::DepositsFinalised::decode_raw_log(topics, data, true).map_err(bad)?;
            RollupEvent::DepositsFinalised {
                subtree_id: ev.subtreeID,
                subtree_root: ev.depositSubTreeRoot,
                path_to_subtree: ev.pathToSubTree,
            }
        }
        EventKind::RollbackStatus => {
            let ev = Rollup::RollbackStatus::decode_raw_log(topics, data, true).map_err(bad)?;
            RollupEvent::RollbackStatus {
                start_id: BatchId(word_to_u64(ev.startID)?),
                deleted: word_to_u64(ev.nDeleted)?,
                completed: ev.completed,
            }
        }
        EventKind::StakeWithdraw => {
            let ev = Rollup::StakeWithdraw::decode_raw_log(topics, data, true).map_err(bad)?;
            RollupEvent::StakeWithdraw {
                committer: ev.committed,
                batch_id: BatchId(word_to_u64(ev.batchID)?),
            }
        }
        EventKind::SinglePubkeyRegistered => {
            let ev = AccountRegistry::SinglePubkeyRegistered::decode_raw_log(topics, data, true).map_err(bad)?;
            RollupEvent::SinglePubkeyRegistered {
                pubkey_id: PubkeyId(word_to_u32(ev.pubkeyID)?),
            }
        }
        EventKind::BatchPubkeyRegistered => {
            let ev = AccountRegistry::BatchPubkeyRegistered::decode_raw_log(topics, data, true).map_err(bad)?;
            RollupEvent::BatchPubkeyRegistered {
                start_id: PubkeyId(word_to_u32(ev.startID)?),
                end_id: PubkeyId(word_to_u32(ev.endID)?),
            }
        }
    };
    Ok(Some(event))
}

fn word_to_u32(word: U256) -> Result<u32> {
    u32::try_from(word).map_err(|_| KernelError::Decoding(format!("{} does not fit in u32", word)))
}
