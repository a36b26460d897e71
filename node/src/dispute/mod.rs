// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Dispute and rollback protocol.
//!
//! ```text
//! BUILD (kernel) -> SUBMIT -> MINED_OK
//!                          -> MINED_REVERTED -> CLASSIFY -> BENIGN | REAL_FAILURE | UNKNOWN
//! ```
//!
//! Benign outcomes are races another actor already resolved. They come back
//! as `Ok` variants and are only logged.

pub mod classify;
pub mod watcher;

use std::time::Duration;

use alloy_primitives::B256;
use settlement_kernel::dispute::DisputeTarget;
use settlement_kernel::events::{decode_event, RollupEvent};
use settlement_kernel::types::BatchId;
use tracing::{error, info, warn};

use crate::chain::{BlockTag, Receipt};
use crate::config::CommanderConfig;
use crate::errors::{ChainError, DisputeError};
use crate::rollup::{keep_rolling_back_request, RollupReader};
use crate::submission::{SentTransaction, TxSender, TxSendingRequest};
use crate::telemetry::{DISPUTES, ROLLBACK_STEPS};
use crate::waiter::ConfirmationWaiter;

pub use classify::{classify_revert, BenignRevert, RevertClass};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisputeOutcome {
    /// Mined successfully; the batch is now marked invalid on-chain.
    Disputed { tx_hash: B256 },
    Benign(BenignRevert),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollbackOutcome {
    Completed { steps: u32 },
    /// Nothing to roll back, or someone else finished it first.
    AlreadyCompleted,
}

#[derive(Clone, Debug)]
pub struct DisputeSettings {
    pub transition_gas_limit: u64,
    pub signature_gas_limit: u64,
    pub mine_timeout: Duration,
    pub max_rollback_steps: u32,
}

impl DisputeSettings {
    pub fn from_config(cfg: &CommanderConfig) -> Self {
        Self {
            transition_gas_limit: cfg.transition_dispute_gas_limit,
            signature_gas_limit: cfg.signature_dispute_gas_limit,
            mine_timeout: cfg.mine_timeout(),
            max_rollback_steps: cfg.max_rollback_steps,
        }
    }
}

#[derive(Clone)]
pub struct Disputer {
    reader: RollupReader,
    sender: TxSender,
    waiter: ConfirmationWaiter,
    settings: DisputeSettings,
}

impl Disputer {
    pub fn new(reader: RollupReader, sender: TxSender, waiter: ConfirmationWaiter, settings: DisputeSettings) -> Self {
        Self {
            reader,
            sender,
            waiter,
            settings,
        }
    }

    /// Submit a built dispute and classify the result.
    ///
    /// `expected_hash` is the commitment root this node believes the
    /// contract holds for `target.batch_id`.
    pub async fn submit_dispute(
        &self,
        target: &DisputeTarget,
        expected_hash: B256,
    ) -> Result<DisputeOutcome, DisputeError> {
        let batch_id = target.batch_id;
        let method = target.method()?;
        let input = target.encode()?;
        let (label, gas_limit) = if target.proof.is_transition() {
            ("disputeTransition", self.settings.transition_gas_limit)
        } else {
            ("disputeSignature", self.settings.signature_gas_limit)
        };
        info!("Disputing batch {} via {}", batch_id, method);

        let request = TxSendingRequest::new(self.reader.address(), input, label).with_gas_limit(gas_limit);
        let tx = match self.sender.enqueue(request).await {
            Ok(tx) => tx,
            Err(err) => {
                if let RevertClass::Benign(benign) = classify_revert(err.message()) {
                    if benign.settles_dispute() {
                        return Ok(self.benign(batch_id, benign));
                    }
                }
                metrics::increment_counter!(DISPUTES, "outcome" => "send_failed");
                return Err(err.into());
            }
        };

        let receipt = self.waiter.wait_mined(tx.hash, self.settings.mine_timeout).await?;
        if receipt.succeeded() {
            metrics::increment_counter!(DISPUTES, "outcome" => "disputed");
            info!("Batch {} disputed in tx {}", batch_id, tx.hash);
            return Ok(DisputeOutcome::Disputed { tx_hash: tx.hash });
        }

        self.classify_reverted(batch_id, expected_hash, &tx, &receipt).await
    }

    async fn classify_reverted(
        &self,
        batch_id: BatchId,
        expected_hash: B256,
        tx: &SentTransaction,
        receipt: &Receipt,
    ) -> Result<DisputeOutcome, DisputeError> {
        if let Some(invalid) = self.reader.get_invalid_batch_id().await? {
            if batch_id >= invalid {
                return Ok(self.benign(batch_id, BenignRevert::RollbackInProcess));
            }
        }

        match self.reader.get_contract_batch(batch_id).await? {
            Some(batch) if batch.hash == expected_hash => {}
            _ => return Ok(self.benign(batch_id, BenignRevert::BatchSuperseded)),
        }

        match classify_revert(self.replay_reason(tx, receipt).await.as_deref()) {
            RevertClass::Benign(benign) => Ok(self.benign(batch_id, benign)),
            RevertClass::RealFailure(reason) => {
                metrics::increment_counter!(DISPUTES, "outcome" => "reverted");
                error!("Dispute of batch {} reverted: {}", batch_id, reason);
                Err(DisputeError::Reverted { batch_id, reason })
            }
            RevertClass::Unknown => {
                metrics::increment_counter!(DISPUTES, "outcome" => "unknown");
                error!("Dispute of batch {} reverted for an unknown reason (tx {})", batch_id, tx.hash);
                Err(DisputeError::UnknownRevert {
                    batch_id,
                    tx_hash: tx.hash,
                })
            }
        }
    }

    /// Re-run a reverted transaction as a call at its block to recover the reason.
    async fn replay_reason(&self, tx: &SentTransaction, receipt: &Receipt) -> Option<String> {
        let block = receipt.block_number.map_or(BlockTag::Latest, BlockTag::Number);
        match self.reader.backend().call(&tx.call_request(), block).await {
            Ok(_) => None,
            Err(ChainError::Reverted { reason }) => reason,
            Err(e) => {
                warn!("Replay of {} failed: {}", tx.hash, e);
                None
            }
        }
    }

    fn benign(&self, batch_id: BatchId, benign: BenignRevert) -> DisputeOutcome {
        metrics::increment_counter!(DISPUTES, "outcome" => "benign");
        info!("Dispute of batch {} not needed: {}", batch_id, benign);
        DisputeOutcome::Benign(benign)
    }

    /// Send keepRollingBack until the invalid-batch marker clears.
    pub async fn keep_rolling_back(&self) -> Result<RollbackOutcome, DisputeError> {
        let mut steps = 0u32;
        while steps < self.settings.max_rollback_steps {
            let invalid = match self.reader.get_invalid_batch_id().await? {
                Some(invalid) => invalid,
                None => return Ok(rollback_done(steps)),
            };

            let tx = match self.sender.enqueue(keep_rolling_back_request(self.reader.address())).await {
                Ok(tx) => tx,
                Err(err) => {
                    if classify_revert(err.message()) == RevertClass::Benign(BenignRevert::NotRollingBack) {
                        info!("Rollback from batch {} already finished elsewhere", invalid);
                        return Ok(rollback_done(steps));
                    }
                    return Err(err.into());
                }
            };
            let receipt = self.waiter.wait_mined(tx.hash, self.settings.mine_timeout).await?;

            if !receipt.succeeded() {
                return match classify_revert(self.replay_reason(&tx, &receipt).await.as_deref()) {
                    RevertClass::Benign(_) => {
                        info!("Rollback from batch {} already finished elsewhere", invalid);
                        Ok(rollback_done(steps))
                    }
                    RevertClass::RealFailure(reason) => Err(DisputeError::Reverted {
                        batch_id: invalid,
                        reason,
                    }),
                    RevertClass::Unknown => Err(DisputeError::UnknownRevert {
                        batch_id: invalid,
                        tx_hash: tx.hash,
                    }),
                };
            }

            steps += 1;
            metrics::increment_counter!(ROLLBACK_STEPS);

            if let Some((start_id, deleted)) = completed_rollback(&receipt, self.reader.address()) {
                info!("Rollback from batch {} completed, {} batches deleted in last step", start_id, deleted);
                if let Some(still) = self.reader.get_invalid_batch_id().await? {
                    return Err(DisputeError::RollbackIncomplete {
                        invalid_batch_id: still,
                    });
                }
                return Ok(RollbackOutcome::Completed { steps });
            }
        }

        if self.reader.get_invalid_batch_id().await?.is_none() {
            return Ok(rollback_done(steps));
        }
        warn!("Rollback still in progress after {} steps", steps);
        Err(DisputeError::RollbackStepsExhausted { steps })
    }
}

fn rollback_done(steps: u32) -> RollbackOutcome {
    if steps == 0 {
        RollbackOutcome::AlreadyCompleted
    } else {
        RollbackOutcome::Completed { steps }
    }
}

/// `(startID, nDeleted)` of a `RollbackStatus` log with `completed = true`.
fn completed_rollback(receipt: &Receipt, rollup_address: alloy_primitives::Address) -> Option<(BatchId, u64)> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == rollup_address)
        .find_map(|log| match decode_event(&log.topics, &log.data) {
            Ok(Some(RollupEvent::RollbackStatus {
                start_id,
                deleted,
                completed: true,
            })) => Some((start_id, deleted)),
            _ => None,
        })
}
