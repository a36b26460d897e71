// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Typed access to the rollup and account-registry contracts.
//!
//! View calls go straight to the backend. Transactions are encoded by the
//! kernel and funnelled through the shared `TxSender`.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use settlement_kernel::abi;
use settlement_kernel::bls::PublicKey;
use settlement_kernel::dispute::CommitmentInclusionProof;
use settlement_kernel::events::{decode_event, RollupEvent};
use settlement_kernel::types::{BatchId, BatchType, Commitment, ContractBatch, PubkeyId, SubtreeVacancyProof};
use tracing::{info, warn};

use crate::chain::{BlockTag, CallRequest, ChainBackend, Receipt};
use crate::config::CommanderConfig;
use crate::errors::{ChainError, CommanderError, WaitError};
use crate::submission::{SendResponse, SentTransaction, TxSender, TxSendingRequest};
use crate::waiter::ConfirmationWaiter;

/// Read-only views of the rollup contract. No gas, no nonce.
#[derive(Clone)]
pub struct RollupReader {
    backend: Arc<dyn ChainBackend>,
    rollup_address: Address,
}

impl RollupReader {
    pub fn new(backend: Arc<dyn ChainBackend>, rollup_address: Address) -> Self {
        Self {
            backend,
            rollup_address,
        }
    }

    pub fn address(&self) -> Address {
        self.rollup_address
    }

    pub fn backend(&self) -> &Arc<dyn ChainBackend> {
        &self.backend
    }

    async fn view(&self, data: Bytes) -> Result<Bytes, ChainError> {
        let call = CallRequest {
            to: self.rollup_address,
            data,
            ..Default::default()
        };
        self.backend.call(&call, BlockTag::Latest).await
    }

    /// `None` while healthy, otherwise the first batch being rolled back.
    pub async fn get_invalid_batch_id(&self) -> Result<Option<BatchId>, ChainError> {
        let out = self.view(abi::encode_invalid_batch_marker()).await?;
        Ok(abi::decode_invalid_batch_marker(&out)?)
    }

    /// `None` when the contract holds no batch under `id` (never submitted or rolled back).
    pub async fn get_contract_batch(&self, id: BatchId) -> Result<Option<ContractBatch>, ChainError> {
        let out = self.view(abi::encode_get_batch(id)).await?;
        let batch = abi::decode_get_batch(id, &out)?;
        if batch.hash == B256::ZERO {
            return Ok(None);
        }
        Ok(Some(batch))
    }

    pub async fn next_batch_id(&self) -> Result<BatchId, ChainError> {
        let out = self.view(abi::encode_next_batch_id()).await?;
        Ok(abi::decode_next_batch_id(&out)?)
    }
}

/// Addresses and amounts the client attaches to its transactions.
#[derive(Clone, Debug)]
pub struct RollupSettings {
    pub rollup_address: Address,
    pub account_registry_address: Address,
    pub stake_amount: U256,
    pub batch_registration_gas_limit: u64,
    pub mine_timeout: Duration,
}

impl RollupSettings {
    pub fn from_config(cfg: &CommanderConfig) -> Self {
        Self {
            rollup_address: cfg.rollup_address,
            account_registry_address: cfg.account_registry_address,
            stake_amount: cfg.stake_amount,
            batch_registration_gas_limit: cfg.batch_account_registration_gas_limit,
            mine_timeout: cfg.mine_timeout(),
        }
    }
}

/// A batch the rollup accepted, with the id it assigned.
#[derive(Clone, Debug)]
pub struct SubmittedBatch {
    pub batch_id: BatchId,
    pub account_root: B256,
    pub batch_type: BatchType,
    pub tx: SentTransaction,
    pub receipt: Receipt,
}

#[derive(Clone)]
pub struct RollupClient {
    reader: RollupReader,
    sender: TxSender,
    waiter: ConfirmationWaiter,
    settings: RollupSettings,
}

impl RollupClient {
    pub fn new(
        backend: Arc<dyn ChainBackend>,
        sender: TxSender,
        waiter: ConfirmationWaiter,
        settings: RollupSettings,
    ) -> Self {
        Self {
            reader: RollupReader::new(backend, settings.rollup_address),
            sender,
            waiter,
            settings,
        }
    }

    pub fn reader(&self) -> &RollupReader {
        &self.reader
    }

    pub fn sender(&self) -> &TxSender {
        &self.sender
    }

    pub fn waiter(&self) -> &ConfirmationWaiter {
        &self.waiter
    }

    pub fn settings(&self) -> &RollupSettings {
        &self.settings
    }

    /// Submit a transfer, create-and-transfer or mass-migration batch with the configured stake.
    pub async fn submit_batch(&self, batch_type: BatchType, commitments: &[Commitment]) -> SendResponse {
        let input = abi::encode_submit_batch(batch_type, commitments)?;
        let label = match batch_type {
            BatchType::MassMigration => "submitMassMigration",
            BatchType::Create2Transfer => "submitCreate2Transfer",
            _ => "submitTransfer",
        };
        let request = TxSendingRequest::new(self.settings.rollup_address, input, label)
            .with_value(self.settings.stake_amount);
        self.sender.enqueue(request).await
    }

    /// Submit, wait for mining, and read the assigned id from the `NewBatch` log.
    pub async fn submit_batch_and_wait(
        &self,
        batch_type: BatchType,
        commitments: &[Commitment],
    ) -> Result<SubmittedBatch, CommanderError> {
        let tx = self.submit_batch(batch_type, commitments).await?;
        self.await_new_batch(tx, batch_type, "submitBatch").await
    }

    /// Submit the pending deposit subtree as a deposit batch with the configured stake.
    ///
    /// `previous` proves the last commitment of the latest batch; `vacant`
    /// proves the state subtree the deposits land in is empty.
    pub async fn submit_deposits(
        &self,
        previous: &CommitmentInclusionProof,
        vacant: &SubtreeVacancyProof,
    ) -> SendResponse {
        let request = TxSendingRequest::new(
            self.settings.rollup_address,
            abi::encode_submit_deposits(previous, vacant),
            "submitDeposits",
        )
        .with_value(self.settings.stake_amount);
        self.sender.enqueue(request).await
    }

    pub async fn submit_deposits_and_wait(
        &self,
        previous: &CommitmentInclusionProof,
        vacant: &SubtreeVacancyProof,
    ) -> Result<SubmittedBatch, CommanderError> {
        let tx = self.submit_deposits(previous, vacant).await?;
        self.await_new_batch(tx, BatchType::Deposit, "submitDeposits").await
    }

    async fn await_new_batch(
        &self,
        tx: SentTransaction,
        batch_type: BatchType,
        label: &'static str,
    ) -> Result<SubmittedBatch, CommanderError> {
        let receipt = self.wait(&tx).await?;
        if !receipt.succeeded() {
            return Err(CommanderError::TxReverted { tx_hash: tx.hash, label });
        }
        let (batch_id, account_root) =
            find_new_batch(&receipt, self.settings.rollup_address).ok_or(CommanderError::MissingEvent {
                tx_hash: tx.hash,
                event: "NewBatch",
            })?;
        info!("Batch {} ({}) accepted in tx {}", batch_id, batch_type, tx.hash);
        Ok(SubmittedBatch {
            batch_id,
            account_root,
            batch_type,
            tx,
            receipt,
        })
    }

    pub async fn withdraw_stake(&self, batch_id: BatchId) -> SendResponse {
        let request = TxSendingRequest::new(
            self.settings.rollup_address,
            abi::encode_withdraw_stake(batch_id),
            "withdrawStake",
        );
        self.sender.enqueue(request).await
    }

    pub async fn register_pubkey(&self, public_key: &PublicKey) -> SendResponse {
        let request = TxSendingRequest::new(
            self.settings.account_registry_address,
            abi::encode_register_pubkey(public_key),
            "register",
        );
        self.sender.enqueue(request).await
    }

    /// Register and wait for the `SinglePubkeyRegistered` log.
    pub async fn register_pubkey_and_wait(&self, public_key: &PublicKey) -> Result<PubkeyId, CommanderError> {
        let tx = self.register_pubkey(public_key).await?;
        let receipt = self.wait(&tx).await?;
        if !receipt.succeeded() {
            return Err(CommanderError::TxReverted {
                tx_hash: tx.hash,
                label: "register",
            });
        }
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.settings.account_registry_address)
            .find_map(|log| match decode_event(&log.topics, &log.data) {
                Ok(Some(RollupEvent::SinglePubkeyRegistered { pubkey_id })) => Some(pubkey_id),
                _ => None,
            })
            .ok_or(CommanderError::MissingEvent {
                tx_hash: tx.hash,
                event: "SinglePubkeyRegistered",
            })
    }

    /// Register exactly sixteen keys in one `registerBatch` call.
    pub async fn register_batch_pubkeys(&self, public_keys: &[PublicKey]) -> SendResponse {
        let request = TxSendingRequest::new(
            self.settings.account_registry_address,
            abi::encode_register_batch(public_keys)?,
            "registerBatch",
        )
        .with_gas_limit(self.settings.batch_registration_gas_limit);
        self.sender.enqueue(request).await
    }

    /// Register a batch of keys and read their registry ids from the
    /// `BatchPubkeyRegistered` log.
    pub async fn register_batch_pubkeys_and_wait(
        &self,
        public_keys: &[PublicKey],
    ) -> Result<Vec<PubkeyId>, CommanderError> {
        let tx = self.register_batch_pubkeys(public_keys).await?;
        let receipt = self.wait(&tx).await?;
        if !receipt.succeeded() {
            return Err(CommanderError::TxReverted {
                tx_hash: tx.hash,
                label: "registerBatch",
            });
        }
        let ids = receipt
            .logs
            .iter()
            .filter(|log| log.address == self.settings.account_registry_address)
            .find_map(|log| match decode_event(&log.topics, &log.data) {
                Ok(Some(RollupEvent::BatchPubkeyRegistered { start_id, end_id })) => {
                    Some(PubkeyId::batch_registered(start_id, end_id))
                }
                _ => None,
            })
            .ok_or(CommanderError::MissingEvent {
                tx_hash: tx.hash,
                event: "BatchPubkeyRegistered",
            })?;
        info!("Registered {} public keys in tx {}", ids.len(), tx.hash);
        Ok(ids)
    }

    pub async fn keep_rolling_back(&self) -> SendResponse {
        self.sender.enqueue(keep_rolling_back_request(self.settings.rollup_address)).await
    }

    pub async fn wait(&self, tx: &SentTransaction) -> Result<Receipt, WaitError> {
        self.waiter.wait_mined(tx.hash, self.settings.mine_timeout).await
    }
}

pub(crate) fn keep_rolling_back_request(rollup_address: Address) -> TxSendingRequest {
    TxSendingRequest::new(rollup_address, abi::encode_keep_rolling_back(), "keepRollingBack")
}

/// First `NewBatch` log the rollup emitted in this receipt's transaction.
pub fn find_new_batch(receipt: &Receipt, rollup_address: Address) -> Option<(BatchId, B256)> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == rollup_address)
        .filter(|log| log.transaction_hash.map_or(true, |h| h == receipt.transaction_hash))
        .find_map(|log| match decode_event(&log.topics, &log.data) {
            Ok(Some(RollupEvent::NewBatch {
                batch_id, account_root, ..
            })) => Some((batch_id, account_root)),
            Ok(_) => None,
            Err(e) => {
                warn!("Undecodable rollup log in {}: {}", receipt.transaction_hash, e);
                None
            }
        })
}

