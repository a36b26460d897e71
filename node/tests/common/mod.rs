#![allow(dead_code)]
//! In-memory chain and signer shared by the node integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use settlement_kernel::abi::contract::{self, Rollup};
use settlement_kernel::bls::{Domain, Wallet};
use settlement_kernel::dispute::DisputeTarget;
use settlement_kernel::types::{
    Batch, BatchId, BatchType, Commitment, CommitmentBody, ContractBatch, TransferBody,
};
use settlement_node::chain::{
    BlockTag, CallRequest, ChainBackend, Log, LogFilter, Receipt, SignedTransaction, SignerError,
    TxSigner, UnsignedTransaction,
};
use settlement_node::dispute::{DisputeSettings, Disputer};
use settlement_node::errors::{BroadcastError, ChainError};
use settlement_node::rollup::{RollupClient, RollupReader, RollupSettings};
use settlement_node::submission::TxSender;
use settlement_node::waiter::ConfirmationWaiter;

pub const ROLLUP: Address = Address::repeat_byte(0x10);
pub const REGISTRY: Address = Address::repeat_byte(0x20);
pub const ACCOUNT: Address = Address::repeat_byte(0x42);
pub const POLL: Duration = Duration::from_millis(5);
pub const MINE_TIMEOUT: Duration = Duration::from_millis(500);

/// How the next mined transaction turns out.
#[derive(Clone, Debug)]
pub struct MinedScript {
    pub status: bool,
    pub logs: Vec<Log>,
    /// Invalid-batch marker after mining (0 clears it).
    pub set_marker: Option<u64>,
}

impl MinedScript {
    pub fn ok(logs: Vec<Log>) -> Self {
        Self {
            status: true,
            logs,
            set_marker: None,
        }
    }

    pub fn reverted() -> Self {
        Self {
            status: false,
            logs: Vec::new(),
            set_marker: None,
        }
    }
}

#[derive(Debug)]
pub struct ChainState {
    pub pending_nonce: u64,
    pub gas_price: U256,
    pub block_number: u64,
    pub estimate_error: Option<ChainError>,
    pub estimate_calls: usize,
    pub broadcast_script: VecDeque<Result<(), BroadcastError>>,
    pub sent: Vec<SignedTransaction>,
    /// Mine accepted transactions immediately.
    pub mine_on_send: bool,
    pub mined_script: VecDeque<MinedScript>,
    pub receipts: HashMap<B256, Receipt>,
    pub receipt_lookups: usize,
    pub receipt_error: Option<ChainError>,
    pub invalid_batch_marker: u64,
    pub next_batch_id: u64,
    pub batches: HashMap<u64, ContractBatch>,
    /// `None` replays succeed; `Some(reason)` replays revert with that reason.
    pub replay_revert: Option<Option<String>>,
    pub replay_calls: Vec<(CallRequest, BlockTag)>,
    pub logs: Vec<Log>,
    pub log_queries: Vec<LogFilter>,
    /// Fails the next `logs` query only.
    pub logs_error: Option<ChainError>,
    pub block_number_error: Option<ChainError>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            pending_nonce: 0,
            gas_price: U256::from(1_000_000_000u64),
            block_number: 100,
            estimate_error: None,
            estimate_calls: 0,
            broadcast_script: VecDeque::new(),
            sent: Vec::new(),
            mine_on_send: true,
            mined_script: VecDeque::new(),
            receipts: HashMap::new(),
            receipt_lookups: 0,
            receipt_error: None,
            invalid_batch_marker: 0,
            next_batch_id: 1,
            batches: HashMap::new(),
            replay_revert: None,
            replay_calls: Vec::new(),
            logs: Vec::new(),
            log_queries: Vec::new(),
            logs_error: None,
            block_number_error: None,
        }
    }
}

#[derive(Default)]
pub struct MockChain {
    pub state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn sent_nonces(&self) -> Vec<u64> {
        self.state.lock().sent.iter().map(|tx| tx.tx.nonce).collect()
    }

    pub fn mine(&self, hash: B256, status: bool, logs: Vec<Log>) {
        let mut s = self.state.lock();
        s.block_number += 1;
        let block = s.block_number;
        let logs = logs
            .into_iter()
            .enumerate()
            .map(|(i, mut log)| {
                log.block_number = Some(block);
                log.transaction_hash = Some(hash);
                log.log_index = Some(i as u64);
                log
            })
            .collect();
        s.receipts.insert(
            hash,
            Receipt {
                transaction_hash: hash,
                block_number: Some(block),
                status,
                gas_used: Some(U256::from(50_000)),
                logs,
            },
        );
    }
}

#[async_trait]
impl ChainBackend for MockChain {
    async fn pending_nonce(&self, _account: Address) -> Result<u64, ChainError> {
        Ok(self.state.lock().pending_nonce)
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        Ok(self.state.lock().gas_price)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ChainError> {
        let mut s = self.state.lock();
        s.estimate_calls += 1;
        match &s.estimate_error {
            Some(e) => Err(e.clone()),
            None => Ok(21_000 + call.data.len() as u64),
        }
    }

    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<B256, BroadcastError> {
        let script = {
            let mut s = self.state.lock();
            s.broadcast_script.pop_front().unwrap_or(Ok(()))
        };
        script?;

        let mined = {
            let mut s = self.state.lock();
            s.sent.push(tx.clone());
            s.pending_nonce = s.pending_nonce.max(tx.tx.nonce + 1);
            if s.mine_on_send {
                Some(s.mined_script.pop_front().unwrap_or_else(|| MinedScript::ok(Vec::new())))
            } else {
                None
            }
        };
        if let Some(script) = mined {
            self.mine(tx.hash, script.status, script.logs);
            if let Some(marker) = script.set_marker {
                self.state.lock().invalid_batch_marker = marker;
            }
        }
        Ok(tx.hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, ChainError> {
        let mut s = self.state.lock();
        s.receipt_lookups += 1;
        if let Some(e) = &s.receipt_error {
            return Err(e.clone());
        }
        Ok(s.receipts.get(&hash).cloned())
    }

    async fn call(&self, call: &CallRequest, block: BlockTag) -> Result<Bytes, ChainError> {
        let mut s = self.state.lock();
        let selector: [u8; 4] = call
            .data
            .get(..4)
            .and_then(|sel| sel.try_into().ok())
            .unwrap_or_default();

        if selector == Rollup::invalidBatchMarkerCall::SELECTOR {
            let marker = U256::from(s.invalid_batch_marker);
            return Ok(Rollup::invalidBatchMarkerCall::abi_encode_returns(&(marker,)).into());
        }
        if selector == Rollup::nextBatchIDCall::SELECTOR {
            let next = U256::from(s.next_batch_id);
            return Ok(Rollup::nextBatchIDCall::abi_encode_returns(&(next,)).into());
        }
        if selector == Rollup::getBatchCall::SELECTOR {
            let decoded = Rollup::getBatchCall::abi_decode(&call.data, true)
                .map_err(|e| ChainError::Decode(e.to_string()))?;
            let id: u64 = decoded.batchID.to();
            let batch = match s.batches.get(&id) {
                Some(b) => contract::Batch {
                    commitmentRoot: b.hash,
                    meta: b.meta(),
                },
                None => contract::Batch {
                    commitmentRoot: B256::ZERO,
                    meta: B256::ZERO,
                },
            };
            return Ok(Rollup::getBatchCall::abi_encode_returns(&(batch,)).into());
        }

        s.replay_calls.push((call.clone(), block));
        match &s.replay_revert {
            None => Ok(Bytes::new()),
            Some(reason) => Err(ChainError::Reverted { reason: reason.clone() }),
        }
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let s = self.state.lock();
        match &s.block_number_error {
            Some(e) => Err(e.clone()),
            None => Ok(s.block_number),
        }
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainError> {
        let mut s = self.state.lock();
        s.log_queries.push(filter.clone());
        if let Some(e) = s.logs_error.take() {
            return Err(e);
        }
        Ok(s.logs.iter().filter(|log| filter.matches(log)).cloned().collect())
    }
}

/// Deterministic signer: the hash commits to nonce and calldata.
pub struct MockSigner;

#[async_trait]
impl TxSigner for MockSigner {
    fn address(&self) -> Address {
        ACCOUNT
    }

    fn chain_id(&self) -> u64 {
        1337
    }

    async fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction, SignerError> {
        let mut raw = tx.nonce.to_be_bytes().to_vec();
        raw.extend_from_slice(tx.to.as_slice());
        raw.extend_from_slice(&tx.data);
        Ok(SignedTransaction {
            hash: keccak256(&raw),
            raw: raw.into(),
            tx,
        })
    }
}

pub fn log_of<E: SolEvent>(address: Address, event: &E) -> Log {
    Log {
        address,
        topics: vec![E::SIGNATURE_HASH],
        data: event.encode_data().into(),
        ..Default::default()
    }
}

pub fn log_at<E: SolEvent>(address: Address, event: &E, block: u64, index: u64) -> Log {
    Log {
        block_number: Some(block),
        log_index: Some(index),
        transaction_hash: Some(B256::repeat_byte(block as u8)),
        ..log_of(address, event)
    }
}

pub struct Harness {
    pub chain: Arc<MockChain>,
    pub sender: TxSender,
    pub waiter: ConfirmationWaiter,
    pub client: RollupClient,
}

impl Harness {
    pub fn reader(&self) -> RollupReader {
        self.client.reader().clone()
    }

    pub fn disputer(&self, max_rollback_steps: u32) -> Disputer {
        Disputer::new(
            self.reader(),
            self.sender.clone(),
            self.waiter.clone(),
            DisputeSettings {
                transition_gas_limit: 5_000_000,
                signature_gas_limit: 7_500_000,
                mine_timeout: MINE_TIMEOUT,
                max_rollback_steps,
            },
        )
    }
}

pub async fn harness_with(chain: Arc<MockChain>) -> Harness {
    let backend: Arc<dyn ChainBackend> = chain.clone();
    let (sender, _task) = TxSender::spawn(backend.clone(), Arc::new(MockSigner), 32)
        .await
        .unwrap();
    let waiter = ConfirmationWaiter::new(backend.clone(), POLL);
    let client = RollupClient::new(
        backend,
        sender.clone(),
        waiter.clone(),
        RollupSettings {
            rollup_address: ROLLUP,
            account_registry_address: REGISTRY,
            stake_amount: U256::from(100u64),
            batch_registration_gas_limit: 8_000_000,
            mine_timeout: MINE_TIMEOUT,
        },
    );
    Harness {
        chain,
        sender,
        waiter,
        client,
    }
}

pub async fn harness() -> Harness {
    harness_with(MockChain::new()).await
}

pub fn transfer_commitment(seed: u8) -> Commitment {
    let wallet = Wallet::from_secret_bytes(&[seed.max(1); 32], Domain([0x11; 32])).unwrap();
    let txs = Bytes::from(vec![seed; 12]);
    Commitment::new(
        B256::repeat_byte(seed),
        CommitmentBody::Transfer(TransferBody {
            account_root: B256::repeat_byte(0xAA),
            signature: wallet.sign(&txs),
            fee_receiver: seed as u32,
            txs,
        }),
    )
}

pub fn transfer_batch(id: u64) -> Batch {
    Batch::new(
        BatchId(id),
        BatchType::Transfer,
        vec![transfer_commitment(1), transfer_commitment(2)],
    )
    .unwrap()
}

/// Transition dispute of the second commitment of `batch` plus the on-chain record matching it.
pub fn dispute_of(batch: &Batch) -> (DisputeTarget, ContractBatch) {
    let target = DisputeTarget::transition(batch, 1, None, Vec::new()).unwrap();
    let record = ContractBatch {
        id: batch.id,
        hash: batch.commitment_root().unwrap(),
        batch_type: batch.batch_type,
        size: batch.commitments.len() as u8,
        committer: ACCOUNT,
        finalisation_block: 1_000,
    };
    (target, record)
}
