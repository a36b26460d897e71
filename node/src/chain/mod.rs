// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chain boundary.
//!
//! Everything the coordinator needs from an Ethereum node, expressed over
//! the kernel's primitive types. The production implementation lives in
//! `network::rpc`; tests script an in-memory chain behind the same trait.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::errors::{BroadcastError, ChainError};

/// Block a read is evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Pending,
    Number(u64),
}

/// Read-only call or gas-estimation request.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas: Option<u64>,
    pub gas_price: Option<U256>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub nonce: u64,
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub chain_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub hash: B256,
    /// RLP-encoded signed transaction.
    pub raw: Bytes,
    pub tx: UnsignedTransaction,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    /// `None` while the node knows the transaction but has not mined it.
    pub block_number: Option<u64>,
    /// `true` when execution succeeded.
    pub status: bool,
    pub gas_used: Option<U256>,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn is_mined(&self) -> bool {
        self.block_number.is_some()
    }

    pub fn succeeded(&self) -> bool {
        self.status
    }
}

/// Inclusive block range filtered by emitting contract and first topic.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LogFilter {
    pub addresses: Vec<Address>,
    /// Any-of match on the event signature topic. Empty matches everything.
    pub topics: Vec<B256>,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogFilter {
    pub fn matches(&self, log: &Log) -> bool {
        let address_ok = self.addresses.is_empty() || self.addresses.contains(&log.address);
        let topic_ok = self.topics.is_empty()
            || log.topics.first().map_or(false, |t| self.topics.contains(t));
        let block_ok = log
            .block_number
            .map_or(false, |b| b >= self.from_block && b <= self.to_block);
        address_ok && topic_ok && block_ok
    }
}

#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Nonce of the next transaction from `account`, counting the mempool.
    async fn pending_nonce(&self, account: Address) -> Result<u64, ChainError>;

    async fn gas_price(&self) -> Result<U256, ChainError>;

    /// Fails with `ChainError::Reverted` when the call would revert.
    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ChainError>;

    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<B256, BroadcastError>;

    /// `Ok(None)` while the transaction is unknown or not yet mined.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, ChainError>;

    async fn call(&self, call: &CallRequest, block: BlockTag) -> Result<Bytes, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainError>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("signer error: {0}")]
pub struct SignerError(pub String);

/// Holds the key of the single account transactions are sent from.
#[async_trait]
pub trait TxSigner: Send + Sync {
    fn address(&self) -> Address;

    fn chain_id(&self) -> u64;

    async fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction, SignerError>;
}
