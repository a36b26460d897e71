// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use alloy_primitives::{Address, Bytes, B256, U256};

use crate::chain::{CallRequest, SignedTransaction};
use crate::errors::SendError;

/// An already ABI-encoded call waiting for a nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSendingRequest {
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    /// Estimated against pending state when `None`.
    pub gas_limit: Option<u64>,
    /// Short name of the contract method, for logs.
    pub label: &'static str,
}

impl TxSendingRequest {
    pub fn new(to: Address, input: Bytes, label: &'static str) -> Self {
        Self {
            to,
            input,
            value: U256::ZERO,
            gas_limit: None,
            label,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// A transaction the node accepted into its mempool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: B256,
    pub nonce: u64,
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: U256,
}

impl SentTransaction {
    /// Same call as a read-only request, for replaying it against a block.
    pub fn call_request(&self) -> CallRequest {
        CallRequest {
            from: Some(self.from),
            to: self.to,
            data: self.input.clone(),
            value: self.value,
            gas: Some(self.gas_limit),
            gas_price: Some(self.gas_price),
        }
    }
}

impl From<SignedTransaction> for SentTransaction {
    fn from(signed: SignedTransaction) -> Self {
        let tx = signed.tx;
        Self {
            hash: signed.hash,
            nonce: tx.nonce,
            from: tx.from,
            to: tx.to,
            input: tx.data,
            value: tx.value,
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
        }
    }
}

pub type SendResponse = Result<SentTransaction, SendError>;
