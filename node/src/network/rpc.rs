// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use alloy_primitives::{Bytes, B256, U256};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::{
    transaction::eip2718::TypedTransaction, BlockId, BlockNumber, Filter, Topic, TransactionReceipt,
    TransactionRequest, ValueOrArray, U256 as EthU256,
};
use settlement_kernel::abi::decode_revert_reason;
use tracing::debug;

use super::{from_eth_u256, from_h160, from_h256, to_eth_u256, to_h160, to_h256};
use crate::chain::{BlockTag, CallRequest, ChainBackend, Log, LogFilter, Receipt, SignedTransaction};
use crate::errors::{BroadcastError, ChainError};

/// `ChainBackend` over an HTTP JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcBackend {
    provider: Provider<Http>,
}

impl RpcBackend {
    pub fn connect(url: &str) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| ChainError::Transport(format!("bad rpc url {}: {}", url, e)))?;
        Ok(Self { provider })
    }

    pub fn provider(&self) -> &Provider<Http> {
        &self.provider
    }
}

#[async_trait]
impl ChainBackend for RpcBackend {
    async fn pending_nonce(&self, account: alloy_primitives::Address) -> Result<u64, ChainError> {
        let nonce = self
            .provider
            .get_transaction_count(to_h160(account), Some(BlockNumber::Pending.into()))
            .await
            .map_err(map_provider_error)?;
        eth_u256_to_u64(nonce)
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        let price = self.provider.get_gas_price().await.map_err(map_provider_error)?;
        Ok(from_eth_u256(price))
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ChainError> {
        let gas = self
            .provider
            .estimate_gas(&typed_call(call), None)
            .await
            .map_err(map_provider_error)?;
        eth_u256_to_u64(gas)
    }

    async fn send_raw_transaction(&self, tx: &SignedTransaction) -> Result<B256, BroadcastError> {
        let raw = ethers::types::Bytes::from(tx.raw.to_vec());
        match self.provider.send_raw_transaction(raw).await {
            Ok(pending) => Ok(from_h256(pending.tx_hash())),
            Err(err) => Err(classify_broadcast_error(err)),
        }
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(to_h256(hash))
            .await
            .map_err(map_provider_error)?;
        Ok(receipt.map(convert_receipt))
    }

    async fn call(&self, call: &CallRequest, block: BlockTag) -> Result<Bytes, ChainError> {
        let out = self
            .provider
            .call(&typed_call(call), Some(block_id(block)))
            .await
            .map_err(map_provider_error)?;
        Ok(Bytes::from(out.to_vec()))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let number = self.provider.get_block_number().await.map_err(map_provider_error)?;
        Ok(number.as_u64())
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainError> {
        let mut query = Filter::new()
            .from_block(filter.from_block)
            .to_block(filter.to_block);
        if !filter.addresses.is_empty() {
            query = query.address(filter.addresses.iter().copied().map(to_h160).collect::<Vec<_>>());
        }
        if !filter.topics.is_empty() {
            let topic: Topic = ValueOrArray::Array(filter.topics.iter().map(|t| Some(to_h256(*t))).collect());
            query = query.topic0(topic);
        }
        let logs = self.provider.get_logs(&query).await.map_err(map_provider_error)?;
        Ok(logs.into_iter().map(convert_log).collect())
    }
}

fn typed_call(call: &CallRequest) -> TypedTransaction {
    let mut request = TransactionRequest::new()
        .to(to_h160(call.to))
        .data(ethers::types::Bytes::from(call.data.to_vec()))
        .value(to_eth_u256(call.value));
    if let Some(from) = call.from {
        request = request.from(to_h160(from));
    }
    if let Some(gas) = call.gas {
        request = request.gas(gas);
    }
    if let Some(price) = call.gas_price {
        request = request.gas_price(to_eth_u256(price));
    }
    request.into()
}

fn block_id(tag: BlockTag) -> BlockId {
    match tag {
        BlockTag::Latest => BlockNumber::Latest.into(),
        BlockTag::Pending => BlockNumber::Pending.into(),
        BlockTag::Number(n) => BlockNumber::Number(n.into()).into(),
    }
}

fn eth_u256_to_u64(value: EthU256) -> Result<u64, ChainError> {
    if value.bits() > 64 {
        return Err(ChainError::Decode(format!("{} does not fit in u64", value)));
    }
    Ok(value.low_u64())
}

/// Node replies meaning a transaction with this nonce is already pooled or mined.
const NONCE_SPENT: [&str; 3] = ["already known", "known transaction", "nonce too low"];

/// A JSON-RPC error response means the node looked at the transaction and
/// refused it. Anything else leaves the outcome unknown.
fn classify_broadcast_error(err: ProviderError) -> BroadcastError {
    match err.as_error_response() {
        Some(rpc) => classify_rejection(&rpc.message),
        None => BroadcastError::Indeterminate(err.to_string()),
    }
}

/// A refusal whose reason says the nonce is already taken still spends it.
fn classify_rejection(message: &str) -> BroadcastError {
    let lower = message.to_ascii_lowercase();
    if NONCE_SPENT.iter().any(|phrase| lower.contains(phrase)) {
        debug!("broadcast refused with nonce already spent: {}", message);
        return BroadcastError::Indeterminate(message.to_string());
    }
    BroadcastError::Rejected(message.to_string())
}

fn map_provider_error(err: ProviderError) -> ChainError {
    let Some(rpc) = err.as_error_response() else {
        return ChainError::Transport(err.to_string());
    };
    if let Some(reason) = rpc.as_revert_data().and_then(|data| decode_revert_reason(&data)) {
        return ChainError::Reverted { reason: Some(reason) };
    }
    if let Some(rest) = rpc.message.strip_prefix("execution reverted") {
        let reason = rest.trim_start_matches(':').trim();
        debug!("call reverted: {:?}", rpc.message);
        return ChainError::Reverted {
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        };
    }
    if rpc.message.contains("revert") {
        return ChainError::Reverted {
            reason: Some(rpc.message.clone()),
        };
    }
    ChainError::Transport(format!("{} (code {})", rpc.message, rpc.code))
}

fn convert_receipt(receipt: TransactionReceipt) -> Receipt {
    Receipt {
        transaction_hash: from_h256(receipt.transaction_hash),
        block_number: receipt.block_number.map(|n| n.as_u64()),
        status: receipt.status.map_or(false, |s| s.as_u64() == 1),
        gas_used: receipt.gas_used.map(from_eth_u256),
        logs: receipt.logs.into_iter().map(convert_log).collect(),
    }
}

fn convert_log(log: ethers::types::Log) -> Log {
    Log {
        address: from_h160(log.address),
        topics: log.topics.into_iter().map(from_h256).collect(),
        data: Bytes::from(log.data.to_vec()),
        block_number: log.block_number.map(|n| n.as_u64()),
        transaction_hash: log.transaction_hash.map(from_h256),
        log_index: log.log_index.map(|i| i.low_u64()),
    }
}
