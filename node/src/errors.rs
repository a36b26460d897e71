// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::time::Duration;

use alloy_primitives::B256;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use settlement_kernel::error::KernelError;
use settlement_kernel::types::BatchId;
use thiserror::Error;

/// Failure talking to the chain node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("rpc transport error: {0}")]
    Transport(String),
    /// Execution reverted during a call or gas estimation.
    #[error("execution reverted: {}", .reason.as_deref().unwrap_or("<no reason>"))]
    Reverted { reason: Option<String> },
    #[error("malformed chain response: {0}")]
    Decode(String),
}

impl ChainError {
    /// Revert reason or raw node message, used for benign-race matching.
    pub fn message(&self) -> Option<&str> {
        match self {
            ChainError::Transport(msg) | ChainError::Decode(msg) => Some(msg),
            ChainError::Reverted { reason } => reason.as_deref(),
        }
    }
}

impl From<KernelError> for ChainError {
    fn from(e: KernelError) -> Self {
        ChainError::Decode(e.to_string())
    }
}

/// Outcome of handing a signed transaction to the node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// Node refused before mempool admission. Nonce still free.
    #[error("broadcast rejected: {0}")]
    Rejected(String),
    /// Request may have reached the node. Nonce treated as consumed.
    #[error("broadcast outcome unknown: {0}")]
    Indeterminate(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Call arguments could not be encoded. Never reached the network.
    #[error("encoding error: {0}")]
    Encoding(#[from] KernelError),
    /// Gas estimation failed. No nonce consumed.
    #[error("gas estimation failed: {0}")]
    Estimate(ChainError),
    #[error("chain error: {0}")]
    Chain(ChainError),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("transaction rejected at nonce {nonce}: {reason}")]
    Rejected { nonce: u64, reason: String },
    #[error("transaction {hash} at nonce {nonce} may have been broadcast: {reason}")]
    Indeterminate { nonce: u64, hash: B256, reason: String },
    #[error("transaction sequencer is not running")]
    Closed,
}

impl SendError {
    /// Node-side message for benign-race matching, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            SendError::Estimate(e) | SendError::Chain(e) => e.message(),
            SendError::Rejected { reason, .. } | SendError::Indeterminate { reason, .. } => Some(reason),
            SendError::Encoding(_) | SendError::Signing(_) | SendError::Closed => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("mining timed out for {hash} after {after:?}")]
    Timeout { hash: B256, after: Duration },
    #[error("chain error while waiting: {0}")]
    Chain(#[from] ChainError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisputeError {
    #[error("dispute encoding error: {0}")]
    Encoding(#[from] KernelError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    /// Mined and reverted for a reason that is not a known race.
    #[error("dispute of batch {batch_id} reverted: {reason}")]
    Reverted { batch_id: BatchId, reason: String },
    /// Mined and reverted, but no reason could be recovered.
    #[error("dispute of batch {batch_id} reverted for an unknown reason (tx {tx_hash})")]
    UnknownRevert { batch_id: BatchId, tx_hash: B256 },
    #[error("rollback reported complete but invalid batch marker is still {invalid_batch_id}")]
    RollbackIncomplete { invalid_batch_id: BatchId },
    #[error("rollback still in progress after {steps} keepRollingBack transactions")]
    RollbackStepsExhausted { steps: u32 },
}

/// Top-level error of the coordinator binary and its multi-step flows.
#[derive(Error, Debug)]
pub enum CommanderError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Wait(#[from] WaitError),
    #[error(transparent)]
    Dispute(#[from] DisputeError),
    #[error("transaction {tx_hash} ({label}) reverted")]
    TxReverted { tx_hash: B256, label: &'static str },
    #[error("transaction {tx_hash} emitted no {event} event")]
    MissingEvent { tx_hash: B256, event: &'static str },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for CommanderError {
    fn into_response(self) -> Response {
        let status = match &self {
            CommanderError::Chain(_) | CommanderError::Wait(_) => StatusCode::SERVICE_UNAVAILABLE,
            CommanderError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
