// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::request::{SendResponse, SentTransaction, TxSendingRequest};
use crate::chain::{CallRequest, ChainBackend, TxSigner, UnsignedTransaction};
use crate::errors::{BroadcastError, ChainError, SendError};
use crate::telemetry::{NEXT_NONCE, TX_INDETERMINATE, TX_REJECTED, TX_SENT};

enum Command {
    Send {
        request: TxSendingRequest,
        reply: oneshot::Sender<SendResponse>,
    },
    Resync {
        reply: oneshot::Sender<Result<u64, ChainError>>,
    },
    NextNonce {
        reply: oneshot::Sender<u64>,
    },
}

/// Handle to the sequencing task. Cheap to clone; the task exits once
/// every handle is dropped and the queue drains.
///
/// At most one sequencer may run per account. Another process sending
/// from the same key will desynchronise the counter until `resync`.
#[derive(Clone, Debug)]
pub struct TxSender {
    commands: mpsc::Sender<Command>,
    account: Address,
}

impl TxSender {
    /// Reads the account's pending nonce and starts the sequencing task.
    pub async fn spawn(
        backend: Arc<dyn ChainBackend>,
        signer: Arc<dyn TxSigner>,
        queue_size: usize,
    ) -> Result<(Self, JoinHandle<()>), ChainError> {
        let account = signer.address();
        let next_nonce = backend.pending_nonce(account).await?;
        info!("Transaction sequencer for {} starting at nonce {}", account, next_nonce);
        metrics::gauge!(NEXT_NONCE, next_nonce as f64);

        let (commands, rx) = mpsc::channel(queue_size.max(1));
        let sequencer = Sequencer {
            backend,
            signer,
            account,
            next_nonce,
        };
        let handle = tokio::spawn(sequencer.run(rx));
        Ok((Self { commands, account }, handle))
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Resolves once the request has a nonce and the node has answered the
    /// broadcast. Does not wait for mining.
    pub async fn enqueue(&self, request: TxSendingRequest) -> SendResponse {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Send { request, reply })
            .await
            .map_err(|_| SendError::Closed)?;
        rx.await.map_err(|_| SendError::Closed)?
    }

    /// Reset the local counter to the chain's pending nonce.
    pub async fn resync(&self) -> Result<u64, SendError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Resync { reply })
            .await
            .map_err(|_| SendError::Closed)?;
        rx.await.map_err(|_| SendError::Closed)?.map_err(SendError::Chain)
    }

    /// Nonce the next request will be assigned, after everything queued before this call.
    pub async fn next_nonce(&self) -> Result<u64, SendError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::NextNonce { reply })
            .await
            .map_err(|_| SendError::Closed)?;
        rx.await.map_err(|_| SendError::Closed)
    }
}

struct Sequencer {
    backend: Arc<dyn ChainBackend>,
    signer: Arc<dyn TxSigner>,
    account: Address,
    next_nonce: u64,
}

impl Sequencer {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Send { request, reply } => {
                    let result = self.send(request).await;
                    // Caller may have given up; the nonce bookkeeping already happened.
                    let _ = reply.send(result);
                }
                Command::Resync { reply } => {
                    let result = self.resync().await;
                    let _ = reply.send(result);
                }
                Command::NextNonce { reply } => {
                    let _ = reply.send(self.next_nonce);
                }
            }
        }
        debug!("Transaction sequencer for {} stopped", self.account);
    }

    async fn resync(&mut self) -> Result<u64, ChainError> {
        let nonce = self.backend.pending_nonce(self.account).await?;
        if nonce != self.next_nonce {
            warn!("Nonce resync for {}: local {} -> chain {}", self.account, self.next_nonce, nonce);
        }
        self.next_nonce = nonce;
        metrics::gauge!(NEXT_NONCE, nonce as f64);
        Ok(nonce)
    }

    async fn send(&mut self, request: TxSendingRequest) -> SendResponse {
        let gas_limit = match request.gas_limit {
            Some(limit) => limit,
            None => {
                let call = CallRequest {
                    from: Some(self.account),
                    to: request.to,
                    data: request.input.clone(),
                    value: request.value,
                    gas: None,
                    gas_price: None,
                };
                self.backend.estimate_gas(&call).await.map_err(|e| {
                    debug!("Gas estimation for {} failed: {}", request.label, e);
                    SendError::Estimate(e)
                })?
            }
        };
        let gas_price = self.backend.gas_price().await.map_err(SendError::Chain)?;

        let nonce = self.next_nonce;
        let unsigned = UnsignedTransaction {
            nonce,
            from: self.account,
            to: request.to,
            data: request.input,
            value: request.value,
            gas_limit,
            gas_price,
            chain_id: self.signer.chain_id(),
        };
        let signed = self
            .signer
            .sign(unsigned)
            .await
            .map_err(|e| SendError::Signing(e.0))?;

        match self.backend.send_raw_transaction(&signed).await {
            Ok(hash) => {
                if hash != signed.hash {
                    warn!("Node reported hash {} for locally signed {}", hash, signed.hash);
                }
                self.advance();
                metrics::increment_counter!(TX_SENT, "method" => request.label);
                info!("Sent {} tx {} with nonce {}", request.label, hash, nonce);
                let mut sent = SentTransaction::from(signed);
                sent.hash = hash;
                Ok(sent)
            }
            Err(BroadcastError::Rejected(reason)) => {
                metrics::increment_counter!(TX_REJECTED, "method" => request.label);
                warn!("Node rejected {} at nonce {}: {}", request.label, nonce, reason);
                Err(SendError::Rejected { nonce, reason })
            }
            Err(BroadcastError::Indeterminate(reason)) => {
                self.advance();
                metrics::increment_counter!(TX_INDETERMINATE, "method" => request.label);
                warn!(
                    "Broadcast of {} tx {} at nonce {} has unknown outcome: {}",
                    request.label, signed.hash, nonce, reason
                );
                Err(SendError::Indeterminate {
                    nonce,
                    hash: signed.hash,
                    reason,
                })
            }
        }
    }

    fn advance(&mut self) {
        self.next_nonce += 1;
        metrics::gauge!(NEXT_NONCE, self.next_nonce as f64);
    }
}
