// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Confirmation waiter: polls for receipts against a hard deadline.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::B256;
use futures::future::try_join_all;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, warn};

use crate::chain::{ChainBackend, Receipt};
use crate::errors::{ChainError, WaitError};
use crate::telemetry::{CONFIRMATION_SECONDS, MINING_TIMEOUTS};

#[derive(Clone)]
pub struct ConfirmationWaiter {
    backend: Arc<dyn ChainBackend>,
    poll_interval: Duration,
}

impl ConfirmationWaiter {
    pub fn new(backend: Arc<dyn ChainBackend>, poll_interval: Duration) -> Self {
        Self {
            backend,
            poll_interval,
        }
    }

    /// Poll until the transaction has a receipt with a block number.
    ///
    /// A missing receipt is an interim state. On expiry of `timeout` the
    /// loop stops with `WaitError::Timeout`; a lookup already in flight is
    /// left to finish in the background rather than aborted. Read-only.
    pub async fn wait_mined(&self, hash: B256, timeout: Duration) -> Result<Receipt, WaitError> {
        let started = Instant::now();
        let deadline = started + timeout;

        loop {
            let next_tick = Instant::now() + self.poll_interval;
            let backend = self.backend.clone();
            let mut lookup = tokio::spawn(async move { backend.transaction_receipt(hash).await });

            match timeout_at(deadline, &mut lookup).await {
                Err(_) => return Err(self.timed_out(hash, timeout)),
                Ok(Err(join_err)) => {
                    return Err(WaitError::Chain(ChainError::Transport(format!(
                        "receipt lookup task failed: {}",
                        join_err
                    ))))
                }
                Ok(Ok(Err(e))) => return Err(WaitError::Chain(e)),
                Ok(Ok(Ok(Some(receipt)))) if receipt.is_mined() => {
                    let elapsed = started.elapsed();
                    metrics::histogram!(CONFIRMATION_SECONDS, elapsed.as_secs_f64());
                    debug!("Tx {} mined in block {:?} after {:?}", hash, receipt.block_number, elapsed);
                    return Ok(receipt);
                }
                Ok(Ok(Ok(_))) => {}
            }

            if Instant::now() >= deadline {
                return Err(self.timed_out(hash, timeout));
            }
            sleep_until(next_tick.min(deadline)).await;
            if Instant::now() >= deadline {
                return Err(self.timed_out(hash, timeout));
            }
        }
    }

    /// Wait for all hashes concurrently. Results keep the input order; the
    /// first failure cancels the remaining waits.
    pub async fn wait_many_mined(
        &self,
        hashes: &[B256],
        timeout: Duration,
    ) -> Result<Vec<Receipt>, WaitError> {
        try_join_all(hashes.iter().map(|hash| self.wait_mined(*hash, timeout))).await
    }

    fn timed_out(&self, hash: B256, after: Duration) -> WaitError {
        metrics::increment_counter!(MINING_TIMEOUTS);
        warn!("Mining of {} timed out after {:?}", hash, after);
        WaitError::Timeout { hash, after }
    }
}
