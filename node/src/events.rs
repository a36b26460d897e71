// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Polling event watcher.
//!
//! Logs are fetched in bounded block ranges and decoded by the kernel. The
//! stream is cancellable and exposes the block to resume from. A range only
//! counts as consumed once all of its events were yielded, so a restart from
//! `resume_block` may redeliver part of a range but never skips one.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use alloy_primitives::{Address, B256};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use settlement_kernel::events::{decode_event, EventKind, RollupEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::chain::{ChainBackend, Log, LogFilter};
use crate::errors::ChainError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchedEvent {
    pub event: RollupEvent,
    pub block_number: u64,
    pub tx_hash: Option<B256>,
    pub log_index: Option<u64>,
}

#[derive(Clone)]
pub struct EventWatcher {
    backend: Arc<dyn ChainBackend>,
    addresses: Vec<Address>,
    kinds: Vec<EventKind>,
    block_range: u64,
    poll_interval: Duration,
}

impl EventWatcher {
    pub fn new(
        backend: Arc<dyn ChainBackend>,
        addresses: Vec<Address>,
        kinds: Vec<EventKind>,
        block_range: u64,
        poll_interval: Duration,
    ) -> Self {
        Self {
            backend,
            addresses,
            kinds,
            block_range: block_range.max(1),
            poll_interval,
        }
    }

    /// Events of the watched kinds from `from_block` onwards, following the chain head.
    pub fn stream(&self, from_block: u64, cancel: CancellationToken) -> EventStream {
        let cursor = Arc::new(AtomicU64::new(from_block));
        let state = PollState {
            watcher: self.clone(),
            next_block: from_block,
            pending: VecDeque::new(),
            drained_to: None,
            backoff: false,
            cursor: cursor.clone(),
            cancel: cancel.clone(),
        };
        EventStream {
            inner: stream::unfold(state, next_event).boxed(),
            cursor,
            cancel,
        }
    }

    fn filter(&self, from_block: u64, to_block: u64) -> LogFilter {
        LogFilter {
            addresses: self.addresses.clone(),
            topics: self.kinds.iter().map(EventKind::topic).collect(),
            from_block,
            to_block,
        }
    }

    fn decode(&self, log: Log) -> Option<WatchedEvent> {
        match decode_event(&log.topics, &log.data) {
            Ok(Some(event)) if self.kinds.contains(&event.kind()) => Some(WatchedEvent {
                event,
                block_number: log.block_number.unwrap_or_default(),
                tx_hash: log.transaction_hash,
                log_index: log.log_index,
            }),
            Ok(_) => None,
            Err(e) => {
                warn!("Skipping undecodable log in block {:?}: {}", log.block_number, e);
                None
            }
        }
    }
}

struct PollState {
    watcher: EventWatcher,
    next_block: u64,
    pending: VecDeque<WatchedEvent>,
    /// Last block of the range whose events are in `pending`.
    drained_to: Option<u64>,
    backoff: bool,
    cursor: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl PollState {
    /// `false` when cancelled during the sleep.
    async fn sleep(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.watcher.poll_interval) => true,
        }
    }
}

async fn next_event(mut state: PollState) -> Option<(Result<WatchedEvent, ChainError>, PollState)> {
    loop {
        if state.cancel.is_cancelled() {
            return None;
        }
        if let Some(event) = state.pending.pop_front() {
            return Some((Ok(event), state));
        }
        if let Some(to) = state.drained_to.take() {
            state.next_block = to + 1;
            state.cursor.store(state.next_block, Ordering::SeqCst);
        }
        if std::mem::take(&mut state.backoff) && !state.sleep().await {
            return None;
        }

        let head = match state.watcher.backend.block_number().await {
            Ok(head) => head,
            Err(e) => {
                state.backoff = true;
                return Some((Err(e), state));
            }
        };
        if head < state.next_block {
            if !state.sleep().await {
                return None;
            }
            continue;
        }

        let to = head.min(state.next_block.saturating_add(state.watcher.block_range - 1));
        let filter = state.watcher.filter(state.next_block, to);
        let mut logs = match state.watcher.backend.logs(&filter).await {
            Ok(logs) => logs,
            Err(e) => {
                state.backoff = true;
                return Some((Err(e), state));
            }
        };
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        debug!("Fetched {} logs for blocks {}..={}", logs.len(), state.next_block, to);

        let watcher = &state.watcher;
        state.pending.extend(logs.into_iter().filter_map(|log| watcher.decode(log)));
        state.drained_to = Some(to);
    }
}

/// Stream of decoded events plus the resume position.
pub struct EventStream {
    inner: BoxStream<'static, Result<WatchedEvent, ChainError>>,
    cursor: Arc<AtomicU64>,
    cancel: CancellationToken,
}

impl EventStream {
    /// First block not yet fully delivered.
    pub fn resume_block(&self) -> u64 {
        self.cursor.load(Ordering::SeqCst)
    }

    /// End the stream at its next poll. Undelivered events of the current
    /// range stay behind `resume_block`.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Stream for EventStream {
    type Item = Result<WatchedEvent, ChainError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}
