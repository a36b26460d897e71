// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use futures::StreamExt;
use settlement_kernel::events::RollupEvent;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Disputer, RollbackOutcome};
use crate::errors::DisputeError;
use crate::events::EventWatcher;

/// Drive rollbacks to completion until cancelled.
///
/// Checks the invalid-batch marker once at start, then reacts to
/// `RollbackStatus` events that report an unfinished rollback. Transient
/// chain errors on the event stream are logged and retried; failures of the
/// rollback itself end the watcher.
pub async fn watch_rollbacks(
    disputer: Disputer,
    events: EventWatcher,
    from_block: u64,
    cancel: CancellationToken,
) -> Result<(), DisputeError> {
    if disputer.reader.get_invalid_batch_id().await?.is_some() {
        report(disputer.keep_rolling_back().await?);
    }

    let mut stream = events.stream(from_block, cancel.child_token());
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = stream.next() => next,
        };
        match next {
            Some(Ok(watched)) => {
                if let RollupEvent::RollbackStatus {
                    start_id,
                    completed: false,
                    ..
                } = watched.event
                {
                    info!("Rollback from batch {} in progress (block {})", start_id, watched.block_number);
                    report(disputer.keep_rolling_back().await?);
                }
            }
            Some(Err(e)) => warn!("Rollback event stream error: {}", e),
            None => break,
        }
    }
    info!("Rollback watcher stopped at block {}", stream.resume_block());
    Ok(())
}

fn report(outcome: RollbackOutcome) {
    match outcome {
        RollbackOutcome::Completed { steps } => info!("Rollback completed in {} steps", steps),
        RollbackOutcome::AlreadyCompleted => info!("Rollback already completed"),
    }
}
