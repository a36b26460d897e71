// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::PathBuf;
use std::sync::Arc;

use settlement_kernel::events::EventKind;
use settlement_node::chain::ChainBackend;
use settlement_node::config::CommanderConfig;
use settlement_node::dispute::watcher::watch_rollbacks;
use settlement_node::dispute::{DisputeSettings, Disputer};
use settlement_node::errors::CommanderError;
use settlement_node::events::EventWatcher;
use settlement_node::network::{LocalSigner, RpcBackend};
use settlement_node::rollup::{RollupClient, RollupSettings};
use settlement_node::server::{build_router, AppState};
use settlement_node::submission::TxSender;
use settlement_node::telemetry::init_telemetry;
use settlement_node::waiter::ConfirmationWaiter;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), CommanderError> {
    init_telemetry();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = CommanderConfig::load(config_path.as_deref())?;
    tracing::info!("Initializing settlement node with config: {:?}", cfg);

    let backend: Arc<dyn ChainBackend> = Arc::new(RpcBackend::connect(&cfg.rpc_url)?);
    let signer = LocalSigner::from_hex(&cfg.private_key, cfg.chain_id)
        .map_err(|e| CommanderError::Config(e.to_string()))?;
    let (sender, sequencer) = TxSender::spawn(backend.clone(), Arc::new(signer), cfg.request_queue_size).await?;
    tracing::info!("Sending transactions from {}", sender.account());

    let waiter = ConfirmationWaiter::new(backend.clone(), cfg.poll_interval());
    let client = RollupClient::new(
        backend.clone(),
        sender.clone(),
        waiter.clone(),
        RollupSettings::from_config(&cfg),
    );
    let disputer = Disputer::new(client.reader().clone(), sender, waiter, DisputeSettings::from_config(&cfg));

    let next_batch = client.reader().next_batch_id().await?;
    match client.reader().get_invalid_batch_id().await? {
        Some(invalid) => tracing::warn!("Rollup is rolling back from batch {} (next id {})", invalid, next_batch),
        None => tracing::info!("Rollup healthy, next batch id {}", next_batch),
    }

    let cancel = CancellationToken::new();

    let app = build_router(AppState {
        reader: client.reader().clone(),
    });
    let listener = TcpListener::bind(cfg.metrics_addr).await?;
    tracing::info!("Listening on {}", cfg.metrics_addr);
    let server_cancel = cancel.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
    });

    let events = EventWatcher::new(
        backend.clone(),
        vec![cfg.rollup_address],
        vec![EventKind::RollbackStatus],
        cfg.event_block_range,
        cfg.poll_interval(),
    );
    let from_block = backend.block_number().await?;
    let watcher_cancel = cancel.clone();
    let watcher = tokio::spawn(async move {
        if let Err(e) = watch_rollbacks(disputer, events, from_block, watcher_cancel.clone()).await {
            tracing::error!("Rollback watcher failed: {}", e);
            watcher_cancel.cancel();
        }
    });

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("Shutdown requested");
        }
        _ = cancel.cancelled() => {}
    }
    cancel.cancel();

    if let Err(e) = watcher.await {
        tracing::error!("Rollback watcher task failed: {}", e);
    }
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("HTTP server error: {}", e),
        Err(e) => tracing::error!("HTTP server task failed: {}", e),
    }

    // The sequencer exits once the last sender handle is gone.
    drop(client);
    if let Err(e) = sequencer.await {
        tracing::error!("Sequencer task failed: {}", e);
    }
    Ok(())
}
