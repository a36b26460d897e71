// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const TX_SENT: &str = "settlement_transactions_sent_total";
pub const TX_REJECTED: &str = "settlement_broadcasts_rejected_total";
pub const TX_INDETERMINATE: &str = "settlement_broadcasts_indeterminate_total";
pub const NEXT_NONCE: &str = "settlement_next_nonce";
pub const MINING_TIMEOUTS: &str = "settlement_mining_timeouts_total";
pub const CONFIRMATION_SECONDS: &str = "settlement_confirmation_seconds";
pub const DISPUTES: &str = "settlement_disputes_total";
pub const ROLLBACK_STEPS: &str = "settlement_rollback_steps_total";

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "settlement_node=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROM_HANDLE.set(handle).is_err() {
                tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
            }
        }
        Err(e) => tracing::error!("failed to install Prometheus recorder: {}", e),
    }

    metrics::describe_counter!(TX_SENT, "Transactions accepted by the node");
    metrics::describe_counter!(TX_REJECTED, "Broadcasts refused before mempool admission");
    metrics::describe_counter!(TX_INDETERMINATE, "Broadcasts whose outcome is unknown");
    metrics::describe_gauge!(NEXT_NONCE, "Next nonce the sequencer will assign");
    metrics::describe_counter!(MINING_TIMEOUTS, "Waits that hit their mining deadline");
    metrics::describe_histogram!(CONFIRMATION_SECONDS, "Time from wait start to receipt");
    metrics::describe_counter!(DISPUTES, "Dispute attempts by outcome");
    metrics::describe_counter!(ROLLBACK_STEPS, "keepRollingBack transactions mined");

    metrics::gauge!("settlement_node_up", 1.0);
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
