// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::errors::CommanderError;
use crate::rollup::RollupReader;
use crate::telemetry;

#[derive(Clone)]
pub struct AppState {
    pub reader: RollupReader,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, CommanderError> {
    let block_number = state.reader.backend().block_number().await?;
    let invalid_batch_id = state.reader.get_invalid_batch_id().await?;
    let status = if invalid_batch_id.is_some() { "rolling_back" } else { "ok" };

    Ok(Json(json!({
        "status": status,
        "block_number": block_number,
        "invalid_batch_id": invalid_batch_id.map(|id| id.0),
    })))
}

async fn metrics_handler() -> String {
    telemetry::get_metrics()
}
