// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! settlement-node: the async half of the rollup coordinator.
//!
//! Chain access, the nonce-sequenced submission pipeline, confirmation
//! waiting, the dispute and rollback protocol, and event watching.

pub mod chain;
pub mod config;
pub mod dispute;
pub mod errors;
pub mod events;
pub mod network;
pub mod rollup;
pub mod server;
pub mod submission;
pub mod telemetry;
pub mod waiter;
