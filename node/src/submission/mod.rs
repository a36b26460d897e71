// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Nonce-sequenced submission pipeline.
//!
//! Every state-mutating transaction from the coordinator account goes
//! through one `TxSender`. A single task owns the nonce counter; callers
//! only ever talk to it through a bounded queue.

pub mod request;
pub mod sequencer;

pub use request::{SendResponse, SentTransaction, TxSendingRequest};
pub use sequencer::TxSender;
