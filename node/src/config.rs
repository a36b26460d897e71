// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use settlement_kernel::bls::Domain;

use crate::errors::CommanderError;

const ENV_PREFIX: &str = "SETTLEMENT_";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Hex secp256k1 key of the account every transaction is sent from.
    pub private_key: String,
    pub rollup_address: Address,
    pub account_registry_address: Address,
    /// 32-byte hex BLS signing domain.
    pub domain: String,
    /// Value attached to every batch submission, in wei.
    pub stake_amount: U256,
    pub mine_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub request_queue_size: usize,
    pub transition_dispute_gas_limit: u64,
    pub signature_dispute_gas_limit: u64,
    /// Fixed gas for `registerBatch`, which registers sixteen keys at once.
    pub batch_account_registration_gas_limit: u64,
    pub max_rollback_steps: u32,
    pub event_block_range: u64,
    pub metrics_addr: SocketAddr,
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            chain_id: 1337,
            private_key: String::new(),
            rollup_address: Address::ZERO,
            account_registry_address: Address::ZERO,
            domain: format!("0x{}", "00".repeat(32)),
            stake_amount: U256::from(100_000_000_000_000_000u64),
            mine_timeout_ms: 60_000,
            poll_interval_ms: 500,
            request_queue_size: 32,
            transition_dispute_gas_limit: 5_000_000,
            signature_dispute_gas_limit: 7_500_000,
            batch_account_registration_gas_limit: 8_000_000,
            max_rollback_steps: 32,
            event_block_range: 1_000,
            metrics_addr: SocketAddr::from(([127, 0, 0, 1], 9100)),
        }
    }
}

impl std::fmt::Debug for CommanderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommanderConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("private_key", &"<redacted>")
            .field("rollup_address", &self.rollup_address)
            .field("account_registry_address", &self.account_registry_address)
            .field("domain", &self.domain)
            .field("stake_amount", &self.stake_amount)
            .field("mine_timeout_ms", &self.mine_timeout_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_queue_size", &self.request_queue_size)
            .field("transition_dispute_gas_limit", &self.transition_dispute_gas_limit)
            .field("signature_dispute_gas_limit", &self.signature_dispute_gas_limit)
            .field(
                "batch_account_registration_gas_limit",
                &self.batch_account_registration_gas_limit,
            )
            .field("max_rollback_steps", &self.max_rollback_steps)
            .field("event_block_range", &self.event_block_range)
            .field("metrics_addr", &self.metrics_addr)
            .finish()
    }
}

impl CommanderConfig {
    /// JSON file (if any), then `SETTLEMENT_*` environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, CommanderError> {
        let mut cfg = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                serde_json::from_str(&raw)
                    .map_err(|e| CommanderError::Config(format!("{}: {}", path.display(), e)))?
            }
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from `lookup`, which maps full variable names to values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), CommanderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = get("RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = get("PRIVATE_KEY") {
            self.private_key = v;
        }
        if let Some(v) = get("DOMAIN") {
            self.domain = v;
        }
        if let Some(v) = get("CHAIN_ID") {
            self.chain_id = parse_var("CHAIN_ID", &v)?;
        }
        if let Some(v) = get("ROLLUP_ADDRESS") {
            self.rollup_address = parse_var("ROLLUP_ADDRESS", &v)?;
        }
        if let Some(v) = get("ACCOUNT_REGISTRY_ADDRESS") {
            self.account_registry_address = parse_var("ACCOUNT_REGISTRY_ADDRESS", &v)?;
        }
        if let Some(v) = get("STAKE_AMOUNT") {
            self.stake_amount = parse_var("STAKE_AMOUNT", &v)?;
        }
        if let Some(v) = get("MINE_TIMEOUT_MS") {
            self.mine_timeout_ms = parse_var("MINE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_var("POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = get("REQUEST_QUEUE_SIZE") {
            self.request_queue_size = parse_var("REQUEST_QUEUE_SIZE", &v)?;
        }
        if let Some(v) = get("TRANSITION_DISPUTE_GAS_LIMIT") {
            self.transition_dispute_gas_limit = parse_var("TRANSITION_DISPUTE_GAS_LIMIT", &v)?;
        }
        if let Some(v) = get("SIGNATURE_DISPUTE_GAS_LIMIT") {
            self.signature_dispute_gas_limit = parse_var("SIGNATURE_DISPUTE_GAS_LIMIT", &v)?;
        }
        if let Some(v) = get("BATCH_ACCOUNT_REGISTRATION_GAS_LIMIT") {
            self.batch_account_registration_gas_limit = parse_var("BATCH_ACCOUNT_REGISTRATION_GAS_LIMIT", &v)?;
        }
        if let Some(v) = get("MAX_ROLLBACK_STEPS") {
            self.max_rollback_steps = parse_var("MAX_ROLLBACK_STEPS", &v)?;
        }
        if let Some(v) = get("EVENT_BLOCK_RANGE") {
            self.event_block_range = parse_var("EVENT_BLOCK_RANGE", &v)?;
        }
        if let Some(v) = get("METRICS_ADDR") {
            self.metrics_addr = parse_var("METRICS_ADDR", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CommanderError> {
        if self.poll_interval_ms == 0 {
            return Err(CommanderError::Config("poll_interval_ms must be positive".into()));
        }
        if self.poll_interval_ms > self.mine_timeout_ms {
            return Err(CommanderError::Config(format!(
                "poll_interval_ms ({}) exceeds mine_timeout_ms ({})",
                self.poll_interval_ms, self.mine_timeout_ms
            )));
        }
        if self.request_queue_size == 0 {
            return Err(CommanderError::Config("request_queue_size must be positive".into()));
        }
        if self.event_block_range == 0 {
            return Err(CommanderError::Config("event_block_range must be positive".into()));
        }
        self.bls_domain()?;
        Ok(())
    }

    pub fn mine_timeout(&self) -> Duration {
        Duration::from_millis(self.mine_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn bls_domain(&self) -> Result<Domain, CommanderError> {
        Domain::from_hex(&self.domain).map_err(|e| CommanderError::Config(e.to_string()))
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, CommanderError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CommanderError::Config(format!("{}{}={:?}: {}", ENV_PREFIX, name, value, e)))
}
