use std::collections::HashMap;
use std::io::Write;

use alloy_primitives::{Address, U256};
use settlement_node::config::CommanderConfig;
use settlement_node::errors::CommanderError;
use tempfile::NamedTempFile;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config_is_valid() {
    let cfg = CommanderConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.request_queue_size, 32);
    assert_eq!(cfg.bls_domain().unwrap().as_bytes(), &[0u8; 32]);
}

#[test]
fn test_env_overrides() {
    let mut cfg = CommanderConfig::default();
    cfg.apply_env(env(&[
        ("SETTLEMENT_RPC_URL", "http://node:8545"),
        ("SETTLEMENT_CHAIN_ID", "31337"),
        ("SETTLEMENT_ROLLUP_ADDRESS", "0x1010101010101010101010101010101010101010"),
        ("SETTLEMENT_STAKE_AMOUNT", "250"),
        ("SETTLEMENT_POLL_INTERVAL_MS", "100"),
        ("SETTLEMENT_MAX_ROLLBACK_STEPS", "4"),
        ("SETTLEMENT_BATCH_ACCOUNT_REGISTRATION_GAS_LIMIT", "9000000"),
    ]))
    .unwrap();

    assert_eq!(cfg.rpc_url, "http://node:8545");
    assert_eq!(cfg.chain_id, 31337);
    assert_eq!(cfg.rollup_address, Address::repeat_byte(0x10));
    assert_eq!(cfg.stake_amount, U256::from(250));
    assert_eq!(cfg.poll_interval_ms, 100);
    assert_eq!(cfg.max_rollback_steps, 4);
    assert_eq!(cfg.batch_account_registration_gas_limit, 9_000_000);
    cfg.validate().unwrap();
}

#[test]
fn test_bad_env_value() {
    let mut cfg = CommanderConfig::default();
    let err = cfg.apply_env(env(&[("SETTLEMENT_CHAIN_ID", "mainnet")])).unwrap_err();
    assert!(matches!(err, CommanderError::Config(msg) if msg.contains("SETTLEMENT_CHAIN_ID")));
}

#[test]
fn test_validation_rejects_bad_timing() {
    let mut cfg = CommanderConfig::default();
    cfg.poll_interval_ms = 0;
    assert!(cfg.validate().is_err());

    cfg.poll_interval_ms = 2_000;
    cfg.mine_timeout_ms = 1_000;
    assert!(cfg.validate().is_err());

    let mut cfg = CommanderConfig::default();
    cfg.request_queue_size = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = CommanderConfig::default();
    cfg.domain = "0x1234".into();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"rpc_url": "http://10.0.0.2:8545", "chain_id": 5, "mine_timeout_ms": 30000, "request_queue_size": 8}}"#
    )
    .unwrap();

    let cfg = CommanderConfig::load(Some(file.path())).unwrap();
    assert_eq!(cfg.chain_id, 5);
    assert_eq!(cfg.mine_timeout_ms, 30_000);
    assert_eq!(cfg.request_queue_size, 8);
    // Unspecified fields keep their defaults.
    assert_eq!(cfg.poll_interval_ms, CommanderConfig::default().poll_interval_ms);
}

#[test]
fn test_debug_redacts_private_key() {
    let mut cfg = CommanderConfig::default();
    cfg.private_key = "0xdeadbeefdeadbeef".into();
    let printed = format!("{:?}", cfg);
    assert!(!printed.contains("deadbeef"));
    assert!(printed.contains("<redacted>"));
}
