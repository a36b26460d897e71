// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! HTTP JSON-RPC implementations of the chain boundary.

pub mod rpc;
pub mod signer;

pub use rpc::RpcBackend;
pub use signer::LocalSigner;

use alloy_primitives::{Address, B256, U256};
use ethers::types::{H160, H256, U256 as EthU256};

pub(crate) fn to_h160(address: Address) -> H160 {
    H160::from_slice(address.as_slice())
}

pub(crate) fn to_h256(hash: B256) -> H256 {
    H256::from_slice(hash.as_slice())
}

pub(crate) fn from_h160(address: H160) -> Address {
    Address::from_slice(address.as_bytes())
}

pub(crate) fn from_h256(hash: H256) -> B256 {
    B256::from(hash.0)
}

pub(crate) fn to_eth_u256(value: U256) -> EthU256 {
    EthU256::from_big_endian(&value.to_be_bytes::<32>())
}

pub(crate) fn from_eth_u256(value: EthU256) -> U256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    U256::from_be_bytes(bytes)
}
