// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{transaction::eip2718::TypedTransaction, TransactionRequest};

use super::{from_h160, to_eth_u256, to_h160};
use crate::chain::{SignedTransaction, SignerError, TxSigner, UnsignedTransaction};

/// Local secp256k1 key producing legacy EIP-155 transactions.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    wallet: LocalWallet,
}

impl LocalSigner {
    pub fn from_hex(key: &str, chain_id: u64) -> Result<Self, SignerError> {
        let wallet = LocalWallet::from_str(key.trim())
            .map_err(|e| SignerError(format!("bad private key: {}", e)))?
            .with_chain_id(chain_id);
        Ok(Self { wallet })
    }
}

#[async_trait]
impl TxSigner for LocalSigner {
    fn address(&self) -> Address {
        from_h160(self.wallet.address())
    }

    fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    async fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction, SignerError> {
        let request: TypedTransaction = TransactionRequest::new()
            .from(to_h160(tx.from))
            .to(to_h160(tx.to))
            .data(ethers::types::Bytes::from(tx.data.to_vec()))
            .value(to_eth_u256(tx.value))
            .gas(tx.gas_limit)
            .gas_price(to_eth_u256(tx.gas_price))
            .nonce(tx.nonce)
            .chain_id(tx.chain_id)
            .into();
        let signature = self
            .wallet
            .sign_transaction(&request)
            .await
            .map_err(|e| SignerError(e.to_string()))?;
        let raw = request.rlp_signed(&signature);
        let hash = B256::from(ethers::utils::keccak256(&raw));
        Ok(SignedTransaction {
            hash,
            raw: Bytes::from(raw.to_vec()),
            tx,
        })
    }
}
