// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Aggregatable BLS signatures over BN254.
//!
//! Signatures live in G1 (two base-field words on-chain), public keys in G2
//! (four words). Every message is hashed to G1 under a deployment `Domain`
//! so a signature made for one deployment never verifies on another.
//!
//! The settlement contract is the verifier of record. This module only
//! constructs and aggregates; `verify_aggregate` is a reference check for
//! tests and diagnostics and is never used to accept data locally.

use alloy_primitives::{keccak256, U256};
use ark_bn254::{Bn254, Fq, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, Group};
use ark_ff::{BigInt, BigInteger, Field, PrimeField, UniformRand, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

/// Length of a domain tag in bytes.
pub const DOMAIN_LENGTH: usize = 32;

/// Deployment tag mixed into every hashed message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain(pub [u8; DOMAIN_LENGTH]);

impl Domain {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; DOMAIN_LENGTH] = bytes.try_into().map_err(|_| {
            KernelError::Encoding(format!(
                "domain must be {} bytes, got {}",
                DOMAIN_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| KernelError::Encoding(format!("domain hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DOMAIN_LENGTH] {
        &self.0
    }
}

/// One signer's signature, or an aggregate of many.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature(G1Affine);

/// Aggregates are plain signatures, so they aggregate again.
pub type AggregatedSignature = Signature;

impl Signature {
    /// `uint256[2]` layout used in calldata: `[x, y]`.
    pub fn to_words(&self) -> [U256; 2] {
        [fq_to_word(&self.0.x), fq_to_word(&self.0.y)]
    }

    /// 64-byte big-endian `x ++ y`, the packed form hashed into body roots.
    pub fn to_bytes(&self) -> [u8; 64] {
        let [x, y] = self.to_words();
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&x.to_be_bytes::<32>());
        out[32..].copy_from_slice(&y.to_be_bytes::<32>());
        out
    }

    pub fn from_words(words: [U256; 2]) -> Result<Self> {
        let x = word_to_fq(words[0])?;
        let y = word_to_fq(words[1])?;
        if x.is_zero() && y.is_zero() {
            return Ok(Self(G1Affine::zero()));
        }
        let point = G1Affine::new_unchecked(x, y);
        if !point.is_on_curve() {
            return Err(KernelError::InvalidPoint);
        }
        Ok(Self(point))
    }

    pub fn point(&self) -> &G1Affine {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey(G2Affine);

impl PublicKey {
    /// `uint256[4]` layout: `[x.c1, x.c0, y.c1, y.c0]` (imaginary part first).
    pub fn to_words(&self) -> [U256; 4] {
        [
            fq_to_word(&self.0.x.c1),
            fq_to_word(&self.0.x.c0),
            fq_to_word(&self.0.y.c1),
            fq_to_word(&self.0.y.c0),
        ]
    }

    /// Leaf stored in the account registry tree.
    pub fn leaf_hash(&self) -> alloy_primitives::B256 {
        let mut buf = Vec::with_capacity(128);
        for word in self.to_words() {
            buf.extend_from_slice(&word.to_be_bytes::<32>());
        }
        keccak256(buf)
    }

    pub fn point(&self) -> &G2Affine {
        &self.0
    }
}

/// Owns one signer's secret scalar.
pub struct Wallet {
    secret: Fr,
    public: PublicKey,
    domain: Domain,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("public", &self.public)
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Fresh wallet with a random secret.
    pub fn generate(domain: Domain) -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let secret = Fr::rand(&mut rng);
            if !secret.is_zero() {
                return Self::from_scalar(secret, domain);
            }
        }
    }

    /// Wallet from a 32-byte big-endian secret.
    pub fn from_secret_bytes(bytes: &[u8], domain: Domain) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(KernelError::InvalidSecretKey);
        }
        let secret = Fr::from_be_bytes_mod_order(bytes);
        if secret.is_zero() {
            return Err(KernelError::InvalidSecretKey);
        }
        Ok(Self::from_scalar(secret, domain))
    }

    fn from_scalar(secret: Fr, domain: Domain) -> Self {
        let public = PublicKey((G2Projective::generator() * secret).into_affine());
        Self { secret, public, domain }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        let point = hash_to_point(&self.domain, message);
        Signature((G1Projective::from(point) * self.secret).into_affine())
    }
}

/// Combine signatures into one. Order does not matter.
pub fn aggregate(signatures: &[Signature]) -> Result<AggregatedSignature> {
    if signatures.is_empty() {
        return Err(KernelError::EmptySignatureSet);
    }
    let sum = signatures
        .iter()
        .fold(G1Projective::zero(), |acc, sig| acc + G1Projective::from(sig.0));
    Ok(Signature(sum.into_affine()))
}

/// Combine public keys into one (same-message aggregation).
pub fn aggregate_public_keys(keys: &[PublicKey]) -> Result<PublicKey> {
    if keys.is_empty() {
        return Err(KernelError::EmptySignatureSet);
    }
    let sum = keys
        .iter()
        .fold(G2Projective::zero(), |acc, key| acc + G2Projective::from(key.0));
    Ok(PublicKey(sum.into_affine()))
}

/// Try-and-increment map of `keccak(domain ++ message ++ counter)` onto G1.
///
/// BN254 G1 has cofactor one, so every curve point found is in the group.
pub fn hash_to_point(domain: &Domain, message: &[u8]) -> G1Affine {
    let mut preimage = Vec::with_capacity(DOMAIN_LENGTH + message.len() + 4);
    preimage.extend_from_slice(domain.as_bytes());
    preimage.extend_from_slice(message);
    let prefix_len = preimage.len();

    let mut counter: u32 = 0;
    loop {
        preimage.truncate(prefix_len);
        preimage.extend_from_slice(&counter.to_be_bytes());
        let digest = keccak256(&preimage);
        let x = Fq::from_be_bytes_mod_order(digest.as_slice());
        let rhs = x.square() * x + Fq::from(3u64);
        if let Some(y) = rhs.sqrt() {
            let neg = -y;
            let y = if y.into_bigint() > neg.into_bigint() { neg } else { y };
            return G1Affine::new_unchecked(x, y);
        }
        counter = counter.wrapping_add(1);
    }
}

/// Reference pairing check `e(sig, g2) == prod e(H(m_i), pk_i)`.
pub fn verify_aggregate(domain: &Domain, signature: &Signature, signed: &[(PublicKey, &[u8])]) -> bool {
    if signed.is_empty() {
        return false;
    }
    let (points, keys): (Vec<G1Affine>, Vec<G2Affine>) = signed
        .iter()
        .map(|(key, message)| (hash_to_point(domain, message), key.0))
        .unzip();
    let lhs = Bn254::pairing(signature.0, G2Affine::generator());
    let rhs = Bn254::multi_pairing(points, keys);
    lhs == rhs
}

fn fq_to_word(value: &Fq) -> U256 {
    U256::from_be_slice(&value.into_bigint().to_bytes_be())
}

/// Words at or above the base-field modulus are not canonical and rejected.
fn word_to_fq(word: U256) -> Result<Fq> {
    Fq::from_bigint(BigInt::new(*word.as_limbs())).ok_or(KernelError::InvalidPoint)
}
