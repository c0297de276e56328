// chain-crypto/src/lib.rs

//! Cryptographic primitives for the ledger
//!
//! This crate provides:
//! - Digest computation over canonical byte encodings
//! - Key pairs and signatures for producers and account authorities
//! - Merkle trees for the per-block transaction root

pub mod digest;
pub mod keys;
pub mod merkle;
pub mod signature;

pub use digest::{Digest, DigestAlgorithm, Digestible};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use merkle::{MerkleProof, MerkleTree};
pub use signature::{Signature, SignatureScheme};

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid digest length")]
    InvalidDigest,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Merkle error: {0}")]
    MerkleError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}
