// chain-core/src/lib.rs

//! Core ledger data structures and the versioned object store
//!
//! This crate provides:
//! - Asset and price integer arithmetic
//! - The ledger-resident object model (accounts, content, producers, orders)
//! - The versioned store with nested checkpoint/undo sessions
//! - Block, transaction and operation types
//! - The shared consensus error taxonomy

pub mod asset;
pub mod authority;
pub mod block;
pub mod objects;
pub mod operations;
pub mod store;
pub mod transaction;
pub mod types;

pub use asset::{Asset, Price, Symbol};
pub use authority::Authority;
pub use block::{BlockHeader, HeaderExtension, SignedBlock};
pub use objects::*;
pub use operations::{Operation, VirtualOperation};
pub use store::Ledger;
pub use transaction::{SignedTransaction, Transaction};
pub use types::*;

use chain_crypto::Digest;

/// Result type for ledger operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur while applying blocks, transactions and operations.
///
/// The taxonomy follows the failure-handling contract of the engine:
/// malformed input and logic violations are rejected before any mutation
/// becomes visible; consistency errors are fatal and halt the node.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    // --- malformed input ---
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Missing {kind}: {key}")]
    MissingObject { kind: &'static str, key: String },

    #[error("{kind} already exists: {key}")]
    DuplicateObject { kind: &'static str, key: String },

    #[error("Signature verification failed: {0}")]
    SignatureMismatch(String),

    #[error("Block not linked: {0}")]
    UnlinkedBlock(String),

    // --- logic violations ---
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Missing required {0} authority")]
    InsufficientAuthority(&'static str),

    #[error("Transaction expired at {0}")]
    ExpiredTransaction(Timestamp),

    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(Digest),

    #[error("Account exceeded maximum allowed bandwidth per vesting share")]
    BandwidthExceeded,

    #[error("Logic violation: {0}")]
    LogicViolation(String),

    // --- consistency / internal (fatal) ---
    #[error("Consistency violation: {0}")]
    Consistency(String),

    #[error("Missing singleton object: {0}")]
    MissingSingleton(&'static str),

    #[error("Undo history exhausted: head {head} is too far past irreversible {irreversible}")]
    UndoHistoryExhausted { head: u64, irreversible: u64 },

    #[error("Chain knows of no hardfork {0}")]
    UnknownHardfork(u32),

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    // --- resource pressure ---
    #[error("Backing store near capacity: {0}")]
    ResourcePressure(String),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] chain_crypto::CryptoError),
}

impl ChainError {
    /// Fatal errors halt the node for investigation instead of being
    /// surfaced to the submitting peer.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ChainError::Consistency(_)
                | ChainError::MissingSingleton(_)
                | ChainError::UndoHistoryExhausted { .. }
                | ChainError::UnknownHardfork(_)
                | ChainError::Overflow(_)
        )
    }

    pub fn missing<K: std::fmt::Display>(kind: &'static str, key: K) -> Self {
        ChainError::MissingObject {
            kind,
            key: key.to_string(),
        }
    }

    pub fn duplicate<K: std::fmt::Display>(kind: &'static str, key: K) -> Self {
        ChainError::DuplicateObject {
            kind,
            key: key.to_string(),
        }
    }
}
