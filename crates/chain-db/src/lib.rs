// chain-db/src/lib.rs

//! The state-transition engine
//!
//! `Database` owns the ledger, the fork index and the evaluator dispatch.
//! It applies blocks and transactions under nested undo sessions, resolves
//! competing branches, runs the fixed-order periodic economic processes and
//! exposes the observer hooks external services subscribe to.

pub mod auth;
pub mod balance;
pub mod bandwidth;
pub mod config;
pub mod database;
pub mod evaluators;
pub mod genesis;
pub mod invariants;
pub mod lock;
pub mod observers;
pub mod process;
pub mod skip;

pub use config::ChainConfig;
pub use database::Database;
pub use genesis::{GenesisSnapshot, SnapshotAccount};
pub use lock::SharedDatabase;
pub use observers::{ObserverRegistry, OperationNotification, OperationRef};
pub use skip::SkipFlags;

pub use chain_core::{ChainError, ChainResult};
