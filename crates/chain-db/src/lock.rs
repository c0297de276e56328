// chain-db/src/lock.rs

//! Single-writer concurrency wrapper.
//!
//! All ledger mutation happens under one of two write modes: the strong
//! lock (block application, initialization) excludes everything else, and
//! the weak lock (pushing one pending transaction) excludes other writers.
//! Read-only queries take the shared lock and can never observe a
//! half-applied block, because writers hold the exclusive lock across the
//! whole application.

use crate::Database;
use std::sync::{Arc, RwLock};

/// A shareable handle around the engine
#[derive(Clone)]
pub struct SharedDatabase {
    inner: Arc<RwLock<Database>>,
}

impl SharedDatabase {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(RwLock::new(db)),
        }
    }

    /// Read-only access; concurrent with other readers
    pub fn with_read<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        let guard = self.inner.read().expect("database lock poisoned");
        f(&guard)
    }

    /// Strong write access: block application, reindexing
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Database) -> R) -> R {
        let mut guard = self.inner.write().expect("database lock poisoned");
        f(&mut guard)
    }

    /// Weak write access: pushing a single pending transaction. Mutual
    /// exclusion is the same as the strong lock; the distinction is kept at
    /// the API level so callers state their intent.
    pub fn with_weak_write<R>(&self, f: impl FnOnce(&mut Database) -> R) -> R {
        self.with_write(f)
    }
}
