// chain-db/src/observers.rs

use chain_core::{Operation, SignedBlock, SignedTransaction, TransactionId, VirtualOperation};
use tracing::warn;

/// Either a signed operation being applied or a derived virtual operation
#[derive(Debug, Clone, Copy)]
pub enum OperationRef<'a> {
    User(&'a Operation),
    Virtual(&'a VirtualOperation),
}

/// Immutable notification handed to operation observers
#[derive(Debug, Clone, Copy)]
pub struct OperationNotification<'a> {
    pub trx_id: TransactionId,
    pub block_num: u64,
    pub trx_in_block: i32,
    pub op_in_trx: u32,
    /// Position among the block's virtual operations; zero for user ops
    pub virtual_op: u32,
    pub op: OperationRef<'a>,
}

type OperationHook = Box<dyn Fn(&OperationNotification<'_>) -> anyhow::Result<()> + Send + Sync>;
type BlockHook = Box<dyn Fn(&SignedBlock) -> anyhow::Result<()> + Send + Sync>;
type TransactionHook = Box<dyn Fn(&SignedTransaction) -> anyhow::Result<()> + Send + Sync>;

/// Subscription points for external services (projections, persistence
/// sinks, statistics).
///
/// Observers receive immutable notifications and must not mutate ledger
/// state. A failing observer is logged and skipped; consensus-critical
/// application never aborts on observer errors.
#[derive(Default)]
pub struct ObserverRegistry {
    pre_apply_operation: Vec<OperationHook>,
    post_apply_operation: Vec<OperationHook>,
    applied_block: Vec<BlockHook>,
    on_pending_transaction: Vec<TransactionHook>,
    on_applied_transaction: Vec<TransactionHook>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pre_apply_operation<F>(&mut self, hook: F)
    where
        F: Fn(&OperationNotification<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.pre_apply_operation.push(Box::new(hook));
    }

    pub fn on_post_apply_operation<F>(&mut self, hook: F)
    where
        F: Fn(&OperationNotification<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.post_apply_operation.push(Box::new(hook));
    }

    pub fn on_applied_block<F>(&mut self, hook: F)
    where
        F: Fn(&SignedBlock) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.applied_block.push(Box::new(hook));
    }

    pub fn on_pending_transaction<F>(&mut self, hook: F)
    where
        F: Fn(&SignedTransaction) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_pending_transaction.push(Box::new(hook));
    }

    pub fn on_applied_transaction<F>(&mut self, hook: F)
    where
        F: Fn(&SignedTransaction) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_applied_transaction.push(Box::new(hook));
    }

    pub(crate) fn notify_pre_apply_operation(&self, note: &OperationNotification<'_>) {
        for hook in &self.pre_apply_operation {
            if let Err(e) = hook(note) {
                warn!("pre-apply-operation observer failed: {:#}", e);
            }
        }
    }

    pub(crate) fn notify_post_apply_operation(&self, note: &OperationNotification<'_>) {
        for hook in &self.post_apply_operation {
            if let Err(e) = hook(note) {
                warn!("post-apply-operation observer failed: {:#}", e);
            }
        }
    }

    pub(crate) fn notify_applied_block(&self, block: &SignedBlock) {
        for hook in &self.applied_block {
            if let Err(e) = hook(block) {
                warn!(
                    "applied-block observer failed at block {}: {:#}",
                    block.header.number, e
                );
            }
        }
    }

    pub(crate) fn notify_pending_transaction(&self, tx: &SignedTransaction) {
        for hook in &self.on_pending_transaction {
            if let Err(e) = hook(tx) {
                warn!("pending-transaction observer failed: {:#}", e);
            }
        }
    }

    pub(crate) fn notify_applied_transaction(&self, tx: &SignedTransaction) {
        for hook in &self.on_applied_transaction {
            if let Err(e) = hook(tx) {
                warn!("applied-transaction observer failed: {:#}", e);
            }
        }
    }
}
