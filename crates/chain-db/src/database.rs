// chain-db/src/database.rs

use crate::{
    evaluators, genesis, observers::OperationRef, ChainConfig, ChainError, ChainResult,
    ObserverRegistry, OperationNotification, SkipFlags,
};
use chain_core::{
    AccountName, BlockId, HeaderExtension, Ledger, Operation, SignedBlock, SignedTransaction,
    Timestamp, TransactionId, TransactionObject, VirtualOperation,
};
use chain_crypto::KeyPair;
use consensus::{ForkDatabase, HardforkSchedule};
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// The state-transition engine.
///
/// A `Database` owns the canonical ledger and applies blocks and
/// transactions to it under nested undo sessions. One frame exists per
/// reversible block; popping a block drops its frame, and advancing the
/// irreversible watermark commits the oldest frames for good.
pub struct Database {
    pub(crate) ledger: Ledger,
    pub(crate) fork_db: ForkDatabase,
    pub(crate) config: ChainConfig,
    pub(crate) hardfork_schedule: HardforkSchedule,
    pub(crate) observers: ObserverRegistry,

    pending_transactions: Vec<SignedTransaction>,
    pending_session_open: bool,
    /// Closed undo frames, one per reversible block
    block_frames: usize,
    /// Block number of the oldest frame still on the stack
    oldest_frame_block: u64,
    /// True while speculatively applying a pushed transaction
    pub(crate) producing: bool,
    /// Refuse new transactions while an administrative migration is running
    migration_lock: bool,

    pub(crate) current_block_num: u64,
    pub(crate) current_trx_id: TransactionId,
    pub(crate) current_trx_in_block: i32,
    pub(crate) current_op_in_trx: u32,
    pub(crate) current_virtual_op: u32,
}

impl Database {
    /// Open an engine with the given consensus constants, bootstrapping
    /// genesis state if the ledger is empty.
    pub fn open(config: ChainConfig) -> ChainResult<Self> {
        let hardfork_schedule = HardforkSchedule::new(&config.hardfork_table)?;
        let fork_db = ForkDatabase::new(config.max_undo_history);

        let mut db = Self {
            ledger: Ledger::new(),
            fork_db,
            config,
            hardfork_schedule,
            observers: ObserverRegistry::new(),
            pending_transactions: Vec::new(),
            pending_session_open: false,
            block_frames: 0,
            oldest_frame_block: 1,
            producing: false,
            migration_lock: false,
            current_block_num: 0,
            current_trx_id: TransactionId::zero(),
            current_trx_in_block: -1,
            current_op_in_trx: 0,
            current_virtual_op: 0,
        };

        if !db.ledger.globals_initialized() {
            genesis::initialize(&mut db, None)?;
        }
        Ok(db)
    }

    /// Open with a balance snapshot imported at genesis
    pub fn open_with_snapshot(
        config: ChainConfig,
        snapshot: &genesis::GenesisSnapshot,
    ) -> ChainResult<Self> {
        let hardfork_schedule = HardforkSchedule::new(&config.hardfork_table)?;
        let fork_db = ForkDatabase::new(config.max_undo_history);

        let mut db = Self {
            ledger: Ledger::new(),
            fork_db,
            config,
            hardfork_schedule,
            observers: ObserverRegistry::new(),
            pending_transactions: Vec::new(),
            pending_session_open: false,
            block_frames: 0,
            oldest_frame_block: 1,
            producing: false,
            migration_lock: false,
            current_block_num: 0,
            current_trx_id: TransactionId::zero(),
            current_trx_in_block: -1,
            current_op_in_trx: 0,
            current_virtual_op: 0,
        };
        genesis::initialize(&mut db, Some(snapshot))?;
        Ok(db)
    }

    // --- accessors ---

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn observers_mut(&mut self) -> &mut ObserverRegistry {
        &mut self.observers
    }

    pub fn head_block_num(&self) -> u64 {
        self.ledger
            .globals()
            .map(|g| g.head_block_number)
            .unwrap_or(0)
    }

    pub fn head_block_id(&self) -> BlockId {
        self.ledger
            .globals()
            .map(|g| g.head_block_id)
            .unwrap_or_else(|_| BlockId::zero())
    }

    pub fn head_block_time(&self) -> Timestamp {
        self.ledger.globals().map(|g| g.time).unwrap_or(Timestamp::ZERO)
    }

    pub fn last_irreversible_block_num(&self) -> u64 {
        self.ledger
            .globals()
            .map(|g| g.last_irreversible_block_num)
            .unwrap_or(0)
    }

    pub fn pending_transactions(&self) -> &[SignedTransaction] {
        &self.pending_transactions
    }

    /// True once hardfork `n` has been applied
    pub fn has_hardfork(&self, n: u32) -> bool {
        self.ledger
            .hardforks()
            .map(|h| h.has_hardfork(n))
            .unwrap_or(false)
    }

    pub fn set_migration_lock(&mut self, locked: bool) {
        self.migration_lock = locked;
    }

    // --- slot arithmetic ---

    /// Wall-clock time of a future production slot; slot 0 is the head
    pub fn get_slot_time(&self, slot: u64) -> Timestamp {
        if slot == 0 {
            return Timestamp::ZERO;
        }
        let interval = self.config.block_interval_secs;
        if self.head_block_num() == 0 {
            // first block lands one interval past genesis
            return self.config.genesis_time.saturating_add(slot * interval);
        }
        let head_abs_slot = self.head_block_time().secs() / interval;
        Timestamp::from_secs(head_abs_slot * interval + slot * interval)
    }

    /// Which slot a timestamp falls into; 0 for anything at or before head
    pub fn get_slot_at_time(&self, when: Timestamp) -> u64 {
        let first_slot_time = self.get_slot_time(1);
        if when < first_slot_time {
            return 0;
        }
        when.secs_since(first_slot_time) / self.config.block_interval_secs + 1
    }

    /// The producer scheduled for a slot
    pub fn get_scheduled_producer(&self, slot: u64) -> ChainResult<AccountName> {
        let globals = self.ledger.globals()?;
        let schedule = self.ledger.schedule()?;
        let aslot = globals.current_aslot + slot;
        let index = (aslot % schedule.num_scheduled_witnesses as u64) as usize;
        schedule
            .current_shuffled_witnesses
            .get(index)
            .cloned()
            .ok_or_else(|| ChainError::Consistency("producer schedule is empty".into()))
    }

    // --- block ingestion ---

    /// Apply a candidate block, switching branches if it proves out a
    /// better fork. Returns true when a branch switch happened.
    ///
    /// Pending transactions are set aside first and speculatively replayed
    /// afterwards; ones that no longer apply are dropped.
    pub fn push_block(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<bool> {
        let pending = std::mem::take(&mut self.pending_transactions);
        self.clear_pending_session();

        let result = self._push_block(block, skip);

        for tx in pending {
            if let Err(e) = self._push_transaction(tx, skip) {
                debug!("dropping pending transaction after block: {}", e);
            }
        }
        result
    }

    fn _push_block(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<bool> {
        if !skip.contains(SkipFlags::FORK_DB) {
            let best_head = self.fork_db.push_block(block.clone())?;
            self.maybe_warn_multiple_production(block.header.number);

            if block.header.previous != self.head_block_id() {
                // Not an extension of the current head. Only a strictly
                // taller branch triggers a switch; otherwise the block
                // just waits in the index.
                let best_num = self
                    .fork_db
                    .fetch_block(&best_head)
                    .map(|b| b.header.number)
                    .unwrap_or(0);
                if best_head != block.id() || best_num <= self.head_block_num() {
                    return Ok(false);
                }
                self.switch_forks(best_head, skip)?;
                return Ok(true);
            }
        }

        self.apply_block_with_session(block, skip).map_err(|e| {
            error!("failed to push block {}: {}", block.header.number, e);
            self.fork_db.remove(&block.id());
            e
        })?;
        Ok(false)
    }

    fn apply_block_with_session(
        &mut self,
        block: &SignedBlock,
        skip: SkipFlags,
    ) -> ChainResult<()> {
        self.ledger.begin_undo_session();
        match self.apply_block(block, skip) {
            Ok(()) => {
                self.block_frames += 1;
                self.fork_db.set_head(block.id());
                Ok(())
            }
            Err(e) => {
                self.ledger.undo_session();
                Err(e)
            }
        }
    }

    /// Pop back to the common ancestor and replay the winning branch.
    /// If any replayed block fails, the previous branch is restored in
    /// full before the error escapes.
    fn switch_forks(&mut self, new_head: BlockId, skip: SkipFlags) -> ChainResult<()> {
        warn!("switching to fork {}", new_head);
        let (new_branch, old_branch) = self
            .fork_db
            .fetch_branch_from(new_head, self.head_block_id())?;

        let fork_point = new_branch
            .last()
            .map(|b| b.header.previous)
            .unwrap_or_else(|| self.head_block_id());

        while self.head_block_id() != fork_point {
            self.pop_block()?;
        }

        for (idx, block) in new_branch.iter().rev().enumerate() {
            if let Err(e) = self.apply_block_with_session(block, skip) {
                warn!("fork block {} failed: {}; restoring previous branch", block.id(), e);

                // the failed block and everything above it are invalid
                for bad in new_branch.iter().take(new_branch.len() - idx) {
                    self.fork_db.remove(&bad.id());
                }

                while self.head_block_id() != fork_point {
                    self.pop_block()?;
                }

                for prev in old_branch.iter().rev() {
                    self.apply_block_with_session(prev, skip)?;
                }
                if let Some(tip) = old_branch.first() {
                    self.fork_db.set_head(tip.id());
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn maybe_warn_multiple_production(&self, number: u64) {
        let at_height = self.fork_db.fetch_blocks_by_number(number);
        if at_height.len() > 1 {
            warn!(
                "block number collision at height {}: {} candidates",
                number,
                at_height.len()
            );
        }
    }

    /// Undo the head block, returning the ledger to its parent state
    pub fn pop_block(&mut self) -> ChainResult<()> {
        if self.block_frames == 0 || self.head_block_num() <= self.last_irreversible_block_num() {
            return Err(ChainError::Consistency(
                "cannot pop an irreversible block".into(),
            ));
        }
        if self.pending_session_open {
            return Err(ChainError::Consistency(
                "pending transactions must be cleared before popping".into(),
            ));
        }
        let popped = self.head_block_id();
        self.ledger.undo_session();
        self.block_frames -= 1;

        if let Some(block) = self.fork_db.fetch_block(&popped) {
            let previous = block.header.previous;
            self.fork_db.set_head(previous);
        }
        Ok(())
    }

    /// Drop all pending transactions and their speculative state
    pub fn clear_pending(&mut self) {
        self.pending_transactions.clear();
        self.clear_pending_session();
    }

    fn clear_pending_session(&mut self) {
        if self.pending_session_open {
            self.ledger.undo_session();
            self.pending_session_open = false;
        }
    }

    // --- transaction ingestion ---

    /// Validate and speculatively apply a transaction into the pending set
    pub fn push_transaction(
        &mut self,
        tx: SignedTransaction,
        skip: SkipFlags,
    ) -> ChainResult<()> {
        if self.migration_lock {
            return Err(ChainError::LogicViolation(
                "transaction ingestion is locked for migration".into(),
            ));
        }
        let max_size = self
            .config
            .max_transaction_size(self.ledger.globals()?.maximum_block_size);
        if tx.serialized_size() > max_size {
            return Err(ChainError::InvalidTransaction(format!(
                "transaction exceeds the {} byte limit",
                max_size
            )));
        }

        self.producing = true;
        let result = self._push_transaction(tx, skip);
        self.producing = false;
        result
    }

    fn _push_transaction(
        &mut self,
        tx: SignedTransaction,
        skip: SkipFlags,
    ) -> ChainResult<()> {
        // The first transaction after a block opens the pending session,
        // so a newly arriving block can rewind to clean head state fast.
        if !self.pending_session_open {
            self.ledger.begin_undo_session();
            self.pending_session_open = true;
        }

        self.ledger.begin_undo_session();
        match self.apply_transaction(&tx, skip) {
            Ok(()) => {
                self.ledger.squash_session();
                self.observers.notify_pending_transaction(&tx);
                self.pending_transactions.push(tx);
                Ok(())
            }
            Err(e) => {
                self.ledger.undo_session();
                Err(e)
            }
        }
    }

    // --- block application pipeline ---

    pub(crate) fn apply_block(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        self.validate_block(block, skip)?;
        self.validate_block_header(block, skip)?;

        self.current_block_num = block.header.number;
        self.current_trx_in_block = 0;
        self.current_virtual_op = 0;

        let producer = block.header.producer.clone();
        self.ledger
            .modify_globals(|g| g.current_witness = producer.clone())?;

        self.process_header_extensions(block)?;

        // a producer lagging behind the current consensus rules cannot be
        // trusted to have applied them
        let running = self.ledger.get_witness(&block.header.producer)?.running_version;
        let current = self.ledger.hardforks()?.current_version;
        if running < current {
            return Err(ChainError::InvalidBlock(format!(
                "producer {} runs {} but the chain is on {}",
                block.header.producer, running, current
            )));
        }

        for tx in &block.transactions {
            self.apply_transaction(tx, skip)?;
            self.current_trx_in_block += 1;
        }
        self.current_trx_in_block = -1;
        self.current_op_in_trx = 0;

        self.update_global_dynamic_data(block, skip)?;
        self.update_signing_witness(block)?;
        self.update_last_irreversible_block(skip)?;

        self.clear_expired_transactions()?;
        self.clear_expired_orders()?;
        self.clear_expired_delegations()?;

        consensus::schedule::update_producer_schedule(&mut self.ledger, &self.config.schedule)?;

        self.update_median_feed()?;
        self.update_virtual_supply()?;

        self.clear_null_account_balance()?;
        self.process_funds()?;
        self.process_conversions()?;
        self.process_comment_cashout()?;
        self.process_vesting_withdrawals()?;
        self.process_savings_withdraws()?;
        self.pay_liquidity_reward()?;
        self.update_virtual_supply()?;

        self.expire_escrow_ratifications()?;
        self.process_decline_voting_rights()?;

        self.process_hardforks()?;

        if !skip.contains(SkipFlags::VALIDATE_INVARIANTS) {
            self.validate_invariants()?;
        }

        self.observers.notify_applied_block(block);
        Ok(())
    }

    /// Structural block checks: merkle root and serialized size
    fn validate_block(&self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        if !skip.contains(SkipFlags::MERKLE_CHECK) {
            let computed = block.calculate_merkle_root();
            if computed != block.header.transaction_merkle_root {
                return Err(ChainError::InvalidBlock(format!(
                    "merkle root mismatch at block {}",
                    block.header.number
                )));
            }
        }
        if !skip.contains(SkipFlags::BLOCK_SIZE_CHECK) {
            let max = self.ledger.globals()?.maximum_block_size as usize;
            let size = block.serialized_size();
            if size > max {
                return Err(ChainError::InvalidBlock(format!(
                    "block {} is {} bytes; limit is {}",
                    block.header.number, size, max
                )));
            }
        }
        Ok(())
    }

    /// Header checks: linkage, timestamp, scheduled producer, signature
    fn validate_block_header(&self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        if self.head_block_id() != block.header.previous {
            return Err(ChainError::UnlinkedBlock(format!(
                "block {} does not link to the current head",
                block.header.number
            )));
        }
        if self.head_block_time() >= block.header.timestamp {
            return Err(ChainError::InvalidBlock(format!(
                "block {} timestamp does not advance past head",
                block.header.number
            )));
        }
        if block.header.number != self.head_block_num() + 1 {
            return Err(ChainError::InvalidBlock(format!(
                "expected block number {}, got {}",
                self.head_block_num() + 1,
                block.header.number
            )));
        }

        let witness = self.ledger.get_witness(&block.header.producer)?;

        if !skip.contains(SkipFlags::WITNESS_SIGNATURE) {
            block.validate_signee(&witness.signing_key)?;
        }

        if !skip.contains(SkipFlags::WITNESS_SCHEDULE_CHECK) {
            let slot = self.get_slot_at_time(block.header.timestamp);
            if slot == 0 {
                return Err(ChainError::InvalidBlock(
                    "block timestamp is before the next slot".into(),
                ));
            }
            let scheduled = self.get_scheduled_producer(slot)?;
            if scheduled != block.header.producer {
                return Err(ChainError::InvalidBlock(format!(
                    "producer {} signed a slot scheduled for {}",
                    block.header.producer, scheduled
                )));
            }
        }
        Ok(())
    }

    /// Fold producer version reports and hardfork votes from the header
    fn process_header_extensions(&mut self, block: &SignedBlock) -> ChainResult<()> {
        for extension in &block.header.extensions {
            match extension {
                HeaderExtension::ReportedVersion(version) => {
                    let producer = &block.header.producer;
                    if self.ledger.get_witness(producer)?.running_version != *version {
                        let version = *version;
                        self.ledger
                            .modify_witness(producer, |w| w.running_version = version)?;
                    }
                }
                HeaderExtension::HardforkVote { version, time } => {
                    let producer = &block.header.producer;
                    let witness = self.ledger.get_witness(producer)?;
                    if witness.hardfork_version_vote != *version
                        || witness.hardfork_time_vote != *time
                    {
                        let (version, time) = (*version, *time);
                        self.ledger.modify_witness(producer, |w| {
                            w.hardfork_version_vote = version;
                            w.hardfork_time_vote = time;
                        })?;
                    }
                }
            }
        }
        Ok(())
    }

    // --- transaction application pipeline ---

    pub(crate) fn apply_transaction(
        &mut self,
        tx: &SignedTransaction,
        skip: SkipFlags,
    ) -> ChainResult<()> {
        self._apply_transaction(tx, skip)?;
        self.observers.notify_applied_transaction(tx);
        Ok(())
    }

    fn _apply_transaction(&mut self, tx: &SignedTransaction, skip: SkipFlags) -> ChainResult<()> {
        let trx_id = tx.id();
        self.current_trx_id = trx_id;
        self.current_op_in_trx = 0;

        if !skip.contains(SkipFlags::TRANSACTION_DUPE_CHECK)
            && self.ledger.find_transaction_object(&trx_id).is_some()
        {
            return Err(ChainError::DuplicateTransaction(trx_id));
        }

        if !skip.contains(SkipFlags::VALIDATE_OPERATIONS) {
            tx.tx.validate()?;
        }

        let now = self.head_block_time();
        if tx.tx.expiration <= now {
            return Err(ChainError::ExpiredTransaction(tx.tx.expiration));
        }
        let horizon = now.saturating_add(self.config.max_transaction_expiration_secs);
        if tx.tx.expiration > horizon {
            return Err(ChainError::InvalidTransaction(
                "expiration is too far in the future".into(),
            ));
        }

        let mut owner = BTreeSet::new();
        let mut active = BTreeSet::new();
        let mut posting = BTreeSet::new();
        for op in &tx.tx.operations {
            op.required_authorities(&mut owner, &mut active, &mut posting);
        }

        if !skip.contains(SkipFlags::AUTHORITY_CHECK)
            && !skip.contains(SkipFlags::TRANSACTION_SIGNATURES)
        {
            self.verify_authority(tx, &owner, &active, &posting)?;
        }

        self.charge_bandwidth(tx, &owner, &active, &posting)?;

        if !skip.contains(SkipFlags::TRANSACTION_DUPE_CHECK) {
            self.ledger.create_transaction_object(
                trx_id,
                TransactionObject {
                    trx_id,
                    expiration: tx.tx.expiration,
                },
            )?;
        }

        for op in &tx.tx.operations {
            self.apply_operation(op).map_err(|e| {
                if e.is_fatal() {
                    e
                } else {
                    ChainError::InvalidTransaction(format!(
                        "operation {} failed: {}",
                        self.current_op_in_trx, e
                    ))
                }
            })?;
            self.current_op_in_trx += 1;
        }
        self.current_trx_id = TransactionId::zero();
        Ok(())
    }

    /// Run one evaluator inside its own nested checkpoint: a failing
    /// evaluator leaves no partial mutation visible even before the
    /// enclosing transaction checkpoint unwinds.
    pub(crate) fn apply_operation(&mut self, op: &Operation) -> ChainResult<()> {
        let note = OperationNotification {
            trx_id: self.current_trx_id,
            block_num: self.current_block_num,
            trx_in_block: self.current_trx_in_block,
            op_in_trx: self.current_op_in_trx,
            virtual_op: 0,
            op: OperationRef::User(op),
        };
        self.observers.notify_pre_apply_operation(&note);

        self.ledger.begin_undo_session();
        match evaluators::apply(self, op) {
            Ok(()) => self.ledger.squash_session(),
            Err(e) => {
                self.ledger.undo_session();
                return Err(e);
            }
        }

        self.observers.notify_post_apply_operation(&note);
        Ok(())
    }

    /// Emit a derived fact to observers
    pub(crate) fn push_virtual_operation(&mut self, vop: VirtualOperation) {
        self.current_virtual_op += 1;
        let note = OperationNotification {
            trx_id: self.current_trx_id,
            block_num: self.current_block_num,
            trx_in_block: self.current_trx_in_block,
            op_in_trx: self.current_op_in_trx,
            virtual_op: self.current_virtual_op,
            op: OperationRef::Virtual(&vop),
        };
        self.observers.notify_pre_apply_operation(&note);
        self.observers.notify_post_apply_operation(&note);
    }

    // --- irreversibility bookkeeping ---

    /// Commit undo frames for every block at or below the new watermark
    pub(crate) fn commit_irreversible(&mut self, new_lib: u64) {
        if new_lib + 1 <= self.oldest_frame_block {
            return;
        }
        let mut count = (new_lib + 1 - self.oldest_frame_block) as usize;
        count = count.min(self.block_frames);
        if count > 0 {
            self.ledger.commit_oldest_sessions(count);
            self.block_frames -= count;
            self.oldest_frame_block += count as u64;
        }
    }

    // --- block production ---

    /// Assemble, sign and push a block for the given slot time.
    ///
    /// Pending transactions that still apply cleanly are included. The
    /// header carries the node's version report, and a hardfork vote for
    /// the latest entry of the compiled table.
    pub fn generate_block(
        &mut self,
        when: Timestamp,
        producer: AccountName,
        signing_key: &KeyPair,
        skip: SkipFlags,
    ) -> ChainResult<SignedBlock> {
        let node_version = self.hardfork_schedule.latest_version();
        let witness = self.ledger.get_witness(&producer)?;

        let mut extensions = Vec::new();
        if witness.running_version != node_version {
            extensions.push(HeaderExtension::ReportedVersion(node_version));
        }
        let vote_version = self.hardfork_schedule.latest_version();
        let vote_time = self.hardfork_schedule.latest_time();
        if witness.hardfork_version_vote != vote_version
            || witness.hardfork_time_vote != vote_time
        {
            extensions.push(HeaderExtension::HardforkVote {
                version: vote_version,
                time: vote_time,
            });
        }

        // keep only pending transactions that apply cleanly right now
        let candidates = std::mem::take(&mut self.pending_transactions);
        self.clear_pending_session();

        let mut included = Vec::new();
        self.ledger.begin_undo_session();
        for tx in candidates {
            self.ledger.begin_undo_session();
            match self.apply_transaction(&tx, skip) {
                Ok(()) => {
                    self.ledger.squash_session();
                    included.push(tx);
                }
                Err(e) => {
                    debug!("leaving transaction out of block: {}", e);
                    self.ledger.undo_session();
                }
            }
        }
        self.ledger.undo_session();

        let block = SignedBlock::produce(
            self.head_block_id(),
            self.head_block_num() + 1,
            when,
            producer,
            included,
            extensions,
            signing_key,
        )?;

        self.push_block(&block, skip)?;
        info!(
            "produced block {} with {} transactions",
            block.header.number,
            block.transactions.len()
        );
        Ok(block)
    }
}
