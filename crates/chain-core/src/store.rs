// chain-core/src/store.rs

//! The versioned object store.
//!
//! Every mutation goes through `create_*`/`modify_*`/`remove_*` helpers that
//! journal the previous value into the active undo frame. Frames nest:
//! each transaction, each block and the whole pending-transaction set is its
//! own frame. Dropping a frame replays its journal in reverse; squashing
//! merges a child frame into its parent. Rollback cost is proportional to
//! the size of the dropped window, never to the ledger.

use crate::{
    Account, AccountBandwidth, AccountName, BandwidthType, ChainError, ChainResult, Comment,
    ContentId, ConvertRequest, DeclineVotingRightsRequest, DynamicGlobalProperties, Escrow,
    FeedHistory, HardforkProperties, LimitOrder, LiquidityRewardBalance, ProducerSchedule,
    SavingsWithdraw, TransactionId, TransactionObject, VestingDelegation,
    VestingDelegationExpiration, VoteRecord, Witness, WithdrawVestingRoute,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Object-id allocators; ids are sequential and never reused
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub next_content_id: u64,
    pub next_order_id: u64,
    pub next_expiration_id: u64,
}

/// One journal entry: the value a key held before the mutation
#[derive(Debug, Clone)]
enum Undo {
    Account(AccountName, Option<Account>),
    Comment(ContentId, Option<Comment>),
    CommentVote((ContentId, AccountName), Option<VoteRecord>),
    Witness(AccountName, Option<Witness>),
    WitnessVote((AccountName, AccountName), Option<()>),
    LimitOrder(u64, Option<LimitOrder>),
    ConvertRequest((AccountName, u32), Option<ConvertRequest>),
    Escrow((AccountName, u32), Option<Escrow>),
    SavingsWithdraw((AccountName, u32), Option<SavingsWithdraw>),
    VestingDelegation((AccountName, AccountName), Option<VestingDelegation>),
    DelegationExpiration(u64, Option<VestingDelegationExpiration>),
    WithdrawRoute((AccountName, AccountName), Option<WithdrawVestingRoute>),
    LiquidityReward(AccountName, Option<LiquidityRewardBalance>),
    DeclineRequest(AccountName, Option<DeclineVotingRightsRequest>),
    Bandwidth((AccountName, BandwidthType), Option<AccountBandwidth>),
    TransactionObject(TransactionId, Option<TransactionObject>),
    Globals(Option<DynamicGlobalProperties>),
    FeedHistory(Option<FeedHistory>),
    Schedule(Option<ProducerSchedule>),
    Hardforks(Option<HardforkProperties>),
    Counters(Counters),
}

/// Generates find/get/create/modify/remove accessors for one collection
macro_rules! collection {
    ($map:ident, $Key:ty, $Value:ty, $kind:literal, $variant:ident,
     $find:ident, $get:ident, $create:ident, $modify:ident, $remove:ident) => {
        pub fn $find(&self, key: &$Key) -> Option<&$Value> {
            self.$map.get(key)
        }

        pub fn $get(&self, key: &$Key) -> ChainResult<&$Value> {
            self.$map
                .get(key)
                .ok_or_else(|| ChainError::missing($kind, format!("{:?}", key)))
        }

        pub fn $create(&mut self, key: $Key, value: $Value) -> ChainResult<()> {
            if self.$map.contains_key(&key) {
                return Err(ChainError::duplicate($kind, format!("{:?}", key)));
            }
            self.record(Undo::$variant(key.clone(), None));
            self.$map.insert(key, value);
            Ok(())
        }

        pub fn $modify<F: FnOnce(&mut $Value)>(&mut self, key: &$Key, f: F) -> ChainResult<()> {
            let old = self
                .$map
                .get(key)
                .cloned()
                .ok_or_else(|| ChainError::missing($kind, format!("{:?}", key)))?;
            self.record(Undo::$variant(key.clone(), Some(old)));
            f(self.$map.get_mut(key).expect("checked above"));
            Ok(())
        }

        pub fn $remove(&mut self, key: &$Key) -> ChainResult<()> {
            let old = self
                .$map
                .remove(key)
                .ok_or_else(|| ChainError::missing($kind, format!("{:?}", key)))?;
            self.record(Undo::$variant(key.clone(), Some(old)));
            Ok(())
        }
    };
}

/// Generates get/modify/initialize accessors for one singleton slot
macro_rules! singleton {
    ($field:ident, $Value:ty, $name:literal, $variant:ident,
     $get:ident, $modify:ident, $init:ident, $exists:ident) => {
        pub fn $get(&self) -> ChainResult<&$Value> {
            self.$field
                .as_ref()
                .ok_or(ChainError::MissingSingleton($name))
        }

        pub fn $exists(&self) -> bool {
            self.$field.is_some()
        }

        pub fn $modify<F: FnOnce(&mut $Value)>(&mut self, f: F) -> ChainResult<()> {
            if self.$field.is_none() {
                return Err(ChainError::MissingSingleton($name));
            }
            self.record(Undo::$variant(self.$field.clone()));
            f(self.$field.as_mut().expect("checked above"));
            Ok(())
        }

        pub fn $init(&mut self, value: $Value) -> ChainResult<()> {
            if self.$field.is_some() {
                return Err(ChainError::Consistency(concat!(
                    $name,
                    " singleton initialized twice"
                )
                .into()));
            }
            self.record(Undo::$variant(None));
            self.$field = Some(value);
            Ok(())
        }
    };
}

/// The in-memory versioned ledger
#[derive(Default)]
pub struct Ledger {
    accounts: BTreeMap<AccountName, Account>,
    comments: BTreeMap<ContentId, Comment>,
    comment_by_permlink: BTreeMap<(AccountName, String), ContentId>,
    comment_votes: BTreeMap<(ContentId, AccountName), VoteRecord>,
    witnesses: BTreeMap<AccountName, Witness>,
    witness_votes: BTreeMap<(AccountName, AccountName), ()>,
    limit_orders: BTreeMap<u64, LimitOrder>,
    convert_requests: BTreeMap<(AccountName, u32), ConvertRequest>,
    escrows: BTreeMap<(AccountName, u32), Escrow>,
    savings_withdraws: BTreeMap<(AccountName, u32), SavingsWithdraw>,
    vesting_delegations: BTreeMap<(AccountName, AccountName), VestingDelegation>,
    delegation_expirations: BTreeMap<u64, VestingDelegationExpiration>,
    withdraw_routes: BTreeMap<(AccountName, AccountName), WithdrawVestingRoute>,
    liquidity_rewards: BTreeMap<AccountName, LiquidityRewardBalance>,
    decline_requests: BTreeMap<AccountName, DeclineVotingRightsRequest>,
    bandwidth: BTreeMap<(AccountName, BandwidthType), AccountBandwidth>,
    transaction_objects: BTreeMap<TransactionId, TransactionObject>,

    globals: Option<DynamicGlobalProperties>,
    feed_history: Option<FeedHistory>,
    schedule: Option<ProducerSchedule>,
    hardforks: Option<HardforkProperties>,
    counters: Counters,

    frames: VecDeque<Vec<Undo>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // --- undo sessions ---

    /// Open a nested checkpoint; mutations from here on are journaled
    pub fn begin_undo_session(&mut self) {
        self.frames.push_back(Vec::new());
    }

    /// Number of open checkpoints
    pub fn session_count(&self) -> usize {
        self.frames.len()
    }

    /// Revert everything since the innermost checkpoint and close it
    pub fn undo_session(&mut self) {
        if let Some(frame) = self.frames.pop_back() {
            for entry in frame.into_iter().rev() {
                self.revert(entry);
            }
        }
    }

    /// Merge the innermost checkpoint into its parent. With no parent the
    /// journal is discarded, making the mutations permanent.
    pub fn squash_session(&mut self) {
        if let Some(frame) = self.frames.pop_back() {
            if let Some(parent) = self.frames.back_mut() {
                parent.extend(frame);
            }
        }
    }

    /// Make the oldest `n` checkpoints permanent (irreversibility)
    pub fn commit_oldest_sessions(&mut self, n: usize) {
        for _ in 0..n {
            if self.frames.pop_front().is_none() {
                break;
            }
        }
    }

    fn record(&mut self, entry: Undo) {
        if let Some(frame) = self.frames.back_mut() {
            frame.push(entry);
        }
    }

    fn revert(&mut self, entry: Undo) {
        fn put<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, old: Option<V>) {
            match old {
                Some(v) => {
                    map.insert(key, v);
                }
                None => {
                    map.remove(&key);
                }
            }
        }

        match entry {
            Undo::Account(k, old) => put(&mut self.accounts, k, old),
            Undo::Comment(k, old) => {
                // keep the permlink index in lockstep
                if let Some(current) = self.comments.get(&k) {
                    if old.is_none() {
                        self.comment_by_permlink
                            .remove(&(current.author.clone(), current.permlink.clone()));
                    }
                } else if let Some(ref restored) = old {
                    self.comment_by_permlink
                        .insert((restored.author.clone(), restored.permlink.clone()), k);
                }
                put(&mut self.comments, k, old);
            }
            Undo::CommentVote(k, old) => put(&mut self.comment_votes, k, old),
            Undo::Witness(k, old) => put(&mut self.witnesses, k, old),
            Undo::WitnessVote(k, old) => put(&mut self.witness_votes, k, old),
            Undo::LimitOrder(k, old) => put(&mut self.limit_orders, k, old),
            Undo::ConvertRequest(k, old) => put(&mut self.convert_requests, k, old),
            Undo::Escrow(k, old) => put(&mut self.escrows, k, old),
            Undo::SavingsWithdraw(k, old) => put(&mut self.savings_withdraws, k, old),
            Undo::VestingDelegation(k, old) => put(&mut self.vesting_delegations, k, old),
            Undo::DelegationExpiration(k, old) => put(&mut self.delegation_expirations, k, old),
            Undo::WithdrawRoute(k, old) => put(&mut self.withdraw_routes, k, old),
            Undo::LiquidityReward(k, old) => put(&mut self.liquidity_rewards, k, old),
            Undo::DeclineRequest(k, old) => put(&mut self.decline_requests, k, old),
            Undo::Bandwidth(k, old) => put(&mut self.bandwidth, k, old),
            Undo::TransactionObject(k, old) => put(&mut self.transaction_objects, k, old),
            Undo::Globals(old) => self.globals = old,
            Undo::FeedHistory(old) => self.feed_history = old,
            Undo::Schedule(old) => self.schedule = old,
            Undo::Hardforks(old) => self.hardforks = old,
            Undo::Counters(old) => self.counters = old,
        }
    }

    // --- id allocation ---

    pub fn allocate_content_id(&mut self) -> ContentId {
        self.record(Undo::Counters(self.counters.clone()));
        let id = self.counters.next_content_id;
        self.counters.next_content_id += 1;
        id
    }

    pub fn allocate_order_id(&mut self) -> u64 {
        self.record(Undo::Counters(self.counters.clone()));
        let id = self.counters.next_order_id;
        self.counters.next_order_id += 1;
        id
    }

    pub fn allocate_expiration_id(&mut self) -> u64 {
        self.record(Undo::Counters(self.counters.clone()));
        let id = self.counters.next_expiration_id;
        self.counters.next_expiration_id += 1;
        id
    }

    // --- collections ---

    collection!(accounts, AccountName, Account, "account", Account,
        find_account, get_account, create_account, modify_account, remove_account);
    collection!(comment_votes, (ContentId, AccountName), VoteRecord, "vote", CommentVote,
        find_comment_vote, get_comment_vote, create_comment_vote, modify_comment_vote, remove_comment_vote);
    collection!(witnesses, AccountName, Witness, "witness", Witness,
        find_witness, get_witness, create_witness, modify_witness, remove_witness);
    collection!(witness_votes, (AccountName, AccountName), (), "witness vote", WitnessVote,
        find_witness_vote, get_witness_vote, create_witness_vote, modify_witness_vote, remove_witness_vote);
    collection!(limit_orders, u64, LimitOrder, "limit order", LimitOrder,
        find_limit_order, get_limit_order, create_limit_order, modify_limit_order, remove_limit_order);
    collection!(convert_requests, (AccountName, u32), ConvertRequest, "conversion request", ConvertRequest,
        find_convert_request, get_convert_request, create_convert_request, modify_convert_request, remove_convert_request);
    collection!(escrows, (AccountName, u32), Escrow, "escrow", Escrow,
        find_escrow, get_escrow, create_escrow, modify_escrow, remove_escrow);
    collection!(savings_withdraws, (AccountName, u32), SavingsWithdraw, "savings withdrawal", SavingsWithdraw,
        find_savings_withdraw, get_savings_withdraw, create_savings_withdraw, modify_savings_withdraw, remove_savings_withdraw);
    collection!(vesting_delegations, (AccountName, AccountName), VestingDelegation, "delegation", VestingDelegation,
        find_vesting_delegation, get_vesting_delegation, create_vesting_delegation, modify_vesting_delegation, remove_vesting_delegation);
    collection!(delegation_expirations, u64, VestingDelegationExpiration, "delegation expiration", DelegationExpiration,
        find_delegation_expiration, get_delegation_expiration, create_delegation_expiration, modify_delegation_expiration, remove_delegation_expiration);
    collection!(withdraw_routes, (AccountName, AccountName), WithdrawVestingRoute, "withdraw route", WithdrawRoute,
        find_withdraw_route, get_withdraw_route, create_withdraw_route, modify_withdraw_route, remove_withdraw_route);
    collection!(liquidity_rewards, AccountName, LiquidityRewardBalance, "liquidity reward balance", LiquidityReward,
        find_liquidity_reward, get_liquidity_reward, create_liquidity_reward, modify_liquidity_reward, remove_liquidity_reward);
    collection!(decline_requests, AccountName, DeclineVotingRightsRequest, "decline request", DeclineRequest,
        find_decline_request, get_decline_request, create_decline_request, modify_decline_request, remove_decline_request);
    collection!(bandwidth, (AccountName, BandwidthType), AccountBandwidth, "bandwidth record", Bandwidth,
        find_bandwidth, get_bandwidth, create_bandwidth, modify_bandwidth, remove_bandwidth);
    collection!(transaction_objects, TransactionId, TransactionObject, "transaction", TransactionObject,
        find_transaction_object, get_transaction_object, create_transaction_object, modify_transaction_object, remove_transaction_object);

    // Content carries a secondary (author, permlink) index, so its
    // accessors are written out by hand.

    pub fn find_comment(&self, id: &ContentId) -> Option<&Comment> {
        self.comments.get(id)
    }

    pub fn get_comment(&self, id: &ContentId) -> ChainResult<&Comment> {
        self.comments
            .get(id)
            .ok_or_else(|| ChainError::missing("content", id))
    }

    pub fn find_comment_by_permlink(
        &self,
        author: &AccountName,
        permlink: &str,
    ) -> Option<&Comment> {
        self.comment_by_permlink
            .get(&(author.clone(), permlink.to_string()))
            .and_then(|id| self.comments.get(id))
    }

    pub fn get_comment_by_permlink(
        &self,
        author: &AccountName,
        permlink: &str,
    ) -> ChainResult<&Comment> {
        self.find_comment_by_permlink(author, permlink)
            .ok_or_else(|| ChainError::missing("content", format!("{}/{}", author, permlink)))
    }

    pub fn create_comment(&mut self, comment: Comment) -> ChainResult<()> {
        let id = comment.id;
        let index_key = (comment.author.clone(), comment.permlink.clone());
        if self.comments.contains_key(&id) || self.comment_by_permlink.contains_key(&index_key) {
            return Err(ChainError::duplicate(
                "content",
                format!("{}/{}", comment.author, comment.permlink),
            ));
        }
        self.record(Undo::Comment(id, None));
        self.comment_by_permlink.insert(index_key, id);
        self.comments.insert(id, comment);
        Ok(())
    }

    pub fn modify_comment<F: FnOnce(&mut Comment)>(
        &mut self,
        id: &ContentId,
        f: F,
    ) -> ChainResult<()> {
        let old = self
            .comments
            .get(id)
            .cloned()
            .ok_or_else(|| ChainError::missing("content", id))?;
        self.record(Undo::Comment(*id, Some(old)));
        f(self.comments.get_mut(id).expect("checked above"));
        Ok(())
    }

    pub fn remove_comment(&mut self, id: &ContentId) -> ChainResult<()> {
        let old = self
            .comments
            .remove(id)
            .ok_or_else(|| ChainError::missing("content", id))?;
        self.comment_by_permlink
            .remove(&(old.author.clone(), old.permlink.clone()));
        self.record(Undo::Comment(*id, Some(old)));
        Ok(())
    }

    // --- singletons ---

    singleton!(globals, DynamicGlobalProperties, "dynamic global properties", Globals,
        globals, modify_globals, init_globals, globals_initialized);
    singleton!(feed_history, FeedHistory, "feed history", FeedHistory,
        feed_history, modify_feed_history, init_feed_history, feed_history_initialized);
    singleton!(schedule, ProducerSchedule, "producer schedule", Schedule,
        schedule, modify_schedule, init_schedule, schedule_initialized);
    singleton!(hardforks, HardforkProperties, "hardfork properties", Hardforks,
        hardforks, modify_hardforks, init_hardforks, hardforks_initialized);

    // --- ordered scans ---

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values()
    }

    pub fn comment_votes(&self) -> impl Iterator<Item = &VoteRecord> {
        self.comment_votes.values()
    }

    /// Votes on one content item, ordered by voter name
    pub fn comment_votes_for(&self, id: ContentId) -> impl Iterator<Item = &VoteRecord> {
        self.comment_votes
            .range((id, AccountName::default())..)
            .take_while(move |((c, _), _)| *c == id)
            .map(|(_, v)| v)
    }

    pub fn witnesses(&self) -> impl Iterator<Item = &Witness> {
        self.witnesses.values()
    }

    /// Witnesses the account currently approves, ordered by witness name
    pub fn witness_votes_by(&self, account: &AccountName) -> Vec<AccountName> {
        self.witness_votes
            .range((account.clone(), AccountName::default())..)
            .take_while(|((a, _), _)| a == account)
            .map(|((_, w), _)| w.clone())
            .collect()
    }

    pub fn limit_orders(&self) -> impl Iterator<Item = &LimitOrder> {
        self.limit_orders.values()
    }

    pub fn convert_requests(&self) -> impl Iterator<Item = &ConvertRequest> {
        self.convert_requests.values()
    }

    pub fn escrows(&self) -> impl Iterator<Item = &Escrow> {
        self.escrows.values()
    }

    pub fn savings_withdraws(&self) -> impl Iterator<Item = &SavingsWithdraw> {
        self.savings_withdraws.values()
    }

    pub fn vesting_delegations(&self) -> impl Iterator<Item = &VestingDelegation> {
        self.vesting_delegations.values()
    }

    pub fn delegation_expirations(&self) -> impl Iterator<Item = &VestingDelegationExpiration> {
        self.delegation_expirations.values()
    }

    /// Withdraw routes leaving one account, ordered by destination
    pub fn withdraw_routes_from(&self, account: &AccountName) -> Vec<WithdrawVestingRoute> {
        self.withdraw_routes
            .range((account.clone(), AccountName::default())..)
            .take_while(|((a, _), _)| a == account)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn liquidity_rewards(&self) -> impl Iterator<Item = &LiquidityRewardBalance> {
        self.liquidity_rewards.values()
    }

    pub fn decline_requests(&self) -> impl Iterator<Item = &DeclineVotingRightsRequest> {
        self.decline_requests.values()
    }

    pub fn transaction_objects(&self) -> impl Iterator<Item = &TransactionObject> {
        self.transaction_objects.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Asset, Authority, Timestamp};

    fn account(name: &str) -> Account {
        Account::new(
            AccountName::from(name),
            Authority::impossible(),
            Timestamp::ZERO,
        )
    }

    fn comment_fixture(id: ContentId, author: &str, permlink: &str) -> Comment {
        Comment {
            id,
            author: AccountName::from(author),
            permlink: permlink.into(),
            parent: None,
            root: id,
            depth: 0,
            children: 0,
            created: Timestamp::ZERO,
            last_update: Timestamp::ZERO,
            last_payout: Timestamp::ZERO,
            cashout_time: Timestamp::MAX,
            max_cashout_time: Timestamp::MAX,
            mode: crate::PayoutMode::FirstWindow,
            net_rshares: 0,
            abs_rshares: 0,
            vote_rshares: 0,
            net_votes: 0,
            total_vote_weight: 0,
            auction_window_weight: 0,
            votes_after_auction_window_weight: 0,
            reward_weight: crate::PERCENT_100,
            reward_curve: crate::RewardCurve::Linear,
            curation_percent: 2500,
            auction_window_size: 1800,
            auction_window_destination: crate::AuctionWindowDestination::RewardFund,
            max_accepted_payout: Asset::agd(1_000_000_000),
            percent_debt: crate::PERCENT_100,
            allow_replies: true,
            allow_votes: true,
            allow_curation_rewards: true,
            beneficiaries: Vec::new(),
        }
    }

    #[test]
    fn test_create_get_modify_remove() {
        let mut ledger = Ledger::new();
        let name = AccountName::from("alice");

        ledger.create_account(name.clone(), account("alice")).unwrap();
        assert!(ledger.get_account(&name).is_ok());
        assert!(ledger.create_account(name.clone(), account("alice")).is_err());

        ledger
            .modify_account(&name, |a| a.balance = Asset::agr(500))
            .unwrap();
        assert_eq!(ledger.get_account(&name).unwrap().balance, Asset::agr(500));

        ledger.remove_account(&name).unwrap();
        assert!(ledger.find_account(&name).is_none());
    }

    #[test]
    fn test_undo_restores_previous_values() {
        let mut ledger = Ledger::new();
        let name = AccountName::from("alice");
        ledger.create_account(name.clone(), account("alice")).unwrap();

        ledger.begin_undo_session();
        ledger
            .modify_account(&name, |a| a.balance = Asset::agr(999))
            .unwrap();
        ledger
            .create_account(AccountName::from("bob"), account("bob"))
            .unwrap();
        ledger.undo_session();

        assert_eq!(ledger.get_account(&name).unwrap().balance, Asset::agr(0));
        assert!(ledger.find_account(&AccountName::from("bob")).is_none());
    }

    #[test]
    fn test_nested_sessions_squash_then_undo() {
        let mut ledger = Ledger::new();
        let name = AccountName::from("alice");
        ledger.create_account(name.clone(), account("alice")).unwrap();

        ledger.begin_undo_session(); // outer
        ledger
            .modify_account(&name, |a| a.balance = Asset::agr(100))
            .unwrap();

        ledger.begin_undo_session(); // inner
        ledger
            .modify_account(&name, |a| a.balance = Asset::agr(200))
            .unwrap();
        ledger.squash_session(); // inner merges into outer

        ledger.undo_session(); // outer reverts everything
        assert_eq!(ledger.get_account(&name).unwrap().balance, Asset::agr(0));
    }

    #[test]
    fn test_undo_restores_remove() {
        let mut ledger = Ledger::new();
        let name = AccountName::from("alice");
        ledger.create_account(name.clone(), account("alice")).unwrap();

        ledger.begin_undo_session();
        ledger.remove_account(&name).unwrap();
        assert!(ledger.find_account(&name).is_none());
        ledger.undo_session();

        assert!(ledger.find_account(&name).is_some());
    }

    #[test]
    fn test_commit_makes_oldest_permanent() {
        let mut ledger = Ledger::new();
        let name = AccountName::from("alice");

        ledger.begin_undo_session();
        ledger.create_account(name.clone(), account("alice")).unwrap();
        ledger.begin_undo_session();
        ledger
            .modify_account(&name, |a| a.balance = Asset::agr(50))
            .unwrap();

        ledger.commit_oldest_sessions(1);
        assert_eq!(ledger.session_count(), 1);

        // the remaining session still unwinds to the committed state
        ledger.undo_session();
        assert_eq!(ledger.get_account(&name).unwrap().balance, Asset::agr(0));
    }

    #[test]
    fn test_comment_permlink_index_follows_undo() {
        let mut ledger = Ledger::new();
        let author = AccountName::from("alice");

        ledger.begin_undo_session();
        let id = ledger.allocate_content_id();
        ledger.create_comment(comment_fixture(id, "alice", "hello")).unwrap();
        assert!(ledger.find_comment_by_permlink(&author, "hello").is_some());

        ledger.undo_session();
        assert!(ledger.find_comment_by_permlink(&author, "hello").is_none());

        // the id allocator also rewound
        assert_eq!(ledger.allocate_content_id(), id);
    }

    #[test]
    fn test_singleton_lifecycle() {
        let mut ledger = Ledger::new();
        assert!(ledger.globals().is_err());

        ledger
            .init_globals(DynamicGlobalProperties::default())
            .unwrap();
        assert!(ledger.init_globals(DynamicGlobalProperties::default()).is_err());

        ledger.begin_undo_session();
        ledger
            .modify_globals(|g| g.head_block_number = 42)
            .unwrap();
        ledger.undo_session();

        assert_eq!(ledger.globals().unwrap().head_block_number, 0);
    }

    proptest::proptest! {
        /// Rollback restores the pre-checkpoint state for any sequence of
        /// balance mutations, creations and removals.
        #[test]
        fn prop_undo_is_exact_inverse(
            steps in proptest::collection::vec((0u8..3, 0i64..1_000_000), 1..40)
        ) {
            let mut ledger = Ledger::new();
            let alice = AccountName::from("alice");
            ledger.create_account(alice.clone(), account("alice")).unwrap();

            let before = ledger.find_account(&alice).cloned();
            ledger.begin_undo_session();

            for (kind, amount) in steps {
                match kind {
                    0 => {
                        if ledger.find_account(&alice).is_some() {
                            ledger
                                .modify_account(&alice, |a| a.balance = Asset::agr(amount))
                                .unwrap();
                        }
                    }
                    1 => {
                        if ledger.find_account(&alice).is_some() {
                            ledger.remove_account(&alice).unwrap();
                        }
                    }
                    _ => {
                        if ledger.find_account(&alice).is_none() {
                            ledger.create_account(alice.clone(), account("alice")).unwrap();
                        }
                    }
                }
            }

            ledger.undo_session();
            proptest::prop_assert_eq!(ledger.find_account(&alice).cloned(), before);
        }
    }

    #[test]
    fn test_prefix_scans() {
        let mut ledger = Ledger::new();
        let alice = AccountName::from("alice");
        let bob = AccountName::from("bob");

        ledger
            .create_witness_vote((alice.clone(), AccountName::from("w1")), ())
            .unwrap();
        ledger
            .create_witness_vote((alice.clone(), AccountName::from("w2")), ())
            .unwrap();
        ledger
            .create_witness_vote((bob.clone(), AccountName::from("w3")), ())
            .unwrap();

        let alice_votes = ledger.witness_votes_by(&alice);
        assert_eq!(alice_votes.len(), 2);
        assert_eq!(ledger.witness_votes_by(&bob).len(), 1);
    }
}
