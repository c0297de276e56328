// chain-core/src/operations.rs

use crate::{
    AccountName, Asset, AuctionWindowDestination, Authority, BeneficiaryRoute, ChainError,
    ChainProperties, ChainResult, Percent, Price, Symbol, Timestamp, PERCENT_100,
};
use chain_crypto::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Upper bound on memo and permlink strings
pub const MAX_MEMO_SIZE: usize = 2048;
pub const MAX_PERMLINK_LENGTH: usize = 256;
pub const MAX_CUSTOM_ID_LENGTH: usize = 32;

/// Create a new account, funding its stake from the creator's fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCreateOperation {
    pub fee: Asset,
    pub creator: AccountName,
    pub new_account_name: AccountName,
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
}

/// Replace one or more of an account's authorities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdateOperation {
    pub account: AccountName,
    pub owner: Option<Authority>,
    pub active: Option<Authority>,
    pub posting: Option<Authority>,
}

/// Move liquid asset between accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub amount: Asset,
    pub memo: String,
}

/// Convert liquid core asset into stake for `to` (self when `None`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferToVestingOperation {
    pub from: AccountName,
    pub to: Option<AccountName>,
    pub amount: Asset,
}

/// Begin (or reset) the time-decaying withdrawal of stake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawVestingOperation {
    pub account: AccountName,
    pub vesting_shares: Asset,
}

/// Route a fraction of future stake withdrawals to another account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetWithdrawVestingRouteOperation {
    pub from_account: AccountName,
    pub to_account: AccountName,
    pub percent: Percent,
    pub auto_vest: bool,
}

/// Request conversion of debt asset to core asset at the future median
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertOperation {
    pub owner: AccountName,
    pub requestid: u32,
    pub amount: Asset,
}

/// Place an order on the internal market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderCreateOperation {
    pub owner: AccountName,
    pub orderid: u32,
    pub amount_to_sell: Asset,
    pub min_to_receive: Asset,
    pub fill_or_kill: bool,
    pub expiration: Timestamp,
}

impl LimitOrderCreateOperation {
    /// Implied limit price: sell side over receive side
    pub fn sell_price(&self) -> ChainResult<Price> {
        Price::new(self.amount_to_sell, self.min_to_receive)
    }
}

/// Cancel an open order, refunding the remainder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderCancelOperation {
    pub owner: AccountName,
    pub orderid: u32,
}

/// Publish a producer's debt-asset price feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPublishOperation {
    pub publisher: AccountName,
    pub exchange_rate: Price,
}

/// Declare (or update) a block-producer candidacy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessUpdateOperation {
    pub owner: AccountName,
    pub url: String,
    pub block_signing_key: PublicKey,
    pub props: ChainProperties,
    pub fee: Asset,
}

/// Approve or withdraw approval of a producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountWitnessVoteOperation {
    pub account: AccountName,
    pub witness: AccountName,
    pub approve: bool,
}

/// Delegate producer voting to another account (`None` clears the proxy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountWitnessProxyOperation {
    pub account: AccountName,
    pub proxy: Option<AccountName>,
}

/// Create or edit a post (no parent) or reply (parent set)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOperation {
    pub parent_author: Option<AccountName>,
    pub parent_permlink: String,
    pub author: AccountName,
    pub permlink: String,
    pub title: String,
    pub body: String,
    pub json_metadata: String,
}

/// Adjust payout parameters of existing content; only restrictions are
/// allowed once votes exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentOptionsOperation {
    pub author: AccountName,
    pub permlink: String,
    pub max_accepted_payout: Asset,
    pub percent_debt: Percent,
    pub allow_votes: bool,
    pub allow_curation_rewards: bool,
    pub curation_percent: Option<Percent>,
    pub auction_window_destination: Option<AuctionWindowDestination>,
    pub beneficiaries: Vec<BeneficiaryRoute>,
}

/// Remove content that has no replies and no positive reward shares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteContentOperation {
    pub author: AccountName,
    pub permlink: String,
}

/// Cast, change or remove (weight 0) a content vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteOperation {
    pub voter: AccountName,
    pub author: AccountName,
    pub permlink: String,
    /// Basis points, negative for a downvote
    pub weight: i16,
}

/// Opaque application payload relayed to observers; consensus only charges
/// bandwidth and checks the authority lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomJsonOperation {
    pub required_auths: Vec<AccountName>,
    pub required_posting_auths: Vec<AccountName>,
    pub id: String,
    pub json: String,
}

/// Move liquid funds into savings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferToSavingsOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub amount: Asset,
    pub memo: String,
}

/// Begin the delayed withdrawal of savings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFromSavingsOperation {
    pub from: AccountName,
    pub request_id: u32,
    pub to: AccountName,
    pub amount: Asset,
    pub memo: String,
}

/// Cancel a pending savings withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelTransferFromSavingsOperation {
    pub from: AccountName,
    pub request_id: u32,
}

/// Lend stake to another account (zero shares removes the delegation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegateVestingSharesOperation {
    pub delegator: AccountName,
    pub delegatee: AccountName,
    pub vesting_shares: Asset,
}

/// Park funds with an agent pending approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowTransferOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub escrow_id: u32,
    pub debt_amount: Asset,
    pub coin_amount: Asset,
    pub fee: Asset,
    pub ratification_deadline: Timestamp,
    pub escrow_expiration: Timestamp,
}

/// Recipient/agent ratification of an escrow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowApproveOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub who: AccountName,
    pub escrow_id: u32,
    pub approve: bool,
}

/// Raise a dispute, freezing release to the agent's discretion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowDisputeOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub who: AccountName,
    pub escrow_id: u32,
}

/// Release escrowed funds to one of the parties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowReleaseOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub agent: AccountName,
    pub who: AccountName,
    pub receiver: AccountName,
    pub escrow_id: u32,
    pub debt_amount: Asset,
    pub coin_amount: Asset,
}

/// Schedule the irreversible surrender of governance votes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclineVotingRightsOperation {
    pub account: AccountName,
    pub decline: bool,
}

/// Every operation a transaction may carry.
///
/// Dispatch to evaluators is an exhaustive `match`; adding a variant
/// without wiring its evaluator is a compile error, not a runtime default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    AccountCreate(AccountCreateOperation),
    AccountUpdate(AccountUpdateOperation),
    Transfer(TransferOperation),
    TransferToVesting(TransferToVestingOperation),
    WithdrawVesting(WithdrawVestingOperation),
    SetWithdrawVestingRoute(SetWithdrawVestingRouteOperation),
    Convert(ConvertOperation),
    LimitOrderCreate(LimitOrderCreateOperation),
    LimitOrderCancel(LimitOrderCancelOperation),
    FeedPublish(FeedPublishOperation),
    WitnessUpdate(WitnessUpdateOperation),
    AccountWitnessVote(AccountWitnessVoteOperation),
    AccountWitnessProxy(AccountWitnessProxyOperation),
    Post(PostOperation),
    CommentOptions(CommentOptionsOperation),
    DeleteContent(DeleteContentOperation),
    Vote(VoteOperation),
    CustomJson(CustomJsonOperation),
    TransferToSavings(TransferToSavingsOperation),
    TransferFromSavings(TransferFromSavingsOperation),
    CancelTransferFromSavings(CancelTransferFromSavingsOperation),
    DelegateVestingShares(DelegateVestingSharesOperation),
    EscrowTransfer(EscrowTransferOperation),
    EscrowApprove(EscrowApproveOperation),
    EscrowDispute(EscrowDisputeOperation),
    EscrowRelease(EscrowReleaseOperation),
    DeclineVotingRights(DeclineVotingRightsOperation),
}

fn check(cond: bool, msg: &str) -> ChainResult<()> {
    if cond {
        Ok(())
    } else {
        Err(ChainError::InvalidOperation(msg.to_string()))
    }
}

fn check_memo(memo: &str) -> ChainResult<()> {
    check(memo.len() <= MAX_MEMO_SIZE, "memo is too long")
}

fn check_permlink(permlink: &str) -> ChainResult<()> {
    check(
        !permlink.is_empty() && permlink.len() <= MAX_PERMLINK_LENGTH,
        "permlink must be 1..=256 bytes",
    )?;
    check(
        permlink
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'),
        "permlink may only contain lowercase letters, digits and dashes",
    )
}

fn check_liquid(amount: &Asset, what: &str) -> ChainResult<()> {
    check(
        matches!(amount.symbol, Symbol::Agr | Symbol::Agd),
        &format!("{} must be a liquid asset", what),
    )?;
    check(amount.amount > 0, &format!("{} must be positive", what))
}

impl Operation {
    /// Static well-formedness, checked before signatures are even looked at
    pub fn validate(&self) -> ChainResult<()> {
        use Operation::*;
        match self {
            AccountCreate(op) => {
                check(op.new_account_name.is_valid(), "invalid account name")?;
                check(
                    op.fee.symbol == Symbol::Agr && op.fee.amount >= 0,
                    "fee must be a non-negative core-asset amount",
                )?;
                check(
                    op.owner.validate() && op.active.validate() && op.posting.validate(),
                    "authority thresholds must be positive",
                )
            }
            AccountUpdate(op) => {
                check(
                    op.owner.is_some() || op.active.is_some() || op.posting.is_some(),
                    "nothing to update",
                )?;
                for auth in [&op.owner, &op.active, &op.posting].into_iter().flatten() {
                    check(auth.validate(), "authority thresholds must be positive")?;
                }
                Ok(())
            }
            Transfer(op) => {
                check(op.from != op.to, "cannot transfer to self")?;
                check_liquid(&op.amount, "transfer amount")?;
                check_memo(&op.memo)
            }
            TransferToVesting(op) => check(
                op.amount.symbol == Symbol::Agr && op.amount.amount > 0,
                "vesting transfers must carry a positive core-asset amount",
            ),
            WithdrawVesting(op) => check(
                op.vesting_shares.symbol == Symbol::Vests && op.vesting_shares.amount >= 0,
                "withdrawal must name a non-negative stake amount",
            ),
            SetWithdrawVestingRoute(op) => {
                check(op.from_account != op.to_account, "cannot route to self")?;
                check(op.percent <= PERCENT_100, "route percent above 100%")
            }
            Convert(op) => check(
                op.amount.symbol == Symbol::Agd && op.amount.amount > 0,
                "only the debt asset converts",
            ),
            LimitOrderCreate(op) => {
                check_liquid(&op.amount_to_sell, "sell amount")?;
                check_liquid(&op.min_to_receive, "receive amount")?;
                check(
                    op.amount_to_sell.symbol != op.min_to_receive.symbol,
                    "order must trade across the market pair",
                )
            }
            LimitOrderCancel(_) => Ok(()),
            FeedPublish(op) => check(
                op.exchange_rate.base.symbol == Symbol::Agd
                    && op.exchange_rate.quote.symbol == Symbol::Agr,
                "feed must quote debt in core asset",
            ),
            WitnessUpdate(op) => {
                check(op.url.len() <= MAX_MEMO_SIZE, "url is too long")?;
                check(
                    op.fee.symbol == Symbol::Agr && op.fee.amount >= 0,
                    "fee must be a non-negative core-asset amount",
                )?;
                check(
                    op.props.maximum_block_size >= 1024,
                    "maximum block size below the floor",
                )
            }
            AccountWitnessVote(_) => Ok(()),
            AccountWitnessProxy(op) => check(
                op.proxy.as_ref() != Some(&op.account),
                "cannot proxy to self",
            ),
            Post(op) => {
                check_permlink(&op.permlink)?;
                if op.parent_author.is_some() {
                    check_permlink(&op.parent_permlink)?;
                }
                check(!op.body.is_empty(), "body is empty")?;
                check(op.title.len() <= 256, "title is too long")
            }
            CommentOptions(op) => {
                check_permlink(&op.permlink)?;
                check(
                    op.max_accepted_payout.symbol == Symbol::Agd
                        && op.max_accepted_payout.amount >= 0,
                    "payout cap must be a non-negative debt-asset amount",
                )?;
                check(op.percent_debt <= PERCENT_100, "debt percent above 100%")?;
                if let Some(p) = op.curation_percent {
                    check(p <= PERCENT_100, "curation percent above 100%")?;
                }
                let mut sum = 0u32;
                let mut last: Option<&AccountName> = None;
                for b in &op.beneficiaries {
                    check(b.weight <= PERCENT_100, "beneficiary weight above 100%")?;
                    if let Some(prev) = last {
                        check(
                            prev < &b.account,
                            "beneficiaries must be sorted and unique",
                        )?;
                    }
                    last = Some(&b.account);
                    sum += b.weight as u32;
                }
                check(
                    sum <= PERCENT_100 as u32,
                    "beneficiary weights exceed 100%",
                )
            }
            DeleteContent(op) => check_permlink(&op.permlink),
            Vote(op) => {
                check_permlink(&op.permlink)?;
                check(
                    op.weight >= -(PERCENT_100 as i16) && op.weight <= PERCENT_100 as i16,
                    "vote weight outside [-100%, 100%]",
                )
            }
            CustomJson(op) => {
                check(
                    !op.required_auths.is_empty() || !op.required_posting_auths.is_empty(),
                    "custom operation names no authority",
                )?;
                check(op.id.len() <= MAX_CUSTOM_ID_LENGTH, "custom id is too long")?;
                check(
                    serde_json::from_str::<serde_json::Value>(&op.json).is_ok(),
                    "custom payload is not valid JSON",
                )
            }
            TransferToSavings(op) => {
                check_liquid(&op.amount, "savings deposit")?;
                check_memo(&op.memo)
            }
            TransferFromSavings(op) => {
                check_liquid(&op.amount, "savings withdrawal")?;
                check_memo(&op.memo)
            }
            CancelTransferFromSavings(_) => Ok(()),
            DelegateVestingShares(op) => {
                check(op.delegator != op.delegatee, "cannot delegate to self")?;
                check(
                    op.vesting_shares.symbol == Symbol::Vests && op.vesting_shares.amount >= 0,
                    "delegation must be a non-negative stake amount",
                )
            }
            EscrowTransfer(op) => {
                check(
                    op.debt_amount.symbol == Symbol::Agd && op.debt_amount.amount >= 0,
                    "escrow debt leg malformed",
                )?;
                check(
                    op.coin_amount.symbol == Symbol::Agr && op.coin_amount.amount >= 0,
                    "escrow coin leg malformed",
                )?;
                check(
                    op.debt_amount.amount > 0 || op.coin_amount.amount > 0,
                    "escrow carries no funds",
                )?;
                check(op.fee.amount >= 0, "escrow fee is negative")?;
                check(
                    op.ratification_deadline < op.escrow_expiration,
                    "ratification deadline must precede expiration",
                )?;
                check(op.from != op.to && op.from != op.agent && op.to != op.agent,
                    "escrow parties must be distinct")
            }
            EscrowApprove(op) => check(
                op.who == op.to || op.who == op.agent,
                "only the recipient or agent may approve",
            ),
            EscrowDispute(op) => check(
                op.who == op.from || op.who == op.to,
                "only a party may dispute",
            ),
            EscrowRelease(op) => {
                check(
                    op.receiver == op.from || op.receiver == op.to,
                    "escrow may only release to a party",
                )?;
                check(
                    op.debt_amount.amount >= 0 && op.coin_amount.amount >= 0,
                    "release amounts are negative",
                )?;
                check(
                    op.debt_amount.amount > 0 || op.coin_amount.amount > 0,
                    "release carries no funds",
                )
            }
            DeclineVotingRights(_) => Ok(()),
        }
    }

    /// Account authorities that must sign, by role
    pub fn required_authorities(
        &self,
        owner: &mut BTreeSet<AccountName>,
        active: &mut BTreeSet<AccountName>,
        posting: &mut BTreeSet<AccountName>,
    ) {
        use Operation::*;
        match self {
            AccountCreate(op) => {
                active.insert(op.creator.clone());
            }
            AccountUpdate(op) => {
                if op.owner.is_some() {
                    owner.insert(op.account.clone());
                } else {
                    active.insert(op.account.clone());
                }
            }
            Transfer(op) => {
                active.insert(op.from.clone());
            }
            TransferToVesting(op) => {
                active.insert(op.from.clone());
            }
            WithdrawVesting(op) => {
                active.insert(op.account.clone());
            }
            SetWithdrawVestingRoute(op) => {
                active.insert(op.from_account.clone());
            }
            Convert(op) => {
                active.insert(op.owner.clone());
            }
            LimitOrderCreate(op) => {
                active.insert(op.owner.clone());
            }
            LimitOrderCancel(op) => {
                active.insert(op.owner.clone());
            }
            FeedPublish(op) => {
                active.insert(op.publisher.clone());
            }
            WitnessUpdate(op) => {
                active.insert(op.owner.clone());
            }
            AccountWitnessVote(op) => {
                active.insert(op.account.clone());
            }
            AccountWitnessProxy(op) => {
                active.insert(op.account.clone());
            }
            Post(op) => {
                posting.insert(op.author.clone());
            }
            CommentOptions(op) => {
                posting.insert(op.author.clone());
            }
            DeleteContent(op) => {
                posting.insert(op.author.clone());
            }
            Vote(op) => {
                posting.insert(op.voter.clone());
            }
            CustomJson(op) => {
                for a in &op.required_auths {
                    active.insert(a.clone());
                }
                for a in &op.required_posting_auths {
                    posting.insert(a.clone());
                }
            }
            TransferToSavings(op) => {
                active.insert(op.from.clone());
            }
            TransferFromSavings(op) => {
                active.insert(op.from.clone());
            }
            CancelTransferFromSavings(op) => {
                active.insert(op.from.clone());
            }
            DelegateVestingShares(op) => {
                active.insert(op.delegator.clone());
            }
            EscrowTransfer(op) => {
                active.insert(op.from.clone());
            }
            EscrowApprove(op) => {
                active.insert(op.who.clone());
            }
            EscrowDispute(op) => {
                active.insert(op.who.clone());
            }
            EscrowRelease(op) => {
                active.insert(op.who.clone());
            }
            DeclineVotingRights(op) => {
                owner.insert(op.account.clone());
            }
        }
    }

    /// Market operations are charged bandwidth at a size multiple
    pub fn is_market_operation(&self) -> bool {
        matches!(
            self,
            Operation::Convert(_)
                | Operation::LimitOrderCreate(_)
                | Operation::LimitOrderCancel(_)
        )
    }

    /// Custom-data operations are charged under their own traffic class
    pub fn is_custom_operation(&self) -> bool {
        matches!(self, Operation::CustomJson(_))
    }
}

/// Derived facts emitted for observers; never signed, never replayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VirtualOperation {
    AuthorReward {
        author: AccountName,
        permlink: String,
        debt_payout: Asset,
        coin_payout: Asset,
        vesting_payout: Asset,
    },
    CurationReward {
        curator: AccountName,
        reward: Asset,
        author: AccountName,
        permlink: String,
    },
    CommentBenefactorReward {
        benefactor: AccountName,
        author: AccountName,
        permlink: String,
        reward: Asset,
    },
    CommentReward {
        author: AccountName,
        permlink: String,
        payout: Asset,
    },
    CommentPayoutUpdate {
        author: AccountName,
        permlink: String,
    },
    AuctionWindowReward {
        reward: Asset,
        author: AccountName,
        permlink: String,
    },
    ProducerReward {
        producer: AccountName,
        vesting_shares: Asset,
    },
    LiquidityReward {
        owner: AccountName,
        payout: Asset,
    },
    Interest {
        owner: AccountName,
        interest: Asset,
    },
    FillConvertRequest {
        owner: AccountName,
        requestid: u32,
        amount_in: Asset,
        amount_out: Asset,
    },
    FillVestingWithdraw {
        from_account: AccountName,
        to_account: AccountName,
        withdrawn: Asset,
        deposited: Asset,
    },
    FillOrder {
        current_owner: AccountName,
        current_orderid: u32,
        current_pays: Asset,
        open_owner: AccountName,
        open_orderid: u32,
        open_pays: Asset,
    },
    FillTransferFromSavings {
        from: AccountName,
        to: AccountName,
        amount: Asset,
        request_id: u32,
        memo: String,
    },
    ShutdownWitness {
        witness: AccountName,
    },
    ReturnVestingDelegation {
        account: AccountName,
        vesting_shares: Asset,
    },
    Hardfork {
        version: crate::ProtocolVersion,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_validation() {
        let mut op = TransferOperation {
            from: AccountName::from("alice"),
            to: AccountName::from("bob"),
            amount: Asset::agr(100),
            memo: String::new(),
        };
        assert!(Operation::Transfer(op.clone()).validate().is_ok());

        op.amount = Asset::vests(100);
        assert!(Operation::Transfer(op.clone()).validate().is_err());

        op.amount = Asset::agr(0);
        assert!(Operation::Transfer(op.clone()).validate().is_err());

        op.amount = Asset::agr(1);
        op.to = AccountName::from("alice");
        assert!(Operation::Transfer(op).validate().is_err());
    }

    #[test]
    fn test_vote_weight_bounds() {
        let mut op = VoteOperation {
            voter: AccountName::from("alice"),
            author: AccountName::from("bob"),
            permlink: "post".into(),
            weight: 10_000,
        };
        assert!(Operation::Vote(op.clone()).validate().is_ok());

        op.weight = -10_000;
        assert!(Operation::Vote(op.clone()).validate().is_ok());

        op.weight = 10_001;
        assert!(Operation::Vote(op).validate().is_err());
    }

    #[test]
    fn test_beneficiaries_sorted_unique() {
        let mut op = CommentOptionsOperation {
            author: AccountName::from("alice"),
            permlink: "post".into(),
            max_accepted_payout: Asset::agd(1_000_000),
            percent_debt: PERCENT_100,
            allow_votes: true,
            allow_curation_rewards: true,
            curation_percent: None,
            auction_window_destination: None,
            beneficiaries: vec![
                BeneficiaryRoute {
                    account: AccountName::from("bob"),
                    weight: 5_000,
                },
                BeneficiaryRoute {
                    account: AccountName::from("carol"),
                    weight: 5_000,
                },
            ],
        };
        assert!(Operation::CommentOptions(op.clone()).validate().is_ok());

        op.beneficiaries.reverse();
        assert!(Operation::CommentOptions(op.clone()).validate().is_err());

        op.beneficiaries.reverse();
        op.beneficiaries[0].weight = 6_000;
        assert!(Operation::CommentOptions(op).validate().is_err());
    }

    #[test]
    fn test_custom_json_payload_checked() {
        let mut op = CustomJsonOperation {
            required_auths: vec![AccountName::from("alice")],
            required_posting_auths: vec![],
            id: "follow".into(),
            json: r#"{"what":["blog"]}"#.into(),
        };
        assert!(Operation::CustomJson(op.clone()).validate().is_ok());

        op.json = "not json".into();
        assert!(Operation::CustomJson(op).validate().is_err());
    }

    #[test]
    fn test_required_authorities_by_role() {
        let mut owner = BTreeSet::new();
        let mut active = BTreeSet::new();
        let mut posting = BTreeSet::new();

        Operation::Vote(VoteOperation {
            voter: AccountName::from("alice"),
            author: AccountName::from("bob"),
            permlink: "post".into(),
            weight: 100,
        })
        .required_authorities(&mut owner, &mut active, &mut posting);

        assert!(owner.is_empty());
        assert!(active.is_empty());
        assert!(posting.contains(&AccountName::from("alice")));
    }

    #[test]
    fn test_market_classification() {
        let convert = Operation::Convert(ConvertOperation {
            owner: AccountName::from("alice"),
            requestid: 1,
            amount: Asset::agd(100),
        });
        assert!(convert.is_market_operation());
        assert!(!convert.is_custom_operation());
    }
}
