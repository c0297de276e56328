// chain-db/src/skip.rs

/// Validation steps trusted replay may omit for speed.
///
/// Production nodes must never skip authority or signature checks for
/// untrusted input; replaying a locally stored chain may skip nearly
/// everything because the blocks were fully validated when first received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipFlags(pub u32);

impl SkipFlags {
    pub const NOTHING: SkipFlags = SkipFlags(0);
    pub const WITNESS_SIGNATURE: u32 = 1 << 0;
    pub const TRANSACTION_SIGNATURES: u32 = 1 << 1;
    pub const TRANSACTION_DUPE_CHECK: u32 = 1 << 2;
    pub const FORK_DB: u32 = 1 << 3;
    pub const MERKLE_CHECK: u32 = 1 << 4;
    pub const BLOCK_SIZE_CHECK: u32 = 1 << 5;
    pub const AUTHORITY_CHECK: u32 = 1 << 6;
    pub const WITNESS_SCHEDULE_CHECK: u32 = 1 << 7;
    pub const UNDO_HISTORY_CHECK: u32 = 1 << 8;
    pub const VALIDATE_OPERATIONS: u32 = 1 << 9;
    pub const VALIDATE_INVARIANTS: u32 = 1 << 10;

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn with(self, flag: u32) -> SkipFlags {
        SkipFlags(self.0 | flag)
    }

    /// Everything a trusted replay may omit
    pub fn trusted_replay() -> SkipFlags {
        SkipFlags(
            Self::WITNESS_SIGNATURE
                | Self::TRANSACTION_SIGNATURES
                | Self::TRANSACTION_DUPE_CHECK
                | Self::FORK_DB
                | Self::BLOCK_SIZE_CHECK
                | Self::AUTHORITY_CHECK
                | Self::WITNESS_SCHEDULE_CHECK
                | Self::UNDO_HISTORY_CHECK
                | Self::VALIDATE_OPERATIONS,
        )
    }
}
