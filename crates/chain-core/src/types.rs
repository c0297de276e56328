// chain-core/src/types.rs

use chain_crypto::Digest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block number/height
pub type BlockNumber = u64;

/// Block identity (digest of the signed header)
pub type BlockId = Digest;

/// Transaction identity (digest of the unsigned transaction)
pub type TransactionId = Digest;

/// Content item identity; assigned sequentially and never reused
pub type ContentId = u64;

/// Basis points; 10000 = 100%
pub type Percent = u16;

/// 100% in basis points
pub const PERCENT_100: u16 = 10_000;

/// 1% in basis points
pub const PERCENT_1: u16 = 100;

/// Seconds since the Unix epoch.
///
/// `Timestamp::MAX` models "never" (e.g. a content item that will not cash
/// out again); `Timestamp::ZERO` models "not yet" (e.g. no payout so far).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn secs(&self) -> u64 {
        self.0
    }

    pub fn saturating_add(&self, secs: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(secs))
    }

    pub fn saturating_sub(&self, secs: u64) -> Timestamp {
        Timestamp(self.0.saturating_sub(secs))
    }

    /// Whole seconds elapsed since `earlier`; zero if `earlier` is later
    pub fn secs_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Timestamp::MAX {
            return write!(f, "never");
        }
        match chrono::DateTime::from_timestamp(self.0 as i64, 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "{}s", self.0),
        }
    }
}

/// Name of an account; doubles as the account's ledger key
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AccountName(pub String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Account-name grammar: 3..=16 chars of lowercase ascii segments
    /// separated by single dots or dashes, each segment starting with a
    /// letter and ending with a letter or digit.
    pub fn is_valid(&self) -> bool {
        let name = &self.0;
        if name.len() < 3 || name.len() > 16 {
            return false;
        }
        for segment in name.split(['.', '-']) {
            if segment.is_empty() {
                return false;
            }
            let bytes = segment.as_bytes();
            if !bytes[0].is_ascii_lowercase() {
                return false;
            }
            if !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
                return false;
            }
            if !bytes
                .iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Running software / consensus-rule version reported by producers
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl ProtocolVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
