// chain-core/src/authority.rs

use crate::AccountName;
use chain_crypto::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weighted multi-party authority over an account role.
///
/// An authority is satisfied when the weights of the provided signing keys,
/// plus the (recursively resolved) weights of satisfied account authorities,
/// reach the threshold. Recursion into account authorities is bounded by the
/// pipeline, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    pub account_auths: BTreeMap<AccountName, u16>,
    pub key_auths: BTreeMap<PublicKey, u16>,
}

impl Authority {
    /// Single-key authority with threshold 1
    pub fn single_key(key: PublicKey) -> Self {
        let mut key_auths = BTreeMap::new();
        key_auths.insert(key, 1);
        Self {
            weight_threshold: 1,
            account_auths: BTreeMap::new(),
            key_auths,
        }
    }

    /// An authority nobody can satisfy (used for the null account)
    pub fn impossible() -> Self {
        Self {
            weight_threshold: 1,
            account_auths: BTreeMap::new(),
            key_auths: BTreeMap::new(),
        }
    }

    pub fn is_impossible(&self) -> bool {
        let max: u64 = self
            .account_auths
            .values()
            .chain(self.key_auths.values())
            .map(|w| *w as u64)
            .sum();
        max < self.weight_threshold as u64
    }

    /// Structural sanity: a zero threshold would make every signature set
    /// sufficient, including the empty one.
    pub fn validate(&self) -> bool {
        self.weight_threshold > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::{KeyPair, SignatureScheme};

    #[test]
    fn test_single_key_authority() {
        let kp = KeyPair::from_seed(SignatureScheme::Ed25519, "owner").unwrap();
        let auth = Authority::single_key(kp.public_key().clone());

        assert!(auth.validate());
        assert!(!auth.is_impossible());
        assert_eq!(auth.key_auths.len(), 1);
    }

    #[test]
    fn test_impossible_authority() {
        let auth = Authority::impossible();
        assert!(auth.validate());
        assert!(auth.is_impossible());
    }

    #[test]
    fn test_zero_threshold_invalid() {
        let mut auth = Authority::impossible();
        auth.weight_threshold = 0;
        assert!(!auth.validate());
    }
}
