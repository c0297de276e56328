// chain-crypto/src/digest.rs

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use sha3::Sha3_256;
use std::fmt;

/// Digest output size in bytes
pub const DIGEST_SIZE: usize = 32;

/// Supported digest algorithms
///
/// Block/transaction identities always use Sha256; the other algorithms are
/// available for application payloads (custom-data operations, snapshots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    Sha256,
    Sha3_256,
    Blake3,
}

/// A 32-byte digest used for block ids, transaction ids and checksums
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Create a digest from raw bytes
    pub fn new(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a digest from a slice (returns error if wrong length)
    pub fn from_slice(slice: &[u8]) -> Result<Self, crate::CryptoError> {
        if slice.len() != DIGEST_SIZE {
            return Err(crate::CryptoError::InvalidDigest);
        }
        let mut bytes = [0u8; DIGEST_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Get the digest as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the digest as a fixed-size array
    pub fn to_bytes(&self) -> [u8; DIGEST_SIZE] {
        self.0
    }

    /// The all-zero digest (genesis previous-id, empty merkle root)
    pub fn zero() -> Self {
        Self([0u8; DIGEST_SIZE])
    }

    /// True for the all-zero digest
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; DIGEST_SIZE]
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> Result<Self, crate::CryptoError> {
        let bytes = hex::decode(s)
            .map_err(|e| crate::CryptoError::DecodingError(e.to_string()))?;
        Self::from_slice(&bytes)
    }

}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Digest({}...{})",
            hex::encode(&self.0[..4]),
            hex::encode(&self.0[28..])
        )
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::zero()
    }
}

/// Trait for byte buffers that can be digested
pub trait Digestible {
    fn digest(&self) -> Digest;
    fn digest_with(&self, algorithm: DigestAlgorithm) -> Digest;
}

impl Digestible for [u8] {
    fn digest(&self) -> Digest {
        self.digest_with(DigestAlgorithm::Sha256)
    }

    fn digest_with(&self, algorithm: DigestAlgorithm) -> Digest {
        match algorithm {
            DigestAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(self);
                Digest::new(hasher.finalize().into())
            }
            DigestAlgorithm::Sha3_256 => {
                let mut hasher = Sha3_256::new();
                hasher.update(self);
                Digest::new(hasher.finalize().into())
            }
            DigestAlgorithm::Blake3 => {
                let hash = blake3::hash(self);
                Digest::new(*hash.as_bytes())
            }
        }
    }
}

impl Digestible for Vec<u8> {
    fn digest(&self) -> Digest {
        self.as_slice().digest()
    }

    fn digest_with(&self, algorithm: DigestAlgorithm) -> Digest {
        self.as_slice().digest_with(algorithm)
    }
}

impl Digestible for &str {
    fn digest(&self) -> Digest {
        self.as_bytes().digest()
    }

    fn digest_with(&self, algorithm: DigestAlgorithm) -> Digest {
        self.as_bytes().digest_with(algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        let data = b"canonical bytes";
        assert_eq!(data.digest(), data.digest());
    }

    #[test]
    fn test_digest_algorithms_disagree() {
        let data = b"payload";
        let sha256 = data.digest_with(DigestAlgorithm::Sha256);
        let sha3 = data.digest_with(DigestAlgorithm::Sha3_256);
        let blake3 = data.digest_with(DigestAlgorithm::Blake3);

        assert_ne!(sha256, sha3);
        assert_ne!(sha256, blake3);
        assert_ne!(sha3, blake3);
    }

    #[test]
    fn test_digest_hex_roundtrip() {
        let digest = b"test".digest();
        let parsed = Digest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn test_zero_digest() {
        assert!(Digest::zero().is_zero());
        assert!(!b"x".digest().is_zero());
    }
}
