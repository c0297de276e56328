// chain-crypto/src/keys.rs

use crate::{CryptoError, CryptoResult, Signature, SignatureScheme};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base58 prefix applied to rendered public keys
const PUBLIC_KEY_PREFIX: &str = "AGR";

/// Public key of an account authority or a block producer
#[derive(Clone, Serialize, Deserialize, PartialOrd, Ord)]
pub struct PublicKey {
    scheme: SignatureScheme,
    bytes: Vec<u8>,
}

impl PublicKey {
    pub fn new(scheme: SignatureScheme, bytes: Vec<u8>) -> Self {
        Self { scheme, bytes }
    }

    /// An empty key; a producer carrying it is considered shut down
    /// and is skipped by the scheduler.
    pub fn empty() -> Self {
        Self {
            scheme: SignatureScheme::Ed25519,
            bytes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Render as prefixed base58 (the on-chain display form)
    pub fn to_base58(&self) -> String {
        format!("{}{}", PUBLIC_KEY_PREFIX, bs58::encode(&self.bytes).into_string())
    }

    /// Parse the prefixed base58 display form
    pub fn from_base58(scheme: SignatureScheme, s: &str) -> CryptoResult<Self> {
        let body = s
            .strip_prefix(PUBLIC_KEY_PREFIX)
            .ok_or_else(|| CryptoError::DecodingError("missing key prefix".into()))?;
        let bytes = bs58::decode(body)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;
        Ok(Self::new(scheme, bytes))
    }

    /// Verify a signature made over `message` by the matching private key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<bool> {
        signature.verify(message, self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({:?}, {})", self.scheme, self.to_base58())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme && self.bytes == other.bytes
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.scheme.hash(state);
        self.bytes.hash(state);
    }
}

/// Private key material, zeroed on drop
pub struct PrivateKey {
    scheme: SignatureScheme,
    bytes: Vec<u8>,
}

impl PrivateKey {
    pub fn new(scheme: SignatureScheme, bytes: Vec<u8>) -> Self {
        Self { scheme, bytes }
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.bytes.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({:?}, [REDACTED])", self.scheme)
    }
}

/// Key pair for signing blocks and transactions
pub struct KeyPair {
    scheme: SignatureScheme,
    public_key: PublicKey,
    private_key: PrivateKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate(scheme: SignatureScheme) -> CryptoResult<Self> {
        match scheme {
            SignatureScheme::Ed25519 => Self::generate_ed25519(),
            SignatureScheme::Secp256k1 => Self::generate_secp256k1(),
        }
    }

    fn generate_ed25519() -> CryptoResult<Self> {
        use ed25519_dalek::{SigningKey, VerifyingKey};
        use rand::rngs::OsRng;

        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key: VerifyingKey = (&signing_key).into();

        Ok(Self {
            scheme: SignatureScheme::Ed25519,
            public_key: PublicKey::new(
                SignatureScheme::Ed25519,
                verifying_key.to_bytes().to_vec(),
            ),
            private_key: PrivateKey::new(
                SignatureScheme::Ed25519,
                signing_key.to_bytes().to_vec(),
            ),
        })
    }

    fn generate_secp256k1() -> CryptoResult<Self> {
        use rand::rngs::OsRng;
        use secp256k1::{PublicKey as SecpPk, Secp256k1, SecretKey as SecpSk};

        let secp = Secp256k1::new();
        let mut rng = OsRng;

        let secret_key = SecpSk::new(&mut rng);
        let public_key = SecpPk::from_secret_key(&secp, &secret_key);

        Ok(Self {
            scheme: SignatureScheme::Secp256k1,
            public_key: PublicKey::new(
                SignatureScheme::Secp256k1,
                public_key.serialize().to_vec(),
            ),
            private_key: PrivateKey::new(
                SignatureScheme::Secp256k1,
                secret_key.secret_bytes().to_vec(),
            ),
        })
    }

    /// Derive a deterministic key pair from a seed phrase.
    /// Genesis producer keys and test fixtures are derived this way so that
    /// independent nodes bootstrap identical state.
    pub fn from_seed(scheme: SignatureScheme, seed: &str) -> CryptoResult<Self> {
        use crate::digest::Digestible;
        let digest = seed.as_bytes().digest();

        match scheme {
            SignatureScheme::Ed25519 => {
                use ed25519_dalek::{SigningKey, VerifyingKey};
                let signing_key = SigningKey::from_bytes(&digest.to_bytes());
                let verifying_key: VerifyingKey = (&signing_key).into();
                Ok(Self {
                    scheme,
                    public_key: PublicKey::new(scheme, verifying_key.to_bytes().to_vec()),
                    private_key: PrivateKey::new(scheme, signing_key.to_bytes().to_vec()),
                })
            }
            SignatureScheme::Secp256k1 => {
                use secp256k1::{PublicKey as SecpPk, Secp256k1, SecretKey as SecpSk};
                let secp = Secp256k1::new();
                let secret_key = SecpSk::from_slice(digest.as_bytes())
                    .map_err(|_| CryptoError::InvalidPrivateKey)?;
                let public_key = SecpPk::from_secret_key(&secp, &secret_key);
                Ok(Self {
                    scheme,
                    public_key: PublicKey::new(scheme, public_key.serialize().to_vec()),
                    private_key: PrivateKey::new(scheme, secret_key.secret_bytes().to_vec()),
                })
            }
        }
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Sign a message digest
    pub fn sign(&self, message: &[u8]) -> CryptoResult<Signature> {
        match self.scheme {
            SignatureScheme::Ed25519 => self.sign_ed25519(message),
            SignatureScheme::Secp256k1 => self.sign_secp256k1(message),
        }
    }

    fn sign_ed25519(&self, message: &[u8]) -> CryptoResult<Signature> {
        use ed25519_dalek::{Signature as Ed25519Sig, Signer, SigningKey};

        let signing_key = SigningKey::from_bytes(
            self.private_key
                .as_bytes()
                .try_into()
                .map_err(|_| CryptoError::InvalidPrivateKey)?,
        );

        let signature: Ed25519Sig = signing_key.sign(message);
        Ok(Signature::new(
            SignatureScheme::Ed25519,
            signature.to_bytes().to_vec(),
        ))
    }

    fn sign_secp256k1(&self, message: &[u8]) -> CryptoResult<Signature> {
        use secp256k1::{Message, Secp256k1, SecretKey as SecpSk};

        let secp = Secp256k1::signing_only();

        let secret_key = SecpSk::from_slice(self.private_key.as_bytes())
            .map_err(|_| CryptoError::InvalidPrivateKey)?;

        let msg_digest = crate::digest::Digestible::digest(message);
        let msg = Message::from_digest_slice(msg_digest.as_bytes())
            .map_err(|_| CryptoError::InvalidSignature)?;

        let signature = secp.sign_ecdsa(&msg, &secret_key);
        Ok(Signature::new(
            SignatureScheme::Secp256k1,
            signature.serialize_compact().to_vec(),
        ))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("scheme", &self.scheme)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp1 = KeyPair::generate(SignatureScheme::Ed25519).unwrap();
        let kp2 = KeyPair::generate(SignatureScheme::Ed25519).unwrap();
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_seeded_keypair_deterministic() {
        let kp1 = KeyPair::from_seed(SignatureScheme::Ed25519, "producer-0").unwrap();
        let kp2 = KeyPair::from_seed(SignatureScheme::Ed25519, "producer-0").unwrap();
        assert_eq!(kp1.public_key(), kp2.public_key());

        let kp3 = KeyPair::from_seed(SignatureScheme::Ed25519, "producer-1").unwrap();
        assert_ne!(kp1.public_key(), kp3.public_key());
    }

    #[test]
    fn test_sign_verify() {
        let keypair = KeyPair::generate(SignatureScheme::Ed25519).unwrap();
        let message = b"block header bytes";

        let signature = keypair.sign(message).unwrap();
        assert!(keypair.public_key().verify(message, &signature).unwrap());
    }

    #[test]
    fn test_base58_roundtrip() {
        let keypair = KeyPair::from_seed(SignatureScheme::Ed25519, "seed").unwrap();
        let rendered = keypair.public_key().to_base58();
        assert!(rendered.starts_with("AGR"));

        let parsed = PublicKey::from_base58(SignatureScheme::Ed25519, &rendered).unwrap();
        assert_eq!(&parsed, keypair.public_key());
    }

    #[test]
    fn test_empty_key() {
        assert!(PublicKey::empty().is_empty());
    }
}
