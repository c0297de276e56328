// chain-core/src/transaction.rs

use crate::{ChainError, ChainResult, Operation, Timestamp, TransactionId};
use chain_crypto::{Digestible, KeyPair, PublicKey, Signature};
use serde::{Deserialize, Serialize};

/// An unsigned transaction: an expiration and an ordered operation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub expiration: Timestamp,
    pub operations: Vec<Operation>,
}

impl Transaction {
    pub fn new(expiration: Timestamp, operations: Vec<Operation>) -> Self {
        Self {
            expiration,
            operations,
        }
    }

    /// Canonical byte encoding used for the id and the signing digest
    pub fn canonical_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("transaction serialization is infallible")
    }

    /// Transaction identity: digest of the unsigned canonical encoding
    pub fn id(&self) -> TransactionId {
        self.canonical_bytes().digest()
    }

    /// Static well-formedness; dynamic preconditions are the evaluators' job
    pub fn validate(&self) -> ChainResult<()> {
        if self.operations.is_empty() {
            return Err(ChainError::InvalidTransaction(
                "transaction contains no operations".into(),
            ));
        }
        for op in &self.operations {
            op.validate()?;
        }
        Ok(())
    }
}

/// A transaction with its authorizing signatures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: Transaction,
    pub signatures: Vec<Signature>,
}

impl SignedTransaction {
    pub fn new(tx: Transaction) -> Self {
        Self {
            tx,
            signatures: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.tx.id()
    }

    /// Serialized size used for block-size and bandwidth accounting
    pub fn serialized_size(&self) -> usize {
        bincode::serialize(self)
            .expect("transaction serialization is infallible")
            .len()
    }

    /// Append a signature over the signing digest
    pub fn sign(&mut self, keypair: &KeyPair) -> ChainResult<()> {
        let digest = self.tx.canonical_bytes();
        self.signatures.push(keypair.sign(&digest)?);
        Ok(())
    }

    /// Which of `candidate_keys` actually signed this transaction
    pub fn signed_by<'a>(&self, candidate_keys: &'a [PublicKey]) -> ChainResult<Vec<&'a PublicKey>> {
        let digest = self.tx.canonical_bytes();
        let mut signers = Vec::new();
        for key in candidate_keys {
            for sig in &self.signatures {
                if key.verify(&digest, sig)? {
                    signers.push(key);
                    break;
                }
            }
        }
        Ok(signers)
    }
}
