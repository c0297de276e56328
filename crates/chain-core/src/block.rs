// chain-core/src/block.rs

use crate::{
    AccountName, BlockId, BlockNumber, ChainError, ChainResult, ProtocolVersion,
    SignedTransaction, Timestamp,
};
use chain_crypto::{Digest, Digestible, KeyPair, MerkleTree, PublicKey, Signature};
use serde::{Deserialize, Serialize};

/// Optional consensus signals a producer attaches to a block header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeaderExtension {
    /// The software version the producer is running
    ReportedVersion(ProtocolVersion),
    /// The producer's vote for the next hardfork version and activation time
    HardforkVote {
        version: ProtocolVersion,
        time: Timestamp,
    },
}

/// Block header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub previous: BlockId,
    pub number: BlockNumber,
    pub timestamp: Timestamp,
    pub producer: AccountName,
    pub transaction_merkle_root: Digest,
    pub extensions: Vec<HeaderExtension>,
}

impl BlockHeader {
    /// Block identity: digest of the canonical header encoding
    pub fn id(&self) -> BlockId {
        bincode::serialize(self)
            .expect("header serialization is infallible")
            .digest()
    }
}

/// A produced block: header, producer signature, transaction list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedBlock {
    pub header: BlockHeader,
    pub producer_signature: Signature,
    pub transactions: Vec<SignedTransaction>,
}

impl SignedBlock {
    pub fn id(&self) -> BlockId {
        self.header.id()
    }

    pub fn number(&self) -> BlockNumber {
        self.header.number
    }

    pub fn timestamp(&self) -> Timestamp {
        self.header.timestamp
    }

    /// Merkle root over the transaction ids in block order
    pub fn calculate_merkle_root(&self) -> Digest {
        let ids: Vec<Digest> = self.transactions.iter().map(|tx| tx.id()).collect();
        MerkleTree::root_of(&ids)
    }

    /// Serialized size used for the block-size bound and averages
    pub fn serialized_size(&self) -> usize {
        bincode::serialize(self)
            .expect("block serialization is infallible")
            .len()
    }

    /// Verify the producer signature against the scheduled producer's key
    pub fn validate_signee(&self, signing_key: &PublicKey) -> ChainResult<()> {
        let digest = self.header.id();
        if signing_key
            .verify(digest.as_bytes(), &self.producer_signature)?
        {
            Ok(())
        } else {
            Err(ChainError::SignatureMismatch(format!(
                "block {} not signed by scheduled producer key",
                self.header.number
            )))
        }
    }

    /// Assemble and sign a block. The merkle root is computed here; callers
    /// provide everything else.
    pub fn produce(
        previous: BlockId,
        number: BlockNumber,
        timestamp: Timestamp,
        producer: AccountName,
        transactions: Vec<SignedTransaction>,
        extensions: Vec<HeaderExtension>,
        signing_key: &KeyPair,
    ) -> ChainResult<Self> {
        let ids: Vec<Digest> = transactions.iter().map(|tx| tx.id()).collect();
        let header = BlockHeader {
            previous,
            number,
            timestamp,
            producer,
            transaction_merkle_root: MerkleTree::root_of(&ids),
            extensions,
        };
        let digest = header.id();
        let producer_signature = signing_key.sign(digest.as_bytes())?;
        Ok(Self {
            header,
            producer_signature,
            transactions,
        })
    }
}
