use crate::crypto::{sha256_hex, NodeId};
use crate::error::ChainError;
use crate::network::Peer;
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

/// Proof recorded in the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Parent hash recorded in the genesis block.
pub const GENESIS_PARENT_HASH: &str = "1";

/// A sealed batch of transactions.
///
/// Field order is the canonical serialization order; the block hash depends
/// on it, so do not reorder the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub parent_hash: String,
}

impl Block {
    /// Deterministic JSON encoding of every field, in declaration order.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ChainError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// SHA-256 of the canonical encoding, hex encoded.
    pub fn hash(&self) -> Result<String, ChainError> {
        Ok(sha256_hex(&self.canonical_bytes()?))
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 1
    }
}

/// The ledger engine: the chain, the pending pool and the peer registry.
///
/// This type is not synchronized. Share it through
/// [`Ledger`](super::ledger::Ledger), which serializes every access.
#[derive(Debug)]
pub struct Blockchain {
    blocks: Vec<Block>,
    pending: Vec<Transaction>,
    nodes: Vec<Peer>,
}

impl Blockchain {
    /// Create a ledger holding only the genesis block.
    pub fn new() -> Self {
        let mut blockchain = Blockchain {
            blocks: Vec::new(),
            pending: Vec::new(),
            nodes: Vec::new(),
        };
        blockchain.seal_block(GENESIS_PROOF, GENESIS_PARENT_HASH);
        blockchain
    }

    /// Queue a transaction for the next block.
    ///
    /// Returns the index the block containing it is expected to have.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.pending.push(Transaction::new(sender, receiver, amount));
        self.last_block().index + 1
    }

    /// Seal the pending pool into a new block and append it.
    ///
    /// `parent_hash` is trusted as given; use
    /// [`verify_chain`](super::validation::verify_chain) to audit linkage.
    pub fn seal_block(&mut self, proof: u64, parent_hash: impl Into<String>) -> Block {
        let block = Block {
            index: self.blocks.len() as u64 + 1,
            timestamp: Utc::now(),
            // The block takes ownership of the pool; nothing else can reach
            // these transactions afterwards.
            transactions: std::mem::take(&mut self.pending),
            proof,
            parent_hash: parent_hash.into(),
        };
        self.blocks.push(block.clone());
        block
    }

    pub fn last_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("the genesis block is forged at construction")
    }

    /// Register a peer under a freshly generated identifier.
    pub fn register_node(&mut self, address: impl Into<String>) -> Result<Peer, ChainError> {
        self.register_node_with(address, &mut OsRng)
    }

    /// Register a peer, drawing its identifier from `rng`.
    ///
    /// Nothing is appended when identifier generation fails.
    pub fn register_node_with<R: RngCore + ?Sized>(
        &mut self,
        address: impl Into<String>,
        rng: &mut R,
    ) -> Result<Peer, ChainError> {
        let peer = Peer::new(NodeId::generate_with(rng)?, address);
        self.nodes.push(peer.clone());
        Ok(peer)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn nodes(&self) -> &[Peer] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the genesis block exists from construction.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
