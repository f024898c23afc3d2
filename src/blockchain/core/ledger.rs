//! Shared, lock-guarded access to the ledger engine.
//!
//! Every read and write goes through one mutex so the chain, the pending
//! pool and the peer registry are always observed together. The lock is
//! never held across the proof search.

use super::chain::{Block, Blockchain};
use crate::crypto::NodeId;
use crate::error::ChainError;
use crate::miner::{proof_of_work, valid_proof};
use crate::network::Peer;
use crate::transaction::{Transaction, COINBASE_SENDER, MINING_REWARD};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A consistent copy of the chain and the peer registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub nodes: Vec<Peer>,
}

/// The chain tip a proof search is run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningJob {
    pub tip_index: u64,
    pub last_proof: u64,
    /// Canonical hash of the tip; becomes the new block's parent hash.
    pub parent_hash: String,
}

/// Cloneable handle to a single ledger engine.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    inner: Arc<Mutex<Blockchain>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::from_blockchain(Blockchain::new())
    }

    pub fn from_blockchain(blockchain: Blockchain) -> Self {
        Ledger {
            inner: Arc::new(Mutex::new(blockchain)),
        }
    }

    pub fn add_transaction(
        &self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
    ) -> u64 {
        self.inner.lock().add_transaction(sender, receiver, amount)
    }

    pub fn seal_block(&self, proof: u64, parent_hash: impl Into<String>) -> Block {
        self.inner.lock().seal_block(proof, parent_hash)
    }

    pub fn last_block(&self) -> Block {
        self.inner.lock().last_block().clone()
    }

    pub fn register_node(&self, address: impl Into<String>) -> Result<Peer, ChainError> {
        self.inner.lock().register_node(address)
    }

    /// Register a peer and return the registry as it stands right after,
    /// both under the same lock.
    pub fn register_node_and_list(
        &self,
        address: impl Into<String>,
    ) -> Result<(Peer, Vec<Peer>), ChainError> {
        let mut bc = self.inner.lock();
        let peer = bc.register_node(address)?;
        Ok((peer, bc.nodes().to_vec()))
    }

    pub fn nodes(&self) -> Vec<Peer> {
        self.inner.lock().nodes().to_vec()
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        let bc = self.inner.lock();
        ChainSnapshot {
            chain: bc.blocks().to_vec(),
            nodes: bc.nodes().to_vec(),
        }
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.inner.lock().pending().to_vec()
    }

    pub fn height(&self) -> u64 {
        self.inner.lock().len() as u64
    }

    /// Capture the current tip. Only the clone happens under the lock; the
    /// tip is hashed after it is released.
    pub fn begin_mining(&self) -> Result<MiningJob, ChainError> {
        let tip = self.last_block();
        Ok(MiningJob {
            tip_index: tip.index,
            last_proof: tip.proof,
            parent_hash: tip.hash()?,
        })
    }

    /// Award the mining reward and seal the pool on top of the job's tip.
    ///
    /// The reward and the seal happen in one critical section. Fails with
    /// [`ChainError::StaleTip`] if another block was sealed since
    /// [`begin_mining`](Self::begin_mining); nothing is appended then.
    pub fn complete_mining(
        &self,
        job: &MiningJob,
        proof: u64,
        beneficiary: &NodeId,
    ) -> Result<Block, ChainError> {
        if !valid_proof(job.last_proof, proof) {
            return Err(ChainError::InvalidBlock(format!(
                "proof {} does not solve the puzzle for last proof {}",
                proof, job.last_proof
            )));
        }

        let mut bc = self.inner.lock();
        let current = bc.last_block().index;
        if current != job.tip_index {
            return Err(ChainError::StaleTip {
                expected: job.tip_index,
                actual: current,
            });
        }

        bc.add_transaction(COINBASE_SENDER, beneficiary.as_str(), MINING_REWARD);
        Ok(bc.seal_block(proof, job.parent_hash.clone()))
    }

    /// Run a full mine cycle on the calling thread.
    pub fn mine(&self, beneficiary: &NodeId) -> Result<Block, ChainError> {
        let job = self.begin_mining()?;
        let proof = proof_of_work(job.last_proof);
        self.complete_mining(&job, proof, beneficiary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::verify_chain;

    #[test]
    fn test_mine_extends_chain() {
        let ledger = Ledger::new();
        let miner = NodeId::generate().unwrap();
        let genesis_hash = ledger.last_block().hash().unwrap();

        ledger.add_transaction("alice", "bob", 3.0);
        let block = ledger.mine(&miner).unwrap();

        assert_eq!(block.index, 2);
        assert_eq!(block.proof, 8325);
        assert_eq!(block.parent_hash, genesis_hash);
        assert_eq!(
            block.transactions,
            vec![
                Transaction::new("alice", "bob", 3.0),
                Transaction::coinbase(miner.as_str()),
            ]
        );
        assert!(ledger.pending_transactions().is_empty());
        assert!(verify_chain(&ledger.snapshot().chain).is_ok());
    }

    #[test]
    fn test_stale_tip_is_rejected() {
        let ledger = Ledger::new();
        let miner = NodeId::generate().unwrap();

        let job = ledger.begin_mining().unwrap();
        ledger.add_transaction("alice", "bob", 1.0);
        ledger.seal_block(0, "someone else");

        let result = ledger.complete_mining(&job, 8325, &miner);
        assert!(matches!(
            result,
            Err(ChainError::StaleTip {
                expected: 1,
                actual: 2
            })
        ));
        assert_eq!(ledger.height(), 2);
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn test_wrong_proof_is_rejected() {
        let ledger = Ledger::new();
        let miner = NodeId::generate().unwrap();
        let job = ledger.begin_mining().unwrap();

        let result = ledger.complete_mining(&job, 8324, &miner);
        assert!(matches!(result, Err(ChainError::InvalidBlock(_))));
        assert_eq!(ledger.height(), 1);
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let ledger = Ledger::new();
        ledger.register_node("10.0.0.1:8181").unwrap();
        let snapshot = ledger.snapshot();

        ledger.seal_block(1, "p");
        ledger.register_node("10.0.0.2:8181").unwrap();

        assert_eq!(snapshot.chain.len(), 1);
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(ledger.snapshot().chain.len(), 2);
    }

    #[test]
    fn test_register_and_list_sees_own_entry() {
        let ledger = Ledger::new();
        ledger.register_node("10.0.0.1:8181").unwrap();

        let (peer, nodes) = ledger.register_node_and_list("10.0.0.2:8181").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes.last(), Some(&peer));
        assert_eq!(ledger.nodes(), nodes);
    }

    #[test]
    fn test_register_and_list_under_contention() {
        let ledger = Ledger::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    ledger
                        .register_node_and_list(format!("10.0.1.{}:8181", t))
                        .unwrap()
                })
            })
            .collect();

        let mut sizes = Vec::new();
        for handle in handles {
            let (peer, nodes) = handle.join().unwrap();
            // Each listing ends with the caller's own entry.
            assert_eq!(nodes.last(), Some(&peer));
            sizes.push(nodes.len());
        }
        sizes.sort_unstable();
        assert_eq!(sizes, (1..=8).collect::<Vec<_>>());
    }
}
