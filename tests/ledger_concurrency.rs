//! Integration tests for the shared ledger under concurrent callers

use proofchain::blockchain::{verify_chain, Ledger};
use proofchain::crypto::NodeId;
use proofchain::error::ChainError;
use proofchain::transaction::Transaction;
use std::collections::HashSet;
use std::sync::{mpsc, Arc, Barrier};
use std::thread;

#[test]
fn test_fresh_ledger() {
    let ledger = Ledger::new();
    let snapshot = ledger.snapshot();

    assert_eq!(snapshot.chain.len(), 1);
    let genesis = &snapshot.chain[0];
    assert_eq!(genesis.index, 1);
    assert_eq!(genesis.proof, 100);
    assert_eq!(genesis.parent_hash, "1");
    assert!(genesis.transactions.is_empty());

    assert!(snapshot.nodes.is_empty());
    assert!(ledger.pending_transactions().is_empty());
}

#[test]
fn test_concurrent_adds_are_not_lost() {
    const THREADS: usize = 16;
    const PER_THREAD: usize = 50;

    let ledger = Ledger::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let ledger = ledger.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let index = ledger.add_transaction(format!("t{}", t), format!("r{}", i), 1.0);
                    assert_eq!(index, 2);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let block = ledger.seal_block(42, "abc123");
    assert_eq!(block.transactions.len(), THREADS * PER_THREAD);
    assert!(ledger.pending_transactions().is_empty());

    // Each thread's own transactions keep their relative order.
    for t in 0..THREADS {
        let sender = format!("t{}", t);
        let receivers: Vec<String> = block
            .transactions
            .iter()
            .filter(|tx| tx.sender == sender)
            .map(|tx| tx.receiver.clone())
            .collect();
        let expected: Vec<String> = (0..PER_THREAD).map(|i| format!("r{}", i)).collect();
        assert_eq!(receivers, expected);
    }
}

#[test]
fn test_concurrent_registrations() {
    const THREADS: usize = 8;

    let ledger = Ledger::new();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let ledger = ledger.clone();
            thread::spawn(move || ledger.register_node(format!("10.0.0.{}:9000", t)))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let nodes = ledger.snapshot().nodes;
    assert_eq!(nodes.len(), THREADS);
    let ids: HashSet<&NodeId> = nodes.iter().map(|n| &n.node_id).collect();
    assert_eq!(ids.len(), THREADS);
}

#[test]
fn test_adds_proceed_while_mining() {
    let ledger = Ledger::new();
    let miner = NodeId::generate().unwrap();

    let job = ledger.begin_mining().unwrap();
    let (go, wait) = mpsc::channel::<()>();
    let mining = {
        let ledger = ledger.clone();
        let miner = miner.clone();
        thread::spawn(move || {
            let proof = proofchain::miner::proof_of_work(job.last_proof);
            wait.recv().unwrap();
            ledger.complete_mining(&job, proof, &miner)
        })
    };

    // The ledger stays available while a mine cycle is outstanding.
    ledger.add_transaction("alice", "bob", 1.0);
    ledger.register_node("10.0.0.9:9000").unwrap();
    go.send(()).unwrap();

    let block = mining.join().unwrap().unwrap();
    assert_eq!(block.index, 2);
    assert_eq!(
        block.transactions,
        vec![
            Transaction::new("alice", "bob", 1.0),
            Transaction::coinbase(miner.as_str()),
        ]
    );
}

#[test]
fn test_racing_miners_seal_once_per_tip() {
    let ledger = Ledger::new();
    let jobs: Vec<_> = (0..2).map(|_| ledger.begin_mining().unwrap()).collect();
    let miner = NodeId::generate().unwrap();

    let first = ledger.complete_mining(&jobs[0], 8325, &miner);
    let second = ledger.complete_mining(&jobs[1], 8325, &miner);

    assert!(first.is_ok());
    assert!(matches!(second, Err(ChainError::StaleTip { .. })));
    assert_eq!(ledger.height(), 2);
    assert!(verify_chain(&ledger.snapshot().chain).is_ok());
}

#[test]
fn test_indices_stay_contiguous_under_contention() {
    let ledger = Ledger::new();
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for p in 0..10 {
                    ledger.add_transaction("s", "r", 0.5);
                    ledger.seal_block(t * 100 + p, "p");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let chain = ledger.snapshot().chain;
    assert_eq!(chain.len(), 81);
    for (position, block) in chain.iter().enumerate() {
        assert_eq!(block.index, position as u64 + 1);
    }
    let sealed: usize = chain.iter().map(|b| b.transactions.len()).sum();
    assert_eq!(sealed, 80);
}
