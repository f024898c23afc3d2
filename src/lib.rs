//! Proofchain - a single-node proof-of-work ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger engine and its shared handle
//! - [`transaction`] - Pending and sealed transactions
//! - [`network`] - Peer registry entries
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work puzzle and solver
//!
//! ## Cryptography
//! - [`crypto`] - Digests and node identifiers
//!
//! ## Integration
//! - [`api`] - HTTP surface (feature `api`)
//! - [`node`] - Process startup
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod network;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;
pub mod node;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, Blockchain, ChainSnapshot, Ledger};
pub use crypto::NodeId;
pub use error::{ChainError, Result};
pub use network::Peer;
pub use transaction::Transaction;
