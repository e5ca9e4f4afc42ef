//! LedgerChain - a minimal proof-of-work ledger
//!
//! Transfers are staged, sealed into hash-linked blocks, mined against a
//! leading-zero difficulty and replayed to derive balances. Everything lives
//! in memory and is driven by a single owner.
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the chain, balances and validation
//! - [`transaction`] - Transfer records
//!
//! ## Proof of Work
//! - [`miner`] - Sequential and multi-threaded puzzle search
//! - [`crypto`] - SHA-256 fingerprints and difficulty checks
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust
//! use ledgerchain::blockchain::Blockchain;
//! use ledgerchain::transaction::Transfer;
//!
//! let mut chain = Blockchain::with_params(1, 100.0).unwrap();
//! chain.submit_transfer(Transfer::new("alice", "bob", 30.0));
//! chain.mine_pending("miner").unwrap();
//!
//! assert_eq!(chain.balance_of("bob"), 30.0);
//! assert_eq!(chain.balance_of("miner"), 0.0); // reward still staged
//! assert!(chain.is_valid());
//! ```

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Proof of Work
// ============================================================================
pub mod crypto;
pub mod miner;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, Blockchain, ChainFault};
pub use error::{ChainError, Result};
pub use miner::{CancelToken, MiningOptions, MiningReport};
pub use transaction::{Address, Transfer};
