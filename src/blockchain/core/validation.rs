use std::fmt;
use tracing::warn;

use super::chain::{Block, Blockchain};

/// A defect found while walking the chain. Reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainFault {
    /// The block's stored fingerprint no longer matches its contents.
    FingerprintMismatch { index: usize },
    /// The block does not point at its predecessor's fingerprint.
    BrokenLink { index: usize },
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainFault::FingerprintMismatch { index } => write!(f, "block {} fingerprint mismatch", index),
            ChainFault::BrokenLink { index } => write!(f, "block {} previous fingerprint mismatch", index),
        }
    }
}

/// Check `current` (at `index`) against itself and against `previous`.
pub fn validate_link(index: usize, previous: &Block, current: &Block) -> Vec<ChainFault> {
    let mut faults = Vec::new();
    if !current.has_consistent_fingerprint() {
        faults.push(ChainFault::FingerprintMismatch { index });
    }
    if current.previous_fingerprint != previous.fingerprint {
        faults.push(ChainFault::BrokenLink { index });
    }
    faults
}

impl Blockchain {
    /// Every fault in the chain, in block order. Genesis is only checked as
    /// the predecessor of block 1.
    pub fn validate_chain(&self) -> Vec<ChainFault> {
        let faults: Vec<ChainFault> = self
            .blocks
            .windows(2)
            .enumerate()
            .flat_map(|(i, pair)| validate_link(i + 1, &pair[0], &pair[1]))
            .collect();

        for fault in &faults {
            warn!("Chain validation: {}", fault);
        }
        faults
    }

    /// True when every block after genesis matches its fingerprint and links
    /// to its predecessor.
    pub fn is_valid(&self) -> bool {
        self.blocks
            .windows(2)
            .enumerate()
            .all(|(i, pair)| validate_link(i + 1, &pair[0], &pair[1]).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transfer;

    fn mined_chain() -> Blockchain {
        let mut chain = Blockchain::with_params(1, 100.0).unwrap();
        chain.submit_transfer(Transfer::new("A", "B", 100.0));
        chain.submit_transfer(Transfer::new("B", "A", 50.0));
        chain.mine_pending("miner").unwrap();
        chain.mine_pending("miner").unwrap();
        chain
    }

    #[test]
    fn test_fresh_chain_is_valid() {
        let chain = Blockchain::new().unwrap();
        assert!(chain.is_valid());
        assert!(chain.validate_chain().is_empty());
    }

    #[test]
    fn test_mined_chain_is_valid() {
        assert!(mined_chain().is_valid());
    }

    #[test]
    fn test_tampered_amount_is_detected() {
        let mut chain = mined_chain();
        chain.blocks[1].records[0].amount = 1_000_000.0;

        assert!(!chain.is_valid());
        assert_eq!(chain.validate_chain(), vec![ChainFault::FingerprintMismatch { index: 1 }]);
    }

    #[test]
    fn test_tampered_non_finite_amount_is_detected() {
        let mut chain = Blockchain::with_params(1, 100.0).unwrap();
        chain.submit_transfer(Transfer::new("A", "B", f64::INFINITY));
        chain.mine_pending("miner").unwrap();
        chain.mine_pending("miner").unwrap();
        assert!(chain.is_valid());

        for forged in [f64::NEG_INFINITY, f64::NAN] {
            let mut tampered = chain.clone();
            tampered.blocks[1].records[0].amount = forged;
            assert!(!tampered.is_valid());
            assert_eq!(tampered.validate_chain(), vec![ChainFault::FingerprintMismatch { index: 1 }]);
        }
    }

    #[test]
    fn test_rewritten_fingerprint_breaks_the_next_link() {
        let mut chain = mined_chain();
        chain.blocks[1].records[0].amount = 1_000_000.0;
        chain.blocks[1].fingerprint = chain.blocks[1].compute_fingerprint().unwrap();

        assert!(!chain.is_valid());
        assert_eq!(chain.validate_chain(), vec![ChainFault::BrokenLink { index: 2 }]);
    }

    #[test]
    fn test_broken_link_is_detected() {
        let mut chain = mined_chain();
        let block = &mut chain.blocks[2];
        block.previous_fingerprint = "deadbeef".to_string();
        block.fingerprint = block.compute_fingerprint().unwrap();

        assert!(block.has_consistent_fingerprint());
        assert!(!chain.is_valid());
        assert_eq!(chain.validate_chain(), vec![ChainFault::BrokenLink { index: 2 }]);
    }

    #[test]
    fn test_reordered_blocks_are_detected() {
        let mut chain = mined_chain();
        chain.blocks.swap(1, 2);
        assert!(!chain.is_valid());
    }

    #[test]
    fn test_genesis_is_not_self_checked() {
        let mut chain = mined_chain();
        chain.blocks[0].created_at = 0;
        assert!(!chain.blocks[0].has_consistent_fingerprint());
        assert!(chain.is_valid());
    }
}
