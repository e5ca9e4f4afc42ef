use crate::config::LedgerConfig;
use crate::crypto::{meets_difficulty, sha256_hex, FINGERPRINT_HEX_LEN};
use crate::error::{ChainError, Result};
use crate::miner::{self, MiningOptions, MiningReport};
use crate::transaction::Transfer;
use std::time::Instant;
use tracing::{debug, info};

/// Previous-fingerprint placeholder carried by the genesis block.
pub const GENESIS_PREVIOUS_FINGERPRINT: &str = "0";
/// 2017-01-01T00:00:00Z in milliseconds.
pub const GENESIS_TIMESTAMP: i64 = 1_483_228_800_000;

pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const DEFAULT_MINING_REWARD: f64 = 100.0;

/// A batch of transfers sealed by a fingerprint.
///
/// Fields are only writable inside the crate. Callers receive blocks from
/// [`Blockchain`] as shared references, so a committed block cannot be
/// altered through the public API.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub(crate) previous_fingerprint: String,
    pub(crate) created_at: i64,
    pub(crate) records: Vec<Transfer>,
    pub(crate) fingerprint: String,
    pub(crate) puzzle_counter: u64,
}

impl Block {
    /// Build a block with a zero puzzle counter and its fingerprint already set.
    pub fn new(created_at: i64, records: Vec<Transfer>, previous_fingerprint: impl Into<String>) -> Result<Self> {
        let mut block = Block {
            previous_fingerprint: previous_fingerprint.into(),
            created_at,
            records,
            fingerprint: String::new(),
            puzzle_counter: 0,
        };
        block.fingerprint = block.compute_fingerprint()?;
        Ok(block)
    }

    /// The fixed first block: no records, sentinel link, fixed timestamp. Not mined.
    pub fn genesis() -> Result<Self> {
        Block::new(GENESIS_TIMESTAMP, Vec::new(), GENESIS_PREVIOUS_FINGERPRINT)
    }

    pub fn previous_fingerprint(&self) -> &str {
        &self.previous_fingerprint
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn records(&self) -> &[Transfer] {
        &self.records
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn puzzle_counter(&self) -> u64 {
        self.puzzle_counter
    }

    /// Everything hashed ahead of the puzzle counter:
    /// `previous_fingerprint ‖ decimal(created_at) ‖ JSON(records)`.
    pub(crate) fn encode_prefix(&self) -> Result<Vec<u8>> {
        let records = serde_json::to_vec(&self.records)?;
        let created_at = self.created_at.to_string();

        let mut buf = Vec::with_capacity(self.previous_fingerprint.len() + created_at.len() + records.len());
        buf.extend_from_slice(self.previous_fingerprint.as_bytes());
        buf.extend_from_slice(created_at.as_bytes());
        buf.extend_from_slice(&records);
        Ok(buf)
    }

    /// Recompute the fingerprint from the current fields. Does not store it.
    pub fn compute_fingerprint(&self) -> Result<String> {
        let prefix = self.encode_prefix()?;
        Ok(sha256_hex(&[prefix.as_slice(), self.puzzle_counter.to_string().as_bytes()]))
    }

    /// True when the stored fingerprint matches a fresh recomputation.
    pub fn has_consistent_fingerprint(&self) -> bool {
        self.compute_fingerprint()
            .map(|fp| fp == self.fingerprint)
            .unwrap_or(false)
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        meets_difficulty(&self.fingerprint, difficulty)
    }

    /// Search until the fingerprint has `difficulty` leading zero hex digits.
    ///
    /// Blocks the caller with no bound on the number of attempts.
    pub fn mine(&mut self, difficulty: u32) -> Result<MiningReport> {
        self.mine_with(difficulty, &MiningOptions::default())
    }

    /// Like [`Block::mine`], with worker threads, an attempt cap or a cancel
    /// token taken from `options`. On error the block is left as it was.
    pub fn mine_with(&mut self, difficulty: u32, options: &MiningOptions) -> Result<MiningReport> {
        if difficulty as usize > FINGERPRINT_HEX_LEN {
            return Err(ChainError::UnreachableDifficulty(difficulty));
        }

        let started = Instant::now();
        let workers = options.worker_count();

        if self.meets_difficulty(difficulty) {
            info!("Block mined: {} (no search needed)", self.fingerprint);
            return Ok(MiningReport {
                fingerprint: self.fingerprint.clone(),
                puzzle_counter: self.puzzle_counter,
                attempts: 0,
                workers,
                elapsed: started.elapsed(),
            });
        }

        let prefix = self.encode_prefix()?;
        let solution = miner::solve(&prefix, self.puzzle_counter, difficulty, options)?;

        self.puzzle_counter = solution.puzzle_counter;
        self.fingerprint = self.compute_fingerprint()?;
        debug_assert_eq!(self.fingerprint, solution.fingerprint);

        info!("Block mined: {}", self.fingerprint);
        Ok(MiningReport {
            fingerprint: self.fingerprint.clone(),
            puzzle_counter: self.puzzle_counter,
            attempts: solution.attempts,
            workers,
            elapsed: started.elapsed(),
        })
    }
}

/// The ledger: an append-only chain of mined blocks plus the staging buffer
/// of transfers waiting for the next block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub(crate) blocks: Vec<Block>,
    pub(crate) pending: Vec<Transfer>,
    difficulty: u32,
    mining_reward: f64,
    mining: MiningOptions,
}

impl Blockchain {
    /// Ledger with the default difficulty and reward.
    pub fn new() -> Result<Self> {
        Self::with_params(DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD)
    }

    pub fn with_params(difficulty: u32, mining_reward: f64) -> Result<Self> {
        let genesis = Block::genesis()?;
        info!(
            difficulty,
            mining_reward, "Created ledger with genesis block {}", genesis.fingerprint
        );

        Ok(Blockchain {
            blocks: vec![genesis],
            pending: Vec::new(),
            difficulty,
            mining_reward,
            mining: MiningOptions::default(),
        })
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        config.validate()?;
        let mut chain = Self::with_params(config.difficulty, config.mining_reward)?;
        chain.set_mining_options(config.miner.mining_options());
        Ok(chain)
    }

    pub fn set_mining_options(&mut self, options: MiningOptions) {
        self.mining = options;
    }

    pub fn mining_options(&self) -> &MiningOptions {
        &self.mining
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mining_reward(&self) -> f64 {
        self.mining_reward
    }

    /// Committed blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false for a ledger built through this API.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Transfers accepted but not yet sealed into a block.
    pub fn pending_transactions(&self) -> &[Transfer] {
        &self.pending
    }

    pub fn latest_block(&self) -> Result<&Block> {
        self.blocks.last().ok_or(ChainError::EmptyChain)
    }

    /// Stage a transfer for the next block. No balance or signature checks.
    pub fn submit_transfer(&mut self, transfer: Transfer) {
        debug!(
            source = ?transfer.source(),
            destination = transfer.destination(),
            amount = transfer.amount(),
            "Staged transfer"
        );
        self.pending.push(transfer);
    }

    /// Seal the staging buffer into a new block, mine it and append it.
    ///
    /// Afterwards the staging buffer holds only the reward for
    /// `reward_address`, which becomes spendable once the next block is
    /// mined. If mining fails, the chain and the staging buffer are unchanged.
    /// The new block is available from [`Blockchain::latest_block`].
    pub fn mine_pending(&mut self, reward_address: &str) -> Result<MiningReport> {
        let previous = self.latest_block()?.fingerprint.clone();
        let created_at = chrono::Utc::now().timestamp_millis();
        let mut block = Block::new(created_at, self.pending.clone(), previous)?;

        let report = block.mine_with(self.difficulty, &self.mining)?;
        debug!(
            height = self.blocks.len(),
            attempts = report.attempts,
            workers = report.workers,
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Appending mined block"
        );

        self.blocks.push(block);
        self.pending = vec![Transfer::reward(reward_address, self.mining_reward)];
        debug!(reward_address, reward = self.mining_reward, "Queued mining reward");

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::CancelToken;

    #[test]
    fn test_new_block_has_zero_counter_and_consistent_fingerprint() {
        let block = Block::new(1, vec![Transfer::new("a", "b", 1.0)], "abc").unwrap();
        assert_eq!(block.puzzle_counter(), 0);
        assert_eq!(block.fingerprint().len(), FINGERPRINT_HEX_LEN);
        assert!(block.has_consistent_fingerprint());
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let records = vec![Transfer::new("a", "b", 1.0), Transfer::reward("m", 100.0)];
        let first = Block::new(42, records.clone(), "prev").unwrap();
        let second = Block::new(42, records, "prev").unwrap();
        assert_eq!(first.compute_fingerprint().unwrap(), first.compute_fingerprint().unwrap());
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_fingerprint_encoding_matches_concatenation() {
        let block = Block::new(7, vec![Transfer::new("a", "b", 2.5)], "p").unwrap();
        let encoded = r#"p7[{"source":"a","destination":"b","amount":2.5}]0"#;
        let expected = sha256_hex(&[encoded.as_bytes()]);
        assert_eq!(block.fingerprint(), expected);
    }

    #[test]
    fn test_fingerprint_depends_on_record_order() {
        let a = Transfer::new("a", "b", 1.0);
        let b = Transfer::new("b", "a", 1.0);
        let forward = Block::new(0, vec![a.clone(), b.clone()], "0").unwrap();
        let reversed = Block::new(0, vec![b, a], "0").unwrap();
        assert_ne!(forward.fingerprint(), reversed.fingerprint());
    }

    #[test]
    fn test_mine_meets_difficulty() {
        let mut block = Block::new(5, vec![Transfer::new("a", "b", 3.0)], "prev").unwrap();
        let report = block.mine(2).unwrap();
        assert!(block.fingerprint().starts_with("00"));
        assert!(block.has_consistent_fingerprint());
        assert_eq!(report.fingerprint, block.fingerprint());
        assert_eq!(report.puzzle_counter, block.puzzle_counter());
    }

    #[test]
    fn test_mine_with_zero_difficulty_does_not_iterate() {
        let mut block = Block::new(5, Vec::new(), "prev").unwrap();
        let before = block.fingerprint().to_string();
        let report = block.mine(0).unwrap();
        assert_eq!(block.puzzle_counter(), 0);
        assert_eq!(report.attempts, 0);
        assert_eq!(block.fingerprint(), before);
    }

    #[test]
    fn test_parallel_mining_produces_verifiable_block() {
        let mut block = Block::new(9, vec![Transfer::new("x", "y", 1.0)], "prev").unwrap();
        let report = block.mine_with(3, &MiningOptions::default().with_threads(4)).unwrap();
        assert!(block.fingerprint().starts_with("000"));
        assert!(block.has_consistent_fingerprint());
        assert_eq!(report.workers, 4);
    }

    #[test]
    fn test_failed_mining_leaves_block_untouched() {
        let mut block = Block::new(9, Vec::new(), "prev").unwrap();
        let before = block.clone();
        let outcome = block.mine_with(40, &MiningOptions::default().with_max_attempts(100));
        assert!(matches!(outcome, Err(ChainError::MiningExhausted { attempts: 100 })));
        assert_eq!(block, before);
    }

    #[test]
    fn test_unreachable_difficulty_is_rejected() {
        let mut block = Block::genesis().unwrap();
        assert!(matches!(block.mine(65), Err(ChainError::UnreachableDifficulty(65))));
    }

    #[test]
    fn test_genesis_is_reproducible() {
        let genesis = Block::genesis().unwrap();
        assert_eq!(genesis, Block::genesis().unwrap());
        assert_eq!(genesis.previous_fingerprint(), GENESIS_PREVIOUS_FINGERPRINT);
        assert_eq!(genesis.created_at(), GENESIS_TIMESTAMP);
        assert!(genesis.records().is_empty());
    }

    #[test]
    fn test_new_ledger_defaults() {
        let chain = Blockchain::new().unwrap();
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        assert!(chain.pending_transactions().is_empty());
        assert_eq!(chain.difficulty(), DEFAULT_DIFFICULTY);
        assert_eq!(chain.mining_reward(), DEFAULT_MINING_REWARD);
        assert_eq!(chain.latest_block().unwrap(), &Block::genesis().unwrap());
    }

    #[test]
    fn test_mine_pending_links_and_resets_staging() {
        let mut chain = Blockchain::with_params(1, 25.0).unwrap();
        chain.submit_transfer(Transfer::new("a", "b", 10.0));
        chain.submit_transfer(Transfer::new("b", "a", 4.0));

        let genesis_fp = chain.latest_block().unwrap().fingerprint().to_string();
        let report = chain.mine_pending("miner").unwrap();
        let block = chain.latest_block().unwrap();

        assert_eq!(block.previous_fingerprint(), genesis_fp);
        assert_eq!(block.records().len(), 2);
        assert!(block.meets_difficulty(1));
        assert_eq!(report.fingerprint, block.fingerprint());
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.pending_transactions(), &[Transfer::reward("miner", 25.0)]);
    }

    #[test]
    fn test_mine_pending_with_empty_staging() {
        let mut chain = Blockchain::with_params(0, 1.0).unwrap();
        chain.mine_pending("m").unwrap();
        assert!(chain.latest_block().unwrap().records().is_empty());
        assert_eq!(chain.pending_transactions().len(), 1);
    }

    #[test]
    fn test_cancelled_mine_pending_keeps_state() {
        let token = CancelToken::new();
        token.cancel();
        let mut chain = Blockchain::with_params(8, 100.0).unwrap();
        chain.set_mining_options(MiningOptions::default().with_cancel(token));
        chain.submit_transfer(Transfer::new("a", "b", 1.0));

        assert!(matches!(chain.mine_pending("m"), Err(ChainError::MiningCancelled)));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.pending_transactions(), &[Transfer::new("a", "b", 1.0)]);
    }
}
