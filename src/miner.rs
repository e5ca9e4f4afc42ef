//! Proof-of-work puzzle search
//!
//! A block's fingerprint is `sha256(prefix ‖ decimal(counter))`, where the
//! prefix covers every field except the puzzle counter. The search hashes the
//! prefix once and clones that hasher state for each candidate counter.
//!
//! With one worker the search is the plain increment-and-rehash loop. With
//! several, worker `i` of `n` walks counters `start + 1 + i`, `+ n`, `+ 2n`, …
//! so no two workers ever try the same counter. The first solution sent over
//! the channel wins and a shared stop flag retires the rest.

use crate::blockchain::Block;
use crate::crypto::meets_difficulty;
use crate::error::{ChainError, Result};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// How many attempts a worker makes between looks at the stop flag,
/// the cancel token and the attempt budget.
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Cloneable flag used to abort a running search from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Search parameters. The default is a single unbounded, uncancellable worker.
#[derive(Debug, Clone)]
pub struct MiningOptions {
    /// Worker threads; `0` means one per available core.
    pub threads: usize,
    /// Give up after this many hash evaluations. Approximate when `threads > 1`:
    /// workers account in steps of [`CANCEL_CHECK_INTERVAL`].
    pub max_attempts: Option<u64>,
    pub cancel: Option<CancelToken>,
}

impl Default for MiningOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            max_attempts: None,
            cancel: None,
        }
    }
}

impl MiningOptions {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn worker_count(&self) -> usize {
        match self.threads {
            0 => thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// A counter whose fingerprint satisfies the difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub puzzle_counter: u64,
    pub fingerprint: String,
    /// Hash evaluations spent across all workers.
    pub attempts: u64,
}

/// Summary of one completed mining run.
#[derive(Debug, Clone)]
pub struct MiningReport {
    pub fingerprint: String,
    pub puzzle_counter: u64,
    pub attempts: u64,
    pub workers: usize,
    pub elapsed: Duration,
}

impl MiningReport {
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }
}

fn digest_for(base: &Sha256, counter: u64) -> String {
    hex::encode(base.clone().chain_update(counter.to_string().as_bytes()).finalize())
}

/// Search counters after `start_counter` for a fingerprint with `difficulty`
/// leading zero hex digits.
///
/// The caller is expected to have checked `start_counter` itself; the search
/// begins at the next counter.
pub fn solve(prefix: &[u8], start_counter: u64, difficulty: u32, options: &MiningOptions) -> Result<Solution> {
    let base = Sha256::new().chain_update(prefix);
    let workers = options.worker_count();
    debug!(difficulty, workers, "Starting puzzle search");

    let outcome = if workers <= 1 {
        solve_sequential(&base, start_counter, difficulty, options)
    } else {
        solve_parallel(&base, start_counter, difficulty, workers, options)
    };

    if let Err(e) = &outcome {
        warn!("Puzzle search aborted: {}", e);
    }
    outcome
}

fn solve_sequential(base: &Sha256, start_counter: u64, difficulty: u32, options: &MiningOptions) -> Result<Solution> {
    let mut counter = start_counter;
    let mut attempts = 0u64;

    loop {
        if options.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(ChainError::MiningExhausted { attempts });
        }
        if attempts % CANCEL_CHECK_INTERVAL == 0 && options.is_cancelled() {
            return Err(ChainError::MiningCancelled);
        }

        counter = counter.wrapping_add(1);
        attempts += 1;
        let fingerprint = digest_for(base, counter);
        if meets_difficulty(&fingerprint, difficulty) {
            return Ok(Solution {
                puzzle_counter: counter,
                fingerprint,
                attempts,
            });
        }
    }
}

fn solve_parallel(
    base: &Sha256,
    start_counter: u64,
    difficulty: u32,
    workers: usize,
    options: &MiningOptions,
) -> Result<Solution> {
    let stop = AtomicBool::new(false);
    let total_attempts = AtomicU64::new(0);
    let (tx, rx) = crossbeam_channel::bounded::<(u64, String)>(workers);
    let stride = workers as u64;

    thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            let stop = &stop;
            let total_attempts = &total_attempts;

            scope.spawn(move || {
                let mut counter = start_counter.wrapping_add(1 + worker as u64);
                let mut unflushed = 0u64;

                loop {
                    if unflushed % CANCEL_CHECK_INTERVAL == 0 {
                        let seen = total_attempts.fetch_add(unflushed, Ordering::Relaxed) + unflushed;
                        unflushed = 0;
                        if stop.load(Ordering::Relaxed) || options.is_cancelled() {
                            break;
                        }
                        if options.max_attempts.is_some_and(|max| seen >= max) {
                            stop.store(true, Ordering::Relaxed);
                            break;
                        }
                    }

                    unflushed += 1;
                    let fingerprint = digest_for(base, counter);
                    if meets_difficulty(&fingerprint, difficulty) {
                        stop.store(true, Ordering::Relaxed);
                        let _ = tx.try_send((counter, fingerprint));
                        break;
                    }
                    counter = counter.wrapping_add(stride);
                }

                total_attempts.fetch_add(unflushed, Ordering::Relaxed);
            });
        }
    });
    drop(tx);

    let attempts = total_attempts.load(Ordering::Relaxed);
    match rx.try_recv() {
        Ok((puzzle_counter, fingerprint)) => Ok(Solution {
            puzzle_counter,
            fingerprint,
            attempts,
        }),
        Err(_) if options.is_cancelled() => Err(ChainError::MiningCancelled),
        Err(_) => Err(ChainError::MiningExhausted { attempts }),
    }
}

/// Mine `block` in place at `difficulty` and hand it back with its report.
pub fn mine_block(mut block: Block, difficulty: u32, options: &MiningOptions) -> Result<(Block, MiningReport)> {
    let report = block.mine_with(difficulty, options)?;
    Ok((block, report))
}
