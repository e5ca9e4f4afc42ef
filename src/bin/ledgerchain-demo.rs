#![forbid(unsafe_code)]
//! Demonstration driver: two transfers, two mining rounds, balances and validity.

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use ledgerchain::blockchain::Blockchain;
use ledgerchain::config::{load_config_from, DEFAULT_CONFIG_FILE};
use ledgerchain::miner::MiningReport;
use ledgerchain::transaction::Transfer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Required leading zero hex digits per block
    #[arg(long)]
    difficulty: Option<u32>,

    /// Reward issued to the miner per block
    #[arg(long)]
    reward: Option<f64>,

    /// Mining worker threads (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Address that receives mining rewards
    #[arg(long)]
    miner: Option<String>,
}

fn print_round(round: u32, chain: &Blockchain, miner: &str, report: &MiningReport) {
    println!("{}", format!("⛏️  Round {}", round).bright_cyan().bold());
    println!("  Fingerprint:  {}", report.fingerprint.bright_white());
    println!("  Counter:      {}", report.puzzle_counter);
    println!(
        "  Attempts:     {} in {:.3}s ({:.0} H/s, {} worker(s))",
        report.attempts,
        report.elapsed.as_secs_f64(),
        report.hash_rate(),
        report.workers
    );
    println!("  Chain length: {}", chain.len());
    println!("  Balance of {}: {}", miner.yellow(), chain.balance_of(miner));
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = load_config_from(&cli.config)?;
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(reward) = cli.reward {
        config.mining_reward = reward;
    }
    if let Some(threads) = cli.threads {
        config.miner.threads = threads;
    }
    if let Some(miner) = cli.miner {
        config.miner.beneficiary_address = miner;
    }

    let mut chain = Blockchain::from_config(&config)?;
    let miner = config.miner.beneficiary_address.clone();

    println!("{}", "LedgerChain demo".bright_cyan().bold());
    println!("{}", "----------------".bright_cyan());
    println!(
        "Difficulty {}, reward {}, miner {}\n",
        chain.difficulty(),
        chain.mining_reward(),
        miner.yellow()
    );

    chain.submit_transfer(Transfer::new("address1", "address2", 100.0));
    chain.submit_transfer(Transfer::new("address2", "address1", 50.0));

    // The reward for round 1 is only confirmed by round 2.
    for round in 1..=2 {
        let report = chain.mine_pending(&miner)?;
        print_round(round, &chain, &miner, &report);
    }

    println!("{}", "Balances".bright_green().underline());
    for (address, balance) in chain.balances() {
        println!("  {:<16} {}", address, balance);
    }
    println!();

    if chain.is_valid() {
        println!("{}", "Chain is valid".bright_green().bold());
    } else {
        println!("{}", "Chain is INVALID".bright_red().bold());
        for fault in chain.validate_chain() {
            println!("  - {}", fault);
        }
    }

    Ok(())
}
