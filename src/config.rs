//! Configuration management for LedgerChain

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD};
use crate::crypto::FINGERPRINT_HEX_LEN;
use crate::error::{ChainError, Result};
use crate::miner::MiningOptions;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// File read by [`load_config`] from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ledgerchain.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_mining_reward")]
    pub mining_reward: f64,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub max_attempts: Option<u64>,
    #[serde(default = "default_beneficiary_address")]
    pub beneficiary_address: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
            miner: MinerConfig::default(),
        }
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            max_attempts: None,
            beneficiary_address: default_beneficiary_address(),
        }
    }
}

impl MinerConfig {
    pub fn mining_options(&self) -> MiningOptions {
        MiningOptions {
            threads: self.threads,
            max_attempts: self.max_attempts,
            cancel: None,
        }
    }
}

impl LedgerConfig {
    /// Reject values the ledger cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.difficulty as usize > FINGERPRINT_HEX_LEN {
            return Err(ChainError::Config(format!(
                "difficulty must be at most {}, got {}",
                FINGERPRINT_HEX_LEN, self.difficulty
            )));
        }

        if self.miner.beneficiary_address.is_empty() {
            return Err(ChainError::Config("miner.beneficiary_address must not be empty".to_string()));
        }

        Ok(())
    }
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_mining_reward() -> f64 {
    DEFAULT_MINING_REWARD
}

fn default_threads() -> usize {
    1
}

fn default_beneficiary_address() -> String {
    "miner-address".to_string()
}

/// Parse and validate a TOML document.
pub fn parse_config(config_str: &str) -> Result<LedgerConfig> {
    let config: LedgerConfig = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<LedgerConfig> {
    match fs::read_to_string(path.as_ref()) {
        Ok(config_str) => parse_config(&config_str),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(LedgerConfig::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn load_config() -> Result<LedgerConfig> {
    load_config_from(DEFAULT_CONFIG_FILE)
}
