use crate::transaction::{Address, Transfer};
use std::collections::BTreeMap;

use super::chain::Blockchain;

/// A confirmed transfer together with the index of the block that holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub block_index: usize,
    pub transfer: Transfer,
}

impl Blockchain {
    /// Confirmed transfers in chain order. Staged transfers are not included.
    pub fn confirmed_transfers(&self) -> impl Iterator<Item = (usize, &Transfer)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(index, block)| block.records.iter().map(move |tx| (index, tx)))
    }

    /// Net confirmed balance of `address`. May be negative: overdrafts are
    /// never rejected.
    pub fn balance_of(&self, address: &str) -> f64 {
        self.confirmed_transfers()
            .fold(0.0, |balance, (_, tx)| balance + tx.delta_for(address))
    }

    /// Confirmed balance of every address that appears in the chain.
    pub fn balances(&self) -> BTreeMap<Address, f64> {
        let mut sheet: BTreeMap<Address, f64> = BTreeMap::new();
        for (_, tx) in self.confirmed_transfers() {
            if let Some(source) = tx.source() {
                *sheet.entry(source.to_string()).or_insert(0.0) -= tx.amount();
            }
            *sheet.entry(tx.destination().to_string()).or_insert(0.0) += tx.amount();
        }
        sheet
    }

    /// Confirmed transfers sent or received by `address`, oldest first.
    pub fn history_of(&self, address: &str) -> Vec<HistoryEntry> {
        self.confirmed_transfers()
            .filter(|(_, tx)| tx.involves(address))
            .map(|(block_index, tx)| HistoryEntry {
                block_index,
                transfer: tx.clone(),
            })
            .collect()
    }
}
