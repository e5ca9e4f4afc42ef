// Thin re-export module: the implementation lives in `blockchain/core.rs`,
// split by concern (blocks and the chain, balances, validation).

pub mod core;
pub use core::*;
