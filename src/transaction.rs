//! Transfer records carried by blocks

pub mod types;

pub use types::*;
