//! Hashing primitives for LedgerChain

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Hash the concatenation of `parts` with SHA-256 and return lowercase hex.
pub fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Number of leading `'0'` characters in a hex fingerprint.
pub fn leading_zero_digits(fingerprint: &str) -> usize {
    fingerprint.bytes().take_while(|b| *b == b'0').count()
}

/// True when the first `difficulty` hex characters are all `'0'`.
///
/// A difficulty of zero is always satisfied. A difficulty longer than the
/// fingerprint can never be.
pub fn meets_difficulty(fingerprint: &str, difficulty: u32) -> bool {
    leading_zero_digits(fingerprint) >= difficulty as usize
}
