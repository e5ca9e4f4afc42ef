/// Transfer record types for LedgerChain
use serde::{Deserialize, Serialize};

/// Account identifier. Any non-empty string is accepted; no key material is involved.
pub type Address = String;

/// A single movement of value between two addresses.
///
/// `source == None` marks a reward issued by the ledger itself: nothing is
/// deducted from any balance. Field order is part of the block fingerprint
/// encoding and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub(crate) source: Option<Address>,
    pub(crate) destination: Address,
    #[serde(with = "amount_encoding")]
    pub(crate) amount: f64,
}

/// Finite amounts are written as JSON numbers. `serde_json` writes every
/// non-finite float as `null`, which would let `inf`, `-inf` and `NaN` share a
/// fingerprint, so those are written as distinct strings instead.
mod amount_encoding {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if amount.is_finite() {
            serializer.serialize_f64(*amount)
        } else if amount.is_nan() {
            serializer.serialize_str("NaN")
        } else if amount.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(amount) => Ok(amount),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(de::Error::custom(format!("invalid amount: {}", other))),
            },
        }
    }
}

impl Transfer {
    /// Transfer from one address to another. The amount is not checked.
    pub fn new(source: impl Into<Address>, destination: impl Into<Address>, amount: f64) -> Self {
        Transfer {
            source: Some(source.into()),
            destination: destination.into(),
            amount,
        }
    }

    /// Reward issued by the ledger to `destination`.
    pub fn reward(destination: impl Into<Address>, amount: f64) -> Self {
        Transfer {
            source: None,
            destination: destination.into(),
            amount,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn is_reward(&self) -> bool {
        self.source.is_none()
    }

    /// Whether `address` sends or receives in this transfer.
    pub fn involves(&self, address: &str) -> bool {
        self.source() == Some(address) || self.destination == address
    }

    /// Signed effect of this transfer on `address`.
    ///
    /// A self-transfer nets to zero: the amount is both subtracted and added.
    pub fn delta_for(&self, address: &str) -> f64 {
        let mut delta = 0.0;
        if self.source() == Some(address) {
            delta -= self.amount;
        }
        if self.destination == address {
            delta += self.amount;
        }
        delta
    }
}
