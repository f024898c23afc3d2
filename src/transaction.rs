//! Pending and sealed transactions

use serde::{Deserialize, Serialize};

/// Sender value reserved for the mining reward: coin minted by this node.
pub const COINBASE_SENDER: &str = "0";

/// Amount credited to the miner for every sealed block.
pub const MINING_REWARD: f64 = 1.0;

/// A value transfer waiting in the pool or sealed into a block.
///
/// Nothing about the parties or the amount is checked; the ledger only
/// records what it is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    #[serde(with = "amount_serde")]
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: f64) -> Self {
        Transaction {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// The reward a miner pays itself for sealing a block.
    pub fn coinbase(beneficiary: impl Into<String>) -> Self {
        Self::new(COINBASE_SENDER, beneficiary, MINING_REWARD)
    }

    pub fn is_coinbase(&self) -> bool {
        self.sender == COINBASE_SENDER
    }
}

/// JSON has no literal for NaN or the infinities, and `serde_json` would write
/// all three as `null`. Non-finite amounts are written as the strings
/// `"NaN"`, `"Infinity"` and `"-Infinity"` instead, so every amount survives
/// the wire and hashes to its own digest.
mod amount_serde {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    const NAN: &str = "NaN";
    const INFINITY: &str = "Infinity";
    const NEG_INFINITY: &str = "-Infinity";

    pub fn serialize<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if amount.is_nan() {
            serializer.serialize_str(NAN)
        } else if amount.is_infinite() {
            serializer.serialize_str(if *amount > 0.0 { INFINITY } else { NEG_INFINITY })
        } else {
            serializer.serialize_f64(*amount)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a number, \"{}\", \"{}\" or \"{}\"", NAN, INFINITY, NEG_INFINITY)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }
}
