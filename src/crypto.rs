//! Cryptographic primitives for Proofchain
//!
//! SHA-256 digests for the proof-of-work puzzle and the canonical block hash,
//! and random version-4 identifiers for nodes.

use crate::error::ChainError;
use rand::rngs::OsRng;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of random bytes in a node identifier.
pub const NODE_ID_BYTES: usize = 16;

/// Length of the hyphenated textual form (32 hex digits + 4 hyphens).
const NODE_ID_TEXT_LEN: usize = 36;

/// Hyphen-separated group lengths, in bytes: 4-2-2-2-6.
const NODE_ID_GROUPS: [usize; 5] = [4, 2, 2, 2, 6];

/// Compute a SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied to the raw bytes of a first SHA-256 digest.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute a SHA-256 digest and return it as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// A random (version-4, RFC 4122 variant) identifier in its canonical
/// `8-4-4-4-12` hex form.
///
/// Values only come from [`NodeId::generate`] or from parsing a string that
/// already carries the version and variant markers, so a node can never be
/// registered under an empty or malformed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Draw a fresh identifier from the operating system's RNG.
    pub fn generate() -> Result<Self, ChainError> {
        Self::generate_with(&mut OsRng)
    }

    /// Draw a fresh identifier from the given RNG.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, ChainError> {
        let mut bytes = [0u8; NODE_ID_BYTES];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| ChainError::RandomnessExhausted(e.to_string()))?;
        Ok(Self::from_random_bytes(bytes))
    }

    /// Stamp the version and variant markers onto 16 random bytes.
    pub fn from_random_bytes(mut bytes: [u8; NODE_ID_BYTES]) -> Self {
        // variant 10xx xxxx
        bytes[8] = (bytes[8] & !0xc0) | 0x80;
        // version 0100 xxxx
        bytes[6] = (bytes[6] & !0xf0) | 0x40;

        let mut groups = Vec::with_capacity(NODE_ID_GROUPS.len());
        let mut offset = 0;
        for len in NODE_ID_GROUPS {
            groups.push(hex::encode(&bytes[offset..offset + len]));
            offset += len;
        }
        NodeId(groups.join("-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The version nibble (always 4).
    pub fn version(&self) -> u8 {
        self.byte(6) >> 4
    }

    /// The two variant bits (always `0b10`).
    pub fn variant_bits(&self) -> u8 {
        self.byte(8) >> 6
    }

    fn byte(&self, index: usize) -> u8 {
        let hex_digits: String = self.0.chars().filter(|c| *c != '-').collect();
        let pair = &hex_digits[index * 2..index * 2 + 2];
        // Construction guarantees 32 hex digits.
        u8::from_str_radix(pair, 16).unwrap_or_default()
    }
}

impl TryFrom<String> for NodeId {
    type Error = ChainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() != NODE_ID_TEXT_LEN {
            return Err(ChainError::InvalidNodeId(format!(
                "expected {} characters, got {}",
                NODE_ID_TEXT_LEN,
                value.len()
            )));
        }

        let groups: Vec<&str> = value.split('-').collect();
        let well_formed = groups.len() == NODE_ID_GROUPS.len()
            && groups
                .iter()
                .zip(NODE_ID_GROUPS)
                .all(|(group, len)| group.len() == len * 2);
        if !well_formed {
            return Err(ChainError::InvalidNodeId(format!(
                "{} is not in 8-4-4-4-12 form",
                value
            )));
        }

        let mut bytes = [0u8; NODE_ID_BYTES];
        hex::decode_to_slice(groups.concat(), &mut bytes)
            .map_err(|e| ChainError::InvalidNodeId(format!("{}: {}", value, e)))?;

        if bytes[6] >> 4 != 4 || bytes[8] >> 6 != 0b10 {
            return Err(ChainError::InvalidNodeId(format!(
                "{} is not a version-4 identifier",
                value
            )));
        }

        Ok(NodeId(value.to_ascii_lowercase()))
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
