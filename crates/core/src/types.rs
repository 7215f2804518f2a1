use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 32-byte recipient identity (an ed25519 public key on Solana)
pub type PublicKey = [u8; 32];

/// 32-byte digest: a leaf, an internal node, or the root
pub type Hash = [u8; 32];

/// Digest used for leaves and internal nodes.
///
/// The algorithm is part of the commitment. A root built with one
/// algorithm only verifies against proofs folded with the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Keccak-256 (pre-NIST padding), matching `solana_program::keccak::hashv`
    #[default]
    Keccak256,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keccak256 => "keccak256",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keccak256" | "keccak" => Ok(Self::Keccak256),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("unknown hash algorithm: {}", other)),
        }
    }
}

/// What to do when a recipient appears in more than one list record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Sum the amounts into one entitlement
    #[default]
    Sum,
    /// Fail with `DuplicateRecipient`
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown duplicate policy: {}", other)),
        }
    }
}

/// A single raw entitlement: `amount` owed to `recipient`.
///
/// The same recipient may appear in many records; the aggregator
/// collapses them into one entry per recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementRecord {
    pub recipient: PublicKey,
    pub amount: u64,
}

impl EntitlementRecord {
    pub fn new(recipient: PublicKey, amount: u64) -> Self {
        Self { recipient, amount }
    }
}
