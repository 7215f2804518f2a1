//! Leaf encoding and commutative pair hashing.
//!
//! Leaf formula: `H(index_le_u64 || recipient || amount_le_u64)`.
//! Internal nodes: `H(min(a, b) || max(a, b))`, byte-lexicographic.
//!
//! Both formulas MUST match the on-chain distributor, which rebuilds
//! the leaf with `keccak::hashv` and folds the proof with the same
//! sort-then-hash rule.

use sha2::Sha256;
use sha3::{Digest, Keccak256};

use merkledrop_core::{Hash, HashAlgorithm, MerkledropError, PublicKey, Result};

/// Hash primitive bound to one [`HashAlgorithm`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the concatenation of `parts`.
    pub fn hashv(&self, parts: &[&[u8]]) -> Hash {
        match self.algorithm {
            HashAlgorithm::Keccak256 => digest_parts::<Keccak256>(parts),
            HashAlgorithm::Sha256 => digest_parts::<Sha256>(parts),
        }
    }

    /// Encode one entitlement as a leaf.
    pub fn leaf(&self, index: u64, recipient: &PublicKey, amount: u64) -> Hash {
        self.hashv(&[&index.to_le_bytes(), recipient, &amount.to_le_bytes()])
    }

    /// Hash two nodes in ascending byte order. `combine(a, b) == combine(b, a)`.
    pub fn combine(&self, a: &Hash, b: &Hash) -> Hash {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.hashv(&[lo, hi])
    }

    /// Combine `first` with an optional partner. A missing partner is the
    /// trailing odd node of a layer, promoted unchanged.
    pub fn combine_pair(&self, first: &Hash, second: Option<&Hash>) -> Hash {
        match second {
            Some(second) => self.combine(first, second),
            None => *first,
        }
    }

    /// Combine where either side may be absent. Both absent is an error.
    pub fn combine_optional(&self, first: Option<&Hash>, second: Option<&Hash>) -> Result<Hash> {
        match (first, second) {
            (Some(a), Some(b)) => Ok(self.combine(a, b)),
            (Some(only), None) | (None, Some(only)) => Ok(*only),
            (None, None) => Err(MerkledropError::MissingPair),
        }
    }
}

fn digest_parts<D: Digest>(parts: &[&[u8]]) -> Hash {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Leaf hash with the default algorithm (Keccak-256).
pub fn merkle_leaf(index: u64, recipient: &PublicKey, amount: u64) -> Hash {
    Hasher::default().leaf(index, recipient, amount)
}

/// Commutative pair hash with the default algorithm (Keccak-256).
pub fn combine(a: &Hash, b: &Hash) -> Hash {
    Hasher::default().combine(a, b)
}

/// [`Hasher::combine_pair`] with the default algorithm.
pub fn combine_pair(first: &Hash, second: Option<&Hash>) -> Hash {
    Hasher::default().combine_pair(first, second)
}
