//! Binary Merkle tree for distribution proofs.
//!
//! Leaves are sorted and deduplicated before layering, so the root
//! depends only on the set of leaves. Each layer pairs nodes left to
//! right; a trailing unpaired node is promoted unchanged (no padding).

use std::collections::HashMap;

use tracing::debug;

use merkledrop_core::{encode_hash, Hash, MerkledropError, PublicKey, Result};

use crate::hasher::Hasher;

/// Sibling hashes from the leaf level up to just below the root.
///
/// Levels where the leaf's ancestor was the unpaired trailing node
/// contribute no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerkleProof {
    pub siblings: Vec<Hash>,
}

impl MerkleProof {
    pub fn new(siblings: Vec<Hash>) -> Self {
        Self { siblings }
    }

    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Fold the proof onto `leaf`, returning the implied root.
    pub fn compute_root(&self, hasher: &Hasher, leaf: &Hash) -> Hash {
        self.siblings
            .iter()
            .fold(*leaf, |acc, sibling| hasher.combine(&acc, sibling))
    }
}

/// A binary Merkle tree. Immutable once built.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    hasher: Hasher,
    /// Leaf value → position in `layers[0]`.
    positions: HashMap<Hash, usize>,
    /// All nodes stored level by level, bottom-up. `layers[0]` = sorted
    /// unique leaves, last layer = `[root]`.
    layers: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree with the default hasher (Keccak-256).
    pub fn build(leaves: Vec<Hash>) -> Result<Self> {
        Self::build_with(Hasher::default(), leaves)
    }

    /// Build a tree from pre-hashed leaves.
    ///
    /// Input order does not matter and duplicate leaves are dropped.
    /// Fails with `EmptyTree` when `leaves` is empty.
    pub fn build_with(hasher: Hasher, mut leaves: Vec<Hash>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(MerkledropError::EmptyTree);
        }

        let input_len = leaves.len();
        leaves.sort_unstable();
        // Equal leaves are adjacent after sorting
        leaves.dedup();

        let positions = leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| (*leaf, i))
            .collect::<HashMap<_, _>>();

        let mut layers = vec![leaves];
        loop {
            let prev = &layers[layers.len() - 1];
            if prev.len() <= 1 {
                break;
            }
            let next_layer = Self::next_layer(&hasher, prev);
            layers.push(next_layer);
        }

        debug!(
            "Built {} Merkle tree: {} leaves ({} duplicates dropped), {} layers",
            hasher.algorithm(),
            layers[0].len(),
            input_len - layers[0].len(),
            layers.len(),
        );

        Ok(Self {
            hasher,
            positions,
            layers,
        })
    }

    /// Build a tree from an ordered balance list. Each entry's position
    /// in `balances` becomes its leaf index.
    pub fn from_balances(hasher: Hasher, balances: &[(PublicKey, u64)]) -> Result<Self> {
        let leaves = balances
            .iter()
            .enumerate()
            .map(|(index, (recipient, amount))| hasher.leaf(index as u64, recipient, *amount))
            .collect();
        Self::build_with(hasher, leaves)
    }

    fn next_layer(hasher: &Hasher, prev: &[Hash]) -> Vec<Hash> {
        prev.chunks(2)
            .map(|pair| hasher.combine_pair(&pair[0], pair.get(1)))
            .collect()
    }

    /// Get the Merkle root.
    pub fn root(&self) -> Hash {
        self.layers[self.layers.len() - 1][0]
    }

    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// Sorted, deduplicated leaves.
    pub fn leaves(&self) -> &[Hash] {
        &self.layers[0]
    }

    /// Number of unique leaves.
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of layers above the leaves. Zero for a single-leaf tree.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn layers(&self) -> &[Vec<Hash>] {
        &self.layers
    }

    pub fn contains(&self, leaf: &Hash) -> bool {
        self.positions.contains_key(leaf)
    }

    /// Generate a proof for a leaf value.
    ///
    /// Fails with `LeafNotFound` if the leaf was never inserted.
    pub fn proof(&self, leaf: &Hash) -> Result<MerkleProof> {
        let mut idx = *self
            .positions
            .get(leaf)
            .ok_or_else(|| MerkledropError::LeafNotFound(encode_hash(leaf)))?;

        let mut siblings = Vec::with_capacity(self.depth());
        for layer in &self.layers[..self.layers.len() - 1] {
            if let Some(sibling) = layer.get(idx ^ 1) {
                siblings.push(*sibling);
            }
            idx /= 2;
        }

        Ok(MerkleProof { siblings })
    }

    /// Generate a proof for an entitlement, encoding its leaf first.
    pub fn proof_for(&self, index: u64, recipient: &PublicKey, amount: u64) -> Result<MerkleProof> {
        self.proof(&self.hasher.leaf(index, recipient, amount))
    }

    /// Verify a proof for a leaf hash against a root.
    pub fn verify(hasher: &Hasher, root: &Hash, leaf: &Hash, proof: &MerkleProof) -> bool {
        proof.compute_root(hasher, leaf) == *root
    }
}

/// Check an entitlement against a published root.
///
/// Rebuilds the leaf from `(index, recipient, amount)` and folds
/// `proof` onto it. Never fails: a malformed, truncated or padded proof
/// yields a different root and so `false`.
pub fn verify_proof(
    hasher: &Hasher,
    index: u64,
    recipient: &PublicKey,
    amount: u64,
    proof: &[Hash],
    root: &Hash,
) -> bool {
    let leaf = hasher.leaf(index, recipient, amount);
    let computed = proof
        .iter()
        .fold(leaf, |acc, sibling| hasher.combine(&acc, sibling));
    computed == *root
}
