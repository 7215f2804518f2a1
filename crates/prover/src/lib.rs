//! Merkledrop Prover
//!
//! Sorted-pair binary Merkle tree over entitlement leaves.
//!
//! The aggregator builds one `MerkleTree` per distribution and extracts
//! a proof for every recipient. Anyone holding a claim and the published
//! root can check it with [`verify_proof`] without the tree itself.
//! Pair hashing sorts its two inputs first, so proofs carry no
//! left/right flags.

pub mod hasher;
pub mod merkle;

pub use hasher::{combine, combine_pair, merkle_leaf, Hasher};
pub use merkle::{verify_proof, MerkleProof, MerkleTree};
