//! Merkledrop Core Types
//!
//! This crate defines the fundamental data structures shared by the
//! Merkledrop prover, aggregator and tooling: identities, digests, the
//! hash algorithm selector, textual codecs and the workspace error type.

pub mod codec;
mod error;
mod types;

pub use codec::{
    encode_hash, encode_hash_prefixed, encode_pubkey, parse_amount, parse_hash, parse_pubkey,
};
pub use error::*;
pub use types::*;
