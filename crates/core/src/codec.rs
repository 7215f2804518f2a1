//! Textual forms of identities, digests and amounts.
//!
//! - Identities: base58, exactly 32 bytes once decoded.
//! - Digests: lowercase hex in natural byte order (byte 0 first). An
//!   optional `0x` prefix is accepted on input.
//! - Amounts: unsigned decimal strings. JSON integers are accepted on
//!   input through [`amount`].

use crate::{Hash, MerkledropError, PublicKey, Result};

/// Encode an identity as base58.
pub fn encode_pubkey(pubkey: &PublicKey) -> String {
    bs58::encode(pubkey).into_string()
}

/// Decode a base58 identity.
pub fn parse_pubkey(s: &str) -> Result<PublicKey> {
    let bytes = bs58::decode(s.trim())
        .into_vec()
        .map_err(|e| MerkledropError::InvalidPublicKey(format!("{}: {}", s, e)))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        MerkledropError::InvalidPublicKey(format!("{}: expected 32 bytes, got {}", s, b.len()))
    })
}

/// Encode a digest as lowercase hex without prefix.
pub fn encode_hash(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Encode a digest as `0x`-prefixed lowercase hex.
pub fn encode_hash_prefixed(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Decode a 32-byte hex digest, with or without `0x`.
pub fn parse_hash(s: &str) -> Result<Hash> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| MerkledropError::InvalidHash(format!("{}: {}", s, e)))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        MerkledropError::InvalidHash(format!("{}: expected 32 bytes, got {}", s, b.len()))
    })
}

/// Parse an unsigned decimal amount.
///
/// Zero is accepted here; whether a zero total is allowed is decided by
/// the aggregator.
pub fn parse_amount(s: &str) -> Result<u64> {
    let trimmed = s.trim();
    if trimmed.starts_with('-') {
        return Err(MerkledropError::InvalidAmount(format!("negative amount: {}", s)));
    }
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MerkledropError::InvalidAmount(format!("not an unsigned integer: {:?}", s)));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| MerkledropError::InvalidAmount(format!("out of range: {}", s)))
}

/// Serde adapter for `u64` amounts: written as a decimal string, read
/// from either a decimal string or a JSON unsigned integer.
pub mod amount {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an unsigned integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative amount: {}", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
            Err(E::custom(format!("fractional amount: {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            super::parse_amount(v).map_err(E::custom)
        }
    }
}
