//! Raw balance input.
//!
//! Two JSON shapes are accepted:
//!
//! - a list of records, `[{"address": "<base58>", "earnings": "100"}, ...]`
//!   (`authority`/`account` and `amount` are accepted as field aliases);
//! - a map, `{"<base58>": "100", ...}`.
//!
//! Repeated recipients in a list follow the configured
//! [`DuplicatePolicy`]. A key repeated in a map is always an error.

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::info;

use merkledrop_core::{
    codec, parse_pubkey, DuplicatePolicy, EntitlementRecord, MerkledropError, Result,
};

use crate::balance::{aggregate, Aggregate};

/// One record of list-style input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BalanceRecord {
    #[serde(alias = "authority", alias = "account")]
    pub address: String,
    #[serde(alias = "amount", with = "codec::amount")]
    pub earnings: u64,
}

impl BalanceRecord {
    pub fn to_record(&self) -> Result<EntitlementRecord> {
        Ok(EntitlementRecord::new(parse_pubkey(&self.address)?, self.earnings))
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct AmountValue(#[serde(with = "codec::amount")] u64);

/// Map entries in document order, keys possibly repeated.
struct BalanceMap(Vec<(String, u64)>);

impl<'de> Deserialize<'de> for BalanceMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct BalanceMapVisitor;

        impl<'de> Visitor<'de> for BalanceMapVisitor {
            type Value = BalanceMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of address to amount")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<BalanceMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((address, AmountValue(amount))) = access.next_entry::<String, AmountValue>()? {
                    entries.push((address, amount));
                }
                Ok(BalanceMap(entries))
            }
        }

        deserializer.deserialize_map(BalanceMapVisitor)
    }
}

/// Parsed balance input, not yet aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceInput {
    List(Vec<BalanceRecord>),
    Map(Vec<(String, u64)>),
}

impl BalanceInput {
    /// Parse either input shape, chosen by the first non-whitespace byte.
    pub fn parse(json: &str) -> Result<Self> {
        match json.trim_start().as_bytes().first() {
            Some(b'[') => Ok(Self::List(serde_json::from_str(json)?)),
            Some(b'{') => {
                let BalanceMap(entries) = serde_json::from_str(json)?;
                Ok(Self::Map(entries))
            }
            _ => Err(MerkledropError::Serialization(
                "balance input must be a JSON array or object".to_string(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List(records) => records.len(),
            Self::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Result<Vec<EntitlementRecord>> {
        match self {
            Self::List(records) => records.iter().map(BalanceRecord::to_record).collect(),
            Self::Map(entries) => entries
                .iter()
                .map(|(address, amount)| Ok(EntitlementRecord::new(parse_pubkey(address)?, *amount)))
                .collect(),
        }
    }

    /// Aggregate the input. Map input ignores `policy` and rejects
    /// repeated keys.
    pub fn aggregate(&self, policy: DuplicatePolicy) -> Result<Aggregate> {
        let policy = match self {
            Self::List(_) => policy,
            Self::Map(_) => DuplicatePolicy::Reject,
        };
        aggregate(&self.records()?, policy)
    }
}

/// Parse and aggregate balance JSON.
pub fn parse_balances(json: &str, policy: DuplicatePolicy) -> Result<Aggregate> {
    BalanceInput::parse(json)?.aggregate(policy)
}

/// Read, parse and aggregate a balance file.
pub fn load_balances(path: &Path, policy: DuplicatePolicy) -> Result<Aggregate> {
    let contents = std::fs::read_to_string(path)?;
    let input = BalanceInput::parse(&contents)?;
    let aggregate = input.aggregate(policy)?;
    info!(
        "Loaded {} balance records ({} recipients) from {}",
        input.len(),
        aggregate.len(),
        path.display(),
    );
    Ok(aggregate)
}
