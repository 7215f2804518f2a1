//! Collapse raw records into one entitlement per recipient.

use std::collections::btree_map::{BTreeMap, Entry};

use tracing::debug;

use merkledrop_core::{
    encode_pubkey, DuplicatePolicy, EntitlementRecord, MerkledropError, PublicKey, Result,
};

/// One recipient's total entitlement and its position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatedEntry {
    /// Position in ascending recipient order; the leaf index
    pub index: u64,
    pub recipient: PublicKey,
    pub amount: u64,
}

/// Aggregated balances, sorted by recipient bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub entries: Vec<AggregatedEntry>,
    /// Sum over all entries
    pub total: u128,
}

impl Aggregate {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(recipient, amount)` pairs in index order.
    pub fn balances(&self) -> Vec<(PublicKey, u64)> {
        self.entries.iter().map(|e| (e.recipient, e.amount)).collect()
    }

    pub fn get(&self, recipient: &PublicKey) -> Option<&AggregatedEntry> {
        self.entries
            .binary_search_by(|e| e.recipient.cmp(recipient))
            .ok()
            .map(|i| &self.entries[i])
    }
}

/// Aggregate records by recipient.
///
/// Repeated recipients are summed or rejected according to `policy`.
/// Every resulting amount must be strictly positive and fit in `u64`.
pub fn aggregate(records: &[EntitlementRecord], policy: DuplicatePolicy) -> Result<Aggregate> {
    let mut by_recipient: BTreeMap<PublicKey, u64> = BTreeMap::new();

    for record in records {
        match by_recipient.entry(record.recipient) {
            Entry::Vacant(slot) => {
                slot.insert(record.amount);
            }
            Entry::Occupied(mut slot) => match policy {
                DuplicatePolicy::Reject => {
                    return Err(MerkledropError::DuplicateRecipient(encode_pubkey(&record.recipient)));
                }
                DuplicatePolicy::Sum => {
                    let sum = slot.get().checked_add(record.amount).ok_or_else(|| {
                        MerkledropError::AmountOverflow(encode_pubkey(&record.recipient))
                    })?;
                    *slot.get_mut() = sum;
                }
            },
        }
    }

    let mut entries = Vec::with_capacity(by_recipient.len());
    let mut total: u128 = 0;
    for (index, (recipient, amount)) in by_recipient.into_iter().enumerate() {
        if amount == 0 {
            return Err(MerkledropError::NonPositiveAmount(encode_pubkey(&recipient)));
        }
        total += amount as u128;
        entries.push(AggregatedEntry {
            index: index as u64,
            recipient,
            amount,
        });
    }

    debug!(
        "Aggregated {} records into {} recipients (policy={:?}, total={})",
        records.len(),
        entries.len(),
        policy,
        total,
    );

    Ok(Aggregate { entries, total })
}
