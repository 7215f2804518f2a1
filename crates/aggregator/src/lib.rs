//! Merkledrop Aggregator
//!
//! Turns raw `(recipient, amount)` records into a published
//! distribution: one entry per recipient in ascending byte order, a
//! Merkle root over their leaves, and a proof for every claim.
//!
//! The resulting [`DistributionDescriptor`] is the only artifact that
//! leaves the batch. It is sufficient for anyone to rebuild the tree and
//! check that every claim is included and nothing else is.

mod balance;
mod distribution;
mod input;

pub use balance::{aggregate, AggregatedEntry, Aggregate};
pub use distribution::{
    assemble, build_distribution, Claim, DistributionDescriptor, DistributionOptions, OutputFormat,
};
pub use input::{load_balances, parse_balances, BalanceInput, BalanceRecord};
