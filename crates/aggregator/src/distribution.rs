//! Distribution descriptor: root, total and one claim per recipient.
//!
//! JSON layout:
//!
//! ```json
//! {
//!   "merkleRoot": "<hex>",
//!   "tokenTotal": "<decimal>",
//!   "claims": {
//!     "<base58 recipient>": { "index": 0, "amount": "<decimal>", "proof": ["<hex>", ...] }
//!   }
//! }
//! ```
//!
//! Claims are written in index order.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use rayon::prelude::*;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use merkledrop_core::{
    codec, encode_hash, encode_hash_prefixed, encode_pubkey, parse_hash, parse_pubkey, Hash,
    MerkledropError, PublicKey, Result,
};
use merkledrop_prover::{verify_proof, Hasher, MerkleTree};

use crate::balance::{Aggregate, AggregatedEntry};

/// A single recipient's claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub index: u64,
    pub amount: u64,
    pub proof: Vec<Hash>,
}

/// The published distribution artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionDescriptor {
    /// Merkle root over all claim leaves
    pub root: Hash,
    /// Sum of all claim amounts
    pub total: u128,
    /// Recipient → claim. Byte order of recipients equals index order.
    pub claims: BTreeMap<PublicKey, Claim>,
}

/// How the tree and proofs are computed.
#[derive(Debug, Clone, Copy)]
pub struct DistributionOptions {
    pub hasher: Hasher,
    /// Extract proofs concurrently over the shared tree
    pub parallel_proofs: bool,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            hasher: Hasher::default(),
            parallel_proofs: true,
        }
    }
}

/// How the descriptor is rendered as JSON.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormat {
    pub pretty: bool,
    /// Prefix hex digests with `0x`
    pub hex_prefix: bool,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            pretty: true,
            hex_prefix: false,
        }
    }
}

/// Build the tree for `aggregate` and assemble its descriptor.
pub fn build_distribution(
    aggregate: &Aggregate,
    options: &DistributionOptions,
) -> Result<DistributionDescriptor> {
    let tree = MerkleTree::from_balances(options.hasher, &aggregate.balances())?;
    assemble(aggregate, &tree, options.parallel_proofs)
}

/// Package every aggregated entry with its proof from `tree`.
///
/// Every entry's leaf must be in the tree. A missing leaf means the tree
/// was not built from this aggregate and is reported as
/// `InconsistentDescriptor`.
pub fn assemble(
    aggregate: &Aggregate,
    tree: &MerkleTree,
    parallel: bool,
) -> Result<DistributionDescriptor> {
    if tree.leaf_count() != aggregate.len() {
        return Err(MerkledropError::InconsistentDescriptor(format!(
            "tree has {} leaves but aggregate has {} entries",
            tree.leaf_count(),
            aggregate.len()
        )));
    }

    let claim_for = |entry: &AggregatedEntry| -> Result<(PublicKey, Claim)> {
        let proof = tree
            .proof_for(entry.index, &entry.recipient, entry.amount)
            .map_err(|e| match e {
                MerkledropError::LeafNotFound(leaf) => MerkledropError::InconsistentDescriptor(
                    format!("leaf {} for {} missing from tree", leaf, encode_pubkey(&entry.recipient)),
                ),
                other => other,
            })?;
        Ok((
            entry.recipient,
            Claim {
                index: entry.index,
                amount: entry.amount,
                proof: proof.siblings,
            },
        ))
    };

    let claims: Vec<(PublicKey, Claim)> = if parallel {
        aggregate.entries.par_iter().map(claim_for).collect::<Result<_>>()?
    } else {
        aggregate.entries.iter().map(claim_for).collect::<Result<_>>()?
    };

    let descriptor = DistributionDescriptor {
        root: tree.root(),
        total: aggregate.total,
        claims: claims.into_iter().collect(),
    };

    info!(
        "Assembled distribution: root={}, total={}, claims={}, depth={}",
        encode_hash(&descriptor.root),
        descriptor.total,
        descriptor.claims.len(),
        tree.depth(),
    );

    Ok(descriptor)
}

impl DistributionDescriptor {
    pub fn claim(&self, recipient: &PublicKey) -> Option<&Claim> {
        self.claims.get(recipient)
    }

    /// Number of claims (the distributor's `max_num_nodes`).
    pub fn num_nodes(&self) -> u64 {
        self.claims.len() as u64
    }

    /// Total claimable amount (the distributor's `max_total_claim`).
    pub fn max_total_claim(&self) -> u128 {
        self.total
    }

    /// Check one recipient's claim against the root.
    ///
    /// `false` if the recipient has no claim or the proof does not fold
    /// to the root.
    pub fn verify_claim(&self, hasher: &Hasher, recipient: &PublicKey) -> bool {
        self.claims.get(recipient).is_some_and(|claim| {
            verify_proof(hasher, claim.index, recipient, claim.amount, &claim.proof, &self.root)
        })
    }

    /// Rebuild the whole tree from the claims and check it matches.
    ///
    /// Checks that indices run `0..n` in recipient byte order, that the
    /// total is the sum of the amounts, that the rebuilt root equals the
    /// published root, and that every published proof verifies.
    pub fn reconstruct(&self, hasher: &Hasher) -> Result<MerkleTree> {
        let mut balances = Vec::with_capacity(self.claims.len());
        let mut total: u128 = 0;
        for (position, (recipient, claim)) in self.claims.iter().enumerate() {
            if claim.index != position as u64 {
                return Err(MerkledropError::InconsistentDescriptor(format!(
                    "claim for {} has index {}, expected {}",
                    encode_pubkey(recipient),
                    claim.index,
                    position
                )));
            }
            if claim.amount == 0 {
                return Err(MerkledropError::NonPositiveAmount(encode_pubkey(recipient)));
            }
            total += claim.amount as u128;
            balances.push((*recipient, claim.amount));
        }

        if total != self.total {
            return Err(MerkledropError::InconsistentDescriptor(format!(
                "token total {} does not match sum of claims {}",
                self.total, total
            )));
        }

        let tree = MerkleTree::from_balances(*hasher, &balances)?;
        if tree.root() != self.root {
            return Err(MerkledropError::InconsistentDescriptor(format!(
                "rebuilt root {} does not match published root {}",
                encode_hash(&tree.root()),
                encode_hash(&self.root)
            )));
        }

        if let Some((recipient, _)) = self
            .claims
            .iter()
            .find(|(recipient, _)| !self.verify_claim(hasher, recipient))
        {
            return Err(MerkledropError::InconsistentDescriptor(format!(
                "proof for {} does not verify",
                encode_pubkey(recipient)
            )));
        }

        debug!("Reconstructed distribution with {} claims", self.claims.len());
        Ok(tree)
    }

    pub fn to_json(&self, format: &OutputFormat) -> Result<String> {
        let file = DescriptorFile::from_descriptor(self, format.hex_prefix);
        let json = if format.pretty {
            serde_json::to_string_pretty(&file)?
        } else {
            serde_json::to_string(&file)?
        };
        Ok(json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: DescriptorFile = serde_json::from_str(json)?;
        file.into_descriptor()
    }

    /// Save the descriptor to a JSON file.
    ///
    /// Uses atomic write (tmp + rename) so a reader never sees a partial file.
    pub fn save_to_file(&self, path: &Path, format: &OutputFormat) -> Result<()> {
        let json = self.to_json(format)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, path)?;

        info!("Saved distribution ({} claims) to {}", self.claims.len(), path.display());
        Ok(())
    }

    /// Load a descriptor from a JSON file, validating every field's encoding.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let descriptor = Self::from_json(&contents)?;
        info!(
            "Loaded distribution ({} claims, root={}) from {}",
            descriptor.claims.len(),
            encode_hash(&descriptor.root),
            path.display(),
        );
        Ok(descriptor)
    }
}

// === Persistence types (private, for JSON serialization) ===

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescriptorFile {
    merkle_root: String,
    token_total: String,
    claims: ClaimsFile,
}

#[derive(Serialize, Deserialize)]
struct ClaimFile {
    index: u64,
    #[serde(with = "codec::amount")]
    amount: u64,
    proof: Vec<String>,
}

/// Claims keyed by base58 recipient, kept in document order.
struct ClaimsFile(Vec<(String, ClaimFile)>);

impl Serialize for ClaimsFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (recipient, claim) in &self.0 {
            map.serialize_entry(recipient, claim)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClaimsFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ClaimsVisitor;

        impl<'de> Visitor<'de> for ClaimsVisitor {
            type Value = ClaimsFile;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of recipient to claim")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<ClaimsFile, A::Error> {
                let mut claims = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, ClaimFile>()? {
                    claims.push(entry);
                }
                Ok(ClaimsFile(claims))
            }
        }

        deserializer.deserialize_map(ClaimsVisitor)
    }
}

impl DescriptorFile {
    fn from_descriptor(descriptor: &DistributionDescriptor, hex_prefix: bool) -> Self {
        let encode = if hex_prefix { encode_hash_prefixed } else { encode_hash };
        let claims = descriptor
            .claims
            .iter()
            .map(|(recipient, claim)| {
                (
                    encode_pubkey(recipient),
                    ClaimFile {
                        index: claim.index,
                        amount: claim.amount,
                        proof: claim.proof.iter().map(encode).collect(),
                    },
                )
            })
            .collect();

        Self {
            merkle_root: encode(&descriptor.root),
            token_total: descriptor.total.to_string(),
            claims: ClaimsFile(claims),
        }
    }

    fn into_descriptor(self) -> Result<DistributionDescriptor> {
        let root = parse_hash(&self.merkle_root)?;
        let total = self
            .token_total
            .trim()
            .parse::<u128>()
            .map_err(|_| MerkledropError::InvalidAmount(format!("tokenTotal: {}", self.token_total)))?;

        let mut claims = BTreeMap::new();
        for (address, claim) in self.claims.0 {
            let recipient = parse_pubkey(&address)?;
            let proof = claim
                .proof
                .iter()
                .map(|p| parse_hash(p))
                .collect::<Result<Vec<_>>>()?;
            let parsed = Claim {
                index: claim.index,
                amount: claim.amount,
                proof,
            };
            if claims.insert(recipient, parsed).is_some() {
                return Err(MerkledropError::DuplicateRecipient(address));
            }
        }

        Ok(DistributionDescriptor { root, total, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::aggregate;
    use merkledrop_core::{DuplicatePolicy, EntitlementRecord, HashAlgorithm};

    fn h(s: &str) -> Hash {
        hex::decode(s).unwrap().try_into().unwrap()
    }

    fn fixture_aggregate() -> Aggregate {
        // ed25519 public keys for seeds [0; 32], [2; 32], [1; 32]
        let records = [
            EntitlementRecord::new(
                h("3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29"),
                1_000_000,
            ),
            EntitlementRecord::new(
                h("8139770ea87d175f56a35466c34c7ecccb8d8a91b4ee37a25df60f5b8fc9b394"),
                2_000_000,
            ),
            EntitlementRecord::new(
                h("8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c"),
                3_000_000,
            ),
        ];
        aggregate(&records, DuplicatePolicy::Sum).unwrap()
    }

    fn small_aggregate(n: u8) -> Aggregate {
        let records: Vec<_> = (1..=n).map(|i| EntitlementRecord::new([i; 32], i as u64 * 10)).collect();
        aggregate(&records, DuplicatePolicy::Sum).unwrap()
    }

    #[test]
    fn test_build_distribution_known_vectors() {
        let dist = build_distribution(&fixture_aggregate(), &DistributionOptions::default()).unwrap();
        assert_eq!(dist.total, 6_000_000);
        assert_eq!(
            dist.root,
            h("205c1860c0ec8a04a12fd13a111f6b3880efcbde2bb678322198efd03f17cd15")
        );
        let indices: Vec<u64> = dist.claims.values().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        let first = dist.claims.values().next().unwrap();
        assert_eq!(first.amount, 1_000_000);
        assert_eq!(
            first.proof,
            vec![h("607e67765bcf4177e16fccd6149a4cfcd05d291ab664d24b8f7455d08aa121af")]
        );
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let agg = small_aggregate(37);
        let parallel = build_distribution(&agg, &DistributionOptions::default()).unwrap();
        let sequential = build_distribution(
            &agg,
            &DistributionOptions {
                parallel_proofs: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_every_claim_verifies() {
        let hasher = Hasher::default();
        let dist = build_distribution(&small_aggregate(11), &DistributionOptions::default()).unwrap();
        for recipient in dist.claims.keys() {
            assert!(dist.verify_claim(&hasher, recipient));
        }
        assert!(!dist.verify_claim(&hasher, &[0xEEu8; 32]));
    }

    #[test]
    fn test_empty_aggregate_rejected() {
        let err = build_distribution(&Aggregate::default(), &DistributionOptions::default()).unwrap_err();
        assert!(matches!(err, MerkledropError::EmptyTree));
    }

    #[test]
    fn test_assemble_with_foreign_tree_is_inconsistent() {
        let agg = small_aggregate(4);
        let other = small_aggregate(5);
        let tree = MerkleTree::from_balances(Hasher::default(), &other.balances()).unwrap();
        assert!(matches!(
            assemble(&agg, &tree, false),
            Err(MerkledropError::InconsistentDescriptor(_))
        ));

        // Same size, different amounts
        let mut shifted = small_aggregate(4);
        for entry in &mut shifted.entries {
            entry.amount += 1;
        }
        let tree = MerkleTree::from_balances(Hasher::default(), &shifted.balances()).unwrap();
        assert!(matches!(
            assemble(&agg, &tree, true),
            Err(MerkledropError::InconsistentDescriptor(_))
        ));
    }

    #[test]
    fn test_json_layout() {
        let dist = build_distribution(&fixture_aggregate(), &DistributionOptions::default()).unwrap();
        let json = dist.to_json(&OutputFormat::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(
            value["merkleRoot"],
            "205c1860c0ec8a04a12fd13a111f6b3880efcbde2bb678322198efd03f17cd15"
        );
        assert_eq!(value["tokenTotal"], "6000000");
        let claim = &value["claims"]["4zvwRjXUKGfvwnParsHAS3HuSVzV5cA4McphgmoCtajS"];
        assert_eq!(claim["index"], 0);
        assert_eq!(claim["amount"], "1000000");
        assert_eq!(
            claim["proof"][0],
            "607e67765bcf4177e16fccd6149a4cfcd05d291ab664d24b8f7455d08aa121af"
        );
    }

    #[test]
    fn test_json_claims_in_index_order() {
        let dist = build_distribution(&fixture_aggregate(), &DistributionOptions::default()).unwrap();
        let json = dist.to_json(&OutputFormat { pretty: false, hex_prefix: false }).unwrap();
        let a = json.find("4zvwRjXUKGfvwnParsHAS3HuSVzV5cA4McphgmoCtajS").unwrap();
        let b = json.find("9hSR6S7WPtxmTojgo6GG3k4yDPecgJY292j7xrsUGWBu").unwrap();
        let c = json.find("AKnL4NNf3DGWZJS6cPknBuEGnVsV4A4m5tgebLHaRSZ9").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_json_hex_prefix() {
        let dist = build_distribution(&small_aggregate(2), &DistributionOptions::default()).unwrap();
        let json = dist.to_json(&OutputFormat { pretty: true, hex_prefix: true }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["merkleRoot"].as_str().unwrap().starts_with("0x"));
        // Prefixed output parses back to the same descriptor
        assert_eq!(DistributionDescriptor::from_json(&json).unwrap(), dist);
    }

    #[test]
    fn test_json_reload_preserves_descriptor() {
        let dist = build_distribution(&small_aggregate(9), &DistributionOptions::default()).unwrap();
        let json = dist.to_json(&OutputFormat::default()).unwrap();
        assert_eq!(DistributionDescriptor::from_json(&json).unwrap(), dist);
    }

    #[test]
    fn test_from_json_rejects_bad_fields() {
        let bad_root = r#"{"merkleRoot":"xyz","tokenTotal":"1","claims":{}}"#;
        assert!(matches!(
            DistributionDescriptor::from_json(bad_root),
            Err(MerkledropError::InvalidHash(_))
        ));

        let root = "00".repeat(32);
        let bad_total = format!(r#"{{"merkleRoot":"{}","tokenTotal":"-4","claims":{{}}}}"#, root);
        assert!(matches!(
            DistributionDescriptor::from_json(&bad_total),
            Err(MerkledropError::InvalidAmount(_))
        ));

        let bad_key = format!(
            r#"{{"merkleRoot":"{}","tokenTotal":"1","claims":{{"nope":{{"index":0,"amount":"1","proof":[]}}}}}}"#,
            root
        );
        assert!(matches!(
            DistributionDescriptor::from_json(&bad_key),
            Err(MerkledropError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_duplicate_claims() {
        let root = "00".repeat(32);
        let key = encode_pubkey(&[1u8; 32]);
        let json = format!(
            r#"{{"merkleRoot":"{r}","tokenTotal":"2","claims":{{"{k}":{{"index":0,"amount":"1","proof":[]}},"{k}":{{"index":0,"amount":"1","proof":[]}}}}}}"#,
            r = root,
            k = key
        );
        assert!(matches!(
            DistributionDescriptor::from_json(&json),
            Err(MerkledropError::DuplicateRecipient(_))
        ));
    }

    #[test]
    fn test_reconstruct_accepts_genuine_descriptor() {
        let hasher = Hasher::default();
        let dist = build_distribution(&small_aggregate(13), &DistributionOptions::default()).unwrap();
        let tree = dist.reconstruct(&hasher).unwrap();
        assert_eq!(tree.root(), dist.root);
        assert_eq!(dist.num_nodes(), 13);
        assert_eq!(dist.max_total_claim(), (1..=13u128).map(|i| i * 10).sum::<u128>());
    }

    #[test]
    fn test_reconstruct_detects_tampering() {
        let hasher = Hasher::default();
        let dist = build_distribution(&small_aggregate(6), &DistributionOptions::default()).unwrap();

        let mut wrong_total = dist.clone();
        wrong_total.total += 1;
        assert!(wrong_total.reconstruct(&hasher).is_err());

        let mut wrong_amount = dist.clone();
        let first = *wrong_amount.claims.keys().next().unwrap();
        wrong_amount.claims.get_mut(&first).unwrap().amount += 1;
        wrong_amount.total += 1;
        assert!(matches!(
            wrong_amount.reconstruct(&hasher),
            Err(MerkledropError::InconsistentDescriptor(_))
        ));

        let mut wrong_index = dist.clone();
        wrong_index.claims.get_mut(&first).unwrap().index = 5;
        assert!(wrong_index.reconstruct(&hasher).is_err());

        let mut wrong_proof = dist.clone();
        wrong_proof.claims.get_mut(&first).unwrap().proof[0][0] ^= 0x80;
        assert!(wrong_proof.reconstruct(&hasher).is_err());

        let mut wrong_root = dist;
        wrong_root.root[0] ^= 0x01;
        assert!(wrong_root.reconstruct(&hasher).is_err());
    }

    #[test]
    fn test_reconstruct_with_other_algorithm_fails() {
        let dist = build_distribution(&small_aggregate(3), &DistributionOptions::default()).unwrap();
        let sha = Hasher::new(HashAlgorithm::Sha256);
        assert!(dist.reconstruct(&sha).is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("distributor-info.json");
        let dist = build_distribution(&small_aggregate(5), &DistributionOptions::default()).unwrap();

        dist.save_to_file(&path, &OutputFormat::default()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = DistributionDescriptor::load_from_file(&path).unwrap();
        assert_eq!(loaded, dist);
    }
}
