//! Merkledrop CLI
//!
//! Command-line interface for generating and checking Merkle airdrop
//! distributions.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use merkledrop_aggregator::{
    build_distribution, load_balances, DistributionDescriptor, DistributionOptions, OutputFormat,
};
use merkledrop_core::{
    encode_hash, parse_hash, parse_pubkey, DuplicatePolicy, HashAlgorithm, PublicKey,
};
use merkledrop_logging::{init, LogLevel};
use merkledrop_prover::{verify_proof, Hasher};
use merkledrop_settings::{expand_path, Settings};

/// Merkledrop - Merkle distributor tooling
#[derive(Parser)]
#[command(name = "merkledrop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a distribution from a balance file
    Generate {
        /// Balance JSON (list of {address, earnings} or map of address to amount)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the descriptor (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Hash algorithm (keccak256 or sha256)
        #[arg(long)]
        hash: Option<HashAlgorithm>,

        /// Repeated recipients in list input (sum or reject)
        #[arg(long)]
        policy: Option<DuplicatePolicy>,
    },

    /// Print one recipient's claim from a descriptor
    Proof {
        /// Descriptor JSON
        #[arg(short, long)]
        descriptor: PathBuf,

        /// Recipient address (base58)
        address: String,
    },

    /// Verify a claim. Exits 1 when the claim does not verify.
    Verify {
        /// Descriptor JSON holding the claim
        #[arg(short, long, conflicts_with_all = ["root", "index", "amount", "proof"])]
        descriptor: Option<PathBuf>,

        /// Published root (hex)
        #[arg(long, requires_all = ["index", "amount"])]
        root: Option<String>,

        /// Leaf index
        #[arg(long)]
        index: Option<u64>,

        /// Claimed amount
        #[arg(long)]
        amount: Option<u64>,

        /// Proof entry (hex), repeat in leaf-to-root order
        #[arg(long)]
        proof: Vec<String>,

        /// Hash algorithm (keccak256 or sha256)
        #[arg(long)]
        hash: Option<HashAlgorithm>,

        /// Recipient address (base58)
        address: String,
    },

    /// Rebuild the whole tree from a descriptor and check it
    Check {
        /// Descriptor JSON
        #[arg(short, long)]
        descriptor: PathBuf,

        /// Hash algorithm (keccak256 or sha256)
        #[arg(long)]
        hash: Option<HashAlgorithm>,
    },

    /// Print the effective settings
    Config,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init(LogLevel::from_verbose(cli.verbose));

    let settings = match &cli.config {
        Some(path) => Settings::load_from(&expand_path(path)),
        None => Settings::load_or_default(),
    }
    .context("Failed to load settings")?;

    match cli.command {
        Commands::Generate {
            input,
            output,
            hash,
            policy,
        } => generate(&settings, &input, output.as_deref(), hash, policy),
        Commands::Proof {
            descriptor,
            address,
        } => proof(&descriptor, &address),
        Commands::Verify {
            descriptor,
            root,
            index,
            amount,
            proof,
            hash,
            address,
        } => {
            let hasher = Hasher::new(hash.unwrap_or(settings.tree.hash_algorithm));
            let recipient = parse_pubkey(&address)?;
            let valid = match descriptor {
                Some(path) => verify_from_descriptor(&hasher, &path, &recipient)?,
                None => {
                    let (Some(root), Some(index), Some(amount)) = (root, index, amount) else {
                        bail!("either --descriptor or --root, --index and --amount are required");
                    };
                    verify_explicit(&hasher, &root, index, &recipient, amount, &proof)?
                }
            };
            report_verification(&address, valid)
        }
        Commands::Check { descriptor, hash } => {
            let hasher = Hasher::new(hash.unwrap_or(settings.tree.hash_algorithm));
            check(&hasher, &descriptor)
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// Generation
// ============================================================================

fn generate(
    settings: &Settings,
    input: &Path,
    output: Option<&Path>,
    hash: Option<HashAlgorithm>,
    policy: Option<DuplicatePolicy>,
) -> Result<ExitCode> {
    let input = expand_path(input);
    let policy = policy.unwrap_or(settings.aggregation.duplicate_policy);
    let options = DistributionOptions {
        hasher: Hasher::new(hash.unwrap_or(settings.tree.hash_algorithm)),
        parallel_proofs: settings.tree.parallel_proofs,
    };
    let format = OutputFormat {
        pretty: settings.output.pretty,
        hex_prefix: settings.output.hex_prefix,
    };

    let aggregate = load_balances(&input, policy)
        .with_context(|| format!("Failed to load balances from {}", input.display()))?;
    let descriptor = build_distribution(&aggregate, &options).context("Failed to build distribution")?;

    match output {
        Some(path) => {
            let path = expand_path(path);
            descriptor
                .save_to_file(&path, &format)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Merkle root:  {}", encode_hash(&descriptor.root));
            println!("Token total:  {}", descriptor.total);
            println!("Claims:       {}", descriptor.num_nodes());
            println!("Hash:         {}", options.hasher.algorithm());
            println!("Written to:   {}", path.display());
        }
        None => println!("{}", descriptor.to_json(&format)?),
    }

    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Claims
// ============================================================================

fn load_descriptor(path: &Path) -> Result<DistributionDescriptor> {
    let path = expand_path(path);
    DistributionDescriptor::load_from_file(&path)
        .with_context(|| format!("Failed to load descriptor {}", path.display()))
}

fn proof(descriptor: &Path, address: &str) -> Result<ExitCode> {
    let descriptor = load_descriptor(descriptor)?;
    let recipient = parse_pubkey(address)?;
    let Some(claim) = descriptor.claim(&recipient) else {
        bail!("No claim for {}", address);
    };

    let out = serde_json::json!({
        "index": claim.index,
        "amount": claim.amount.to_string(),
        "proof": claim.proof.iter().map(encode_hash).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(ExitCode::SUCCESS)
}

fn verify_from_descriptor(hasher: &Hasher, path: &Path, recipient: &PublicKey) -> Result<bool> {
    let descriptor = load_descriptor(path)?;
    if descriptor.claim(recipient).is_none() {
        warn!("Descriptor has no claim for this recipient");
    }
    Ok(descriptor.verify_claim(hasher, recipient))
}

fn verify_explicit(
    hasher: &Hasher,
    root: &str,
    index: u64,
    recipient: &PublicKey,
    amount: u64,
    proof: &[String],
) -> Result<bool> {
    let root = parse_hash(root)?;
    let proof = proof
        .iter()
        .map(|p| parse_hash(p))
        .collect::<merkledrop_core::Result<Vec<_>>>()?;
    Ok(verify_proof(hasher, index, recipient, amount, &proof, &root))
}

fn report_verification(address: &str, valid: bool) -> Result<ExitCode> {
    if valid {
        println!("Valid claim for {}", address);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Invalid claim for {}", address);
        Ok(ExitCode::FAILURE)
    }
}

fn check(hasher: &Hasher, path: &Path) -> Result<ExitCode> {
    let descriptor = load_descriptor(path)?;
    match descriptor.reconstruct(hasher) {
        Ok(tree) => {
            info!("Rebuilt tree with {} leaves, depth {}", tree.leaf_count(), tree.depth());
            println!(
                "OK: {} claims, total {}, root {}",
                descriptor.num_nodes(),
                descriptor.total,
                encode_hash(&descriptor.root)
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("FAILED: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
