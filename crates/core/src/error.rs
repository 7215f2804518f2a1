use thiserror::Error;

#[derive(Error, Debug)]
pub enum MerkledropError {
    #[error("Cannot build a Merkle tree with no leaves")]
    EmptyTree,

    #[error("Duplicate recipient: {0}")]
    DuplicateRecipient(String),

    #[error("Invalid amount for recipient: {0}")]
    NonPositiveAmount(String),

    #[error("Leaf not found in Merkle tree: {0}")]
    LeafNotFound(String),

    #[error("Amount overflow for recipient: {0}")]
    AmountOverflow(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Both elements of a pair are missing")]
    MissingPair,

    #[error("Inconsistent distribution: {0}")]
    InconsistentDescriptor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MerkledropError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MerkledropError>;
