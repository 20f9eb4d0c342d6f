//! Error types for the contest book

use thiserror::Error;

/// Result type for contest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Contest book errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Document (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed identifier
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// Missing or malformed input field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Submission without an image reference
    #[error("No IPFS hash provided")]
    MissingContentRef,

    /// Contest not found
    #[error("Contest not found: {0}")]
    ContestNotFound(String),

    /// Submission not found
    #[error("Submission not found: {0}")]
    SubmissionNotFound(String),

    /// Vote not found
    #[error("Vote not found: {0}")]
    VoteNotFound(String),

    /// Wallet already voted in this contest
    #[error("Voter {voter} has already voted in contest {contest}")]
    DuplicateVote {
        /// Contest id
        contest: String,
        /// Wallet address
        voter: String,
    },

    /// Contest no longer accepts submissions or votes
    #[error("Contest has ended: {0}")]
    ContestEnded(String),

    /// Operation requires an ended contest
    #[error("Contest has not ended: {0}")]
    ContestNotEnded(String),

    /// Prize distribution already recorded
    #[error("Distribution already recorded for contest {0}")]
    DistributionAlreadyRecorded(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
