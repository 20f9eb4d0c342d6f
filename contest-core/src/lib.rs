//! Contest Core
//!
//! Contest lifecycle and voting ledger for the meme contest platform.
//!
//! # Architecture
//!
//! - **Document Store**: Contests, submissions and votes are JSON documents in RocksDB
//! - **Per-Contest Writer**: Mutations of one contest are serialized by a per-contest lock
//! - **Atomic Batches**: Multi-document effects commit in a single `WriteBatch`
//! - **Stable Targets**: Votes reference submissions by id, never by position
//!
//! # Invariants
//!
//! - One vote per wallet per contest
//! - `highest_votes == votes(winning_submission)` whenever a winner is set
//! - The winner is always a submission of the contest; ties keep the earlier leader
//! - Votes are append-only; submission tallies never decrease

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod admin;
pub mod book;
pub mod config;
pub mod error;
pub mod intake;
pub mod locks;
pub mod query;
pub mod storage;
pub mod types;
pub mod voting;

#[cfg(test)]
mod test_support;

// Re-exports
pub use book::ContestBook;
pub use config::StorageConfig;
pub use error::{Error, Result};
pub use storage::Storage;
pub use types::{
    normalize_wallet, Ballot, Contest, ContestId, NewContest, NewSubmission, Submission,
    SubmissionId, Vote, VoteId, VoteTarget, UNKNOWN_WALLET,
};
