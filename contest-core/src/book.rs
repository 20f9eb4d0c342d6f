//! Contest book: storage plus per-contest locking
//!
//! The operations live next to their concerns:
//!
//! - [`crate::admin`] - contest creation, ending, ownership and distribution
//! - [`crate::intake`] - submissions
//! - [`crate::voting`] - the voting ledger
//! - [`crate::query`] - read-side projections
//!
//! # Example
//!
//! ```no_run
//! use contest_core::{ContestBook, StorageConfig};
//!
//! fn main() -> contest_core::Result<()> {
//!     let book = ContestBook::open(&StorageConfig::default())?;
//!     let contests = book.list_contests()?;
//!     println!("{} contests", contests.len());
//!     book.shutdown()
//! }
//! ```

use crate::{locks::ContestLocks, Result, Storage, StorageConfig};
use std::sync::Arc;

/// Contest lifecycle and voting ledger over the document store
#[derive(Debug)]
pub struct ContestBook {
    pub(crate) storage: Arc<Storage>,
    pub(crate) locks: ContestLocks,
}

impl ContestBook {
    /// Open the store described by `config`
    pub fn open(config: &StorageConfig) -> Result<Self> {
        Ok(Self::with_storage(Arc::new(Storage::open(config)?)))
    }

    /// Wrap an already opened store
    pub fn with_storage(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            locks: ContestLocks::new(),
        }
    }

    /// Flush pending writes before the process exits
    pub fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down contest book");
        self.storage.flush()
    }
}
