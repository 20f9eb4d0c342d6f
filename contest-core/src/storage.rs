//! Document store using RocksDB
//!
//! # Column Families
//!
//! - `contests` - Contest documents (key: contest_id)
//! - `submissions` - Submission documents (key: submission_id)
//! - `votes` - Append-only vote documents (key: vote_id)
//! - `indices` - Secondary indices for wallet lookups
//!
//! Documents are stored as JSON. Ids are UUIDv7, so key order is creation order.

use crate::{
    error::{Error, Result},
    types::{Contest, ContestId, Submission, SubmissionId, Vote, VoteId},
    StorageConfig,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Column family names
const CF_CONTESTS: &str = "contests";
const CF_SUBMISSIONS: &str = "submissions";
const CF_VOTES: &str = "votes";
const CF_INDICES: &str = "indices";

/// Index key prefixes
const IDX_WALLET_SUBMISSION: &[u8] = b"wallet|";
const IDX_VOTER_VOTE: &[u8] = b"voter|";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: DB,
    sync_writes: bool,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.db.path())
            .field("sync_writes", &self.sync_writes)
            .finish()
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_CONTESTS, Self::cf_options_documents()),
            ColumnFamilyDescriptor::new(CF_SUBMISSIONS, Self::cf_options_documents()),
            ColumnFamilyDescriptor::new(CF_VOTES, Self::cf_options_votes()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened contest store");

        Ok(Self {
            db,
            sync_writes: config.rocksdb.sync_writes,
        })
    }

    // Column family options

    fn cf_options_documents() -> Options {
        let mut opts = Options::default();
        // Documents are read on every request, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_votes() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }

    fn get_document<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf_handle(cf)?;
        match self.db.get_cf(cf, key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn put_document<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf: &str,
        key: &[u8],
        document: &T,
    ) -> Result<()> {
        let cf = self.cf_handle(cf)?;
        batch.put_cf(cf, key, serde_json::to_vec(document)?);
        Ok(())
    }

    fn scan_documents<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let cf = self.cf_handle(cf)?;
        let mut documents = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            documents.push(serde_json::from_slice(&value)?);
        }
        Ok(documents)
    }

    // Contest operations

    /// Insert or replace a contest document
    pub fn put_contest(&self, contest: &Contest) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.put_document(&mut batch, CF_CONTESTS, contest.id.as_bytes(), contest)?;
        self.db.write_opt(batch, &self.write_options())?;

        tracing::debug!(contest_id = %contest.id, "Contest stored");
        Ok(())
    }

    /// Get contest by ID
    pub fn get_contest(&self, contest_id: ContestId) -> Result<Contest> {
        self.get_document(CF_CONTESTS, contest_id.as_bytes())?
            .ok_or_else(|| Error::ContestNotFound(contest_id.to_string()))
    }

    /// All contests in creation order
    pub fn list_contests(&self) -> Result<Vec<Contest>> {
        self.scan_documents(CF_CONTESTS)
    }

    /// Read-modify-write of a contest document
    ///
    /// Callers must hold the contest's lock; this method does not serialize writers.
    pub fn update_contest<F>(&self, contest_id: ContestId, mutate: F) -> Result<Contest>
    where
        F: FnOnce(&mut Contest) -> Result<()>,
    {
        let mut contest = self.get_contest(contest_id)?;
        mutate(&mut contest)?;
        self.put_contest(&contest)?;
        Ok(contest)
    }

    /// Resolve the contest's submission ids to full records, keeping order
    pub fn populate(&self, contest: Contest) -> Result<Contest<Submission>> {
        let mut submissions = Vec::with_capacity(contest.submissions.len());
        for id in &contest.submissions {
            match self.get_document::<Submission>(CF_SUBMISSIONS, id.as_bytes())? {
                Some(submission) => submissions.push(submission),
                None => {
                    tracing::warn!(contest_id = %contest.id, submission_id = %id, "Dangling submission reference");
                }
            }
        }
        Ok(contest.with_submissions(submissions))
    }

    // Submission operations

    /// Get submission by ID
    pub fn get_submission(&self, submission_id: SubmissionId) -> Result<Submission> {
        self.get_document(CF_SUBMISSIONS, submission_id.as_bytes())?
            .ok_or_else(|| Error::SubmissionNotFound(submission_id.to_string()))
    }

    /// Get submissions by ID, skipping ids that do not exist
    pub fn get_submissions(&self, ids: &[SubmissionId]) -> Result<Vec<Submission>> {
        let mut submissions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(submission) = self.get_document(CF_SUBMISSIONS, id.as_bytes())? {
                submissions.push(submission);
            }
        }
        Ok(submissions)
    }

    /// Submission ids created by a wallet (via index)
    pub fn submission_ids_by_wallet(&self, wallet: &str) -> Result<Vec<SubmissionId>> {
        let prefix = Self::index_prefix(IDX_WALLET_SUBMISSION, wallet);
        self.scan_index(&prefix)
            .map(|ids| ids.into_iter().map(SubmissionId::from_bytes).collect())
    }

    // Vote operations

    /// Get vote by ID
    pub fn get_vote(&self, vote_id: VoteId) -> Result<Vote> {
        self.get_document(CF_VOTES, vote_id.as_bytes())?
            .ok_or_else(|| Error::VoteNotFound(vote_id.to_string()))
    }

    /// Votes cast by a wallet (via index)
    pub fn votes_by_voter(&self, voter: &str) -> Result<Vec<Vote>> {
        let prefix = Self::index_prefix(IDX_VOTER_VOTE, voter);
        self.scan_index(&prefix)?
            .into_iter()
            .map(|id| self.get_vote(VoteId::from_bytes(id)))
            .collect()
    }

    // Batch operations (atomic)

    /// Store a new submission together with its contest's updated submission list
    pub fn commit_submission(&self, submission: &Submission, contest: &Contest) -> Result<()> {
        let mut batch = WriteBatch::default();

        // 1. Submission
        self.put_document(&mut batch, CF_SUBMISSIONS, submission.id.as_bytes(), submission)?;

        // 2. Contest with the appended id
        self.put_document(&mut batch, CF_CONTESTS, contest.id.as_bytes(), contest)?;

        // 3. Index: wallet || submission_id -> empty
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let idx_wallet =
            Self::index_key(IDX_WALLET_SUBMISSION, &submission.wallet, submission.id.as_bytes());
        batch.put_cf(cf_indices, &idx_wallet, b"");

        self.db.write_opt(batch, &self.write_options())?;

        Ok(())
    }

    /// Append a vote with the tallied submission and contest (atomic)
    pub fn commit_vote(&self, vote: &Vote, submission: &Submission, contest: &Contest) -> Result<()> {
        let mut batch = WriteBatch::default();

        // 1. Vote
        self.put_document(&mut batch, CF_VOTES, vote.id.as_bytes(), vote)?;

        // 2. Submission tally
        self.put_document(&mut batch, CF_SUBMISSIONS, submission.id.as_bytes(), submission)?;

        // 3. Contest voters and winner pointer
        self.put_document(&mut batch, CF_CONTESTS, contest.id.as_bytes(), contest)?;

        // 4. Index: voter || vote_id -> empty
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let idx_voter = Self::index_key(IDX_VOTER_VOTE, &vote.voter, vote.id.as_bytes());
        batch.put_cf(cf_indices, &idx_voter, b"");

        self.db.write_opt(batch, &self.write_options())?;

        Ok(())
    }

    // Index key helpers

    fn index_prefix(kind: &[u8], wallet: &str) -> Vec<u8> {
        let mut key = kind.to_vec();
        key.extend_from_slice(wallet.as_bytes());
        key.push(b'|');
        key
    }

    fn index_key(kind: &[u8], wallet: &str, id: &[u8; 16]) -> Vec<u8> {
        let mut key = Self::index_prefix(kind, wallet);
        key.extend_from_slice(id);
        key
    }

    /// Ids under an exact `kind || wallet || '|'` prefix
    fn scan_index(&self, prefix: &[u8]) -> Result<Vec<[u8; 16]>> {
        let cf = self.cf_handle(CF_INDICES)?;
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut ids = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            // A longer suffix belongs to a wallet that merely shares this prefix
            if let Ok(id) = <[u8; 16]>::try_from(&key[prefix.len()..]) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Flush memtables (graceful shutdown)
    pub fn flush(&self) -> Result<()> {
        for name in [CF_CONTESTS, CF_SUBMISSIONS, CF_VOTES, CF_INDICES] {
            self.db.flush_cf(self.cf_handle(name)?)?;
        }
        tracing::info!("Contest store flushed");
        Ok(())
    }
}
