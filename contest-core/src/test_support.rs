//! Fixtures shared by the unit tests

use crate::{
    types::{Contest, ContestId, NewContest, Submission, SubmissionId},
    ContestBook, Storage, StorageConfig,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

pub(crate) fn test_config() -> (StorageConfig, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = StorageConfig::default();
    config.data_dir = temp_dir.path().to_path_buf();
    config.rocksdb.sync_writes = false;
    (config, temp_dir)
}

pub(crate) fn open_storage() -> (Storage, TempDir) {
    let (config, temp_dir) = test_config();
    (Storage::open(&config).unwrap(), temp_dir)
}

pub(crate) fn open_book() -> (ContestBook, TempDir) {
    let (config, temp_dir) = test_config();
    (ContestBook::open(&config).unwrap(), temp_dir)
}

pub(crate) fn terms() -> NewContest {
    let start = Utc::now();
    NewContest {
        name: "Dankest Meme".to_string(),
        start_date_time: start,
        end_date_time: start + Duration::days(7),
        entry_fee: Decimal::new(5, 1),
        voting_fee: Decimal::new(1, 1),
        winner_percentage: Decimal::from(70),
        number_of_lucky_voters: 3,
        contract_address: "0xcontract".to_string(),
        token_address: "0xtoken".to_string(),
        contest_owner: "0xowner".to_string(),
    }
}

pub(crate) fn sample_contest() -> Contest {
    Contest::create(terms()).unwrap()
}

pub(crate) fn sample_submission(contest: ContestId, wallet: &str, image: &str) -> Submission {
    Submission {
        id: SubmissionId::new(),
        wallet: wallet.to_string(),
        image: image.to_string(),
        contest,
        votes: 0,
        created_at: Utc::now(),
    }
}
