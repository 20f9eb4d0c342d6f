use crate::errors::{ContestApiError, Result};
use actix_multipart::form::{bytes::Bytes as UploadedBytes, MultipartForm};
use chrono::{DateTime, Utc};
use contest_core::{
    Ballot, Contest, ContestId, NewContest, NewSubmission, Submission, SubmissionId, Vote,
    VoteTarget,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Create contest request
///
/// Every field is optional on the wire so a missing one is reported as a
/// validation error rather than a body parse failure.
#[derive(Debug, Default, Deserialize, Serialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContestRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub start_date_time: Option<DateTime<Utc>>,
    pub end_date_time: Option<DateTime<Utc>>,
    pub entry_fee: Option<Decimal>,
    pub voting_fee: Option<Decimal>,
    pub winner_percentage: Option<Decimal>,
    pub number_of_lucky_voters: Option<u32>,
    #[validate(length(min = 1))]
    pub contract_address: Option<String>,
    #[validate(length(min = 1))]
    pub token_address: Option<String>,
    #[validate(length(min = 1))]
    pub contest_owner: Option<String>,
}

impl CreateContestRequest {
    pub fn into_terms(self) -> Result<NewContest> {
        validator::Validate::validate(&self)
            .map_err(|e| ContestApiError::Validation(e.to_string()))?;

        match self {
            CreateContestRequest {
                name: Some(name),
                start_date_time: Some(start_date_time),
                end_date_time: Some(end_date_time),
                entry_fee: Some(entry_fee),
                voting_fee: Some(voting_fee),
                winner_percentage: Some(winner_percentage),
                number_of_lucky_voters: Some(number_of_lucky_voters),
                contract_address: Some(contract_address),
                token_address: Some(token_address),
                contest_owner: Some(contest_owner),
            } => Ok(NewContest {
                name,
                start_date_time,
                end_date_time,
                entry_fee,
                voting_fee,
                winner_percentage,
                number_of_lucky_voters,
                contract_address,
                token_address,
                contest_owner,
            }),
            _ => Err(ContestApiError::Validation("Missing required fields".to_string())),
        }
    }
}

/// Transfer contest ownership
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOwnerRequest {
    #[serde(default)]
    pub new_owner: String,
}

/// Record the prize distribution transaction
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
    #[serde(default)]
    pub tx_hash: String,
}

/// Submit an image to a contest
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub contest: String,
    pub user_address: Option<String>,
    pub ipfs_hash: Option<String>,
}

impl CreateSubmissionRequest {
    /// A missing image is reported before a malformed contest id
    pub fn into_new_submission(self) -> Result<NewSubmission> {
        if self.ipfs_hash.as_deref().map_or(true, |hash| hash.trim().is_empty()) {
            return Err(ContestApiError::MissingContentRef);
        }

        Ok(NewSubmission {
            contest: ContestId::parse(&self.contest)?,
            wallet: self.user_address,
            image: self.ipfs_hash,
        })
    }
}

/// Cast a vote
///
/// The submission is addressed by `submissionIndex` (position in the contest)
/// or by `submissionId`; the id wins when both are present.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVoteRequest {
    pub contest_id: Option<String>,
    pub voter: Option<String>,
    pub submission_index: Option<i64>,
    pub submission_id: Option<String>,
    pub tx_hash: Option<String>,
}

impl RecordVoteRequest {
    /// Ids stay unparsed so presence checks run first
    pub fn into_ballot(self) -> Ballot {
        let target = match (self.submission_id, self.submission_index) {
            (Some(id), _) => Some(VoteTarget::Id(id)),
            (None, Some(index)) => Some(VoteTarget::Index(index)),
            (None, None) => None,
        };

        Ballot {
            contest_id: self.contest_id,
            voter: self.voter,
            target,
            tx_hash: self.tx_hash,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionsQuery {
    pub submission_ids: Option<String>,
}

impl SubmissionsQuery {
    /// Parse the comma separated id list
    pub fn ids(&self) -> Result<Vec<SubmissionId>> {
        let raw = self
            .submission_ids
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| ContestApiError::Validation("No submission IDs provided".to_string()))?;

        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| SubmissionId::parse(id).map_err(ContestApiError::from))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub account: Option<String>,
}

impl AccountQuery {
    pub fn account(&self) -> Result<&str> {
        self.account
            .as_deref()
            .map(str::trim)
            .filter(|account| !account.is_empty())
            .ok_or_else(|| ContestApiError::Validation("Account parameter is required".to_string()))
    }
}

/// `multipart/form-data` upload for `POST /api/pinFile`
#[derive(MultipartForm)]
pub struct PinFileForm {
    pub file: Option<UploadedBytes>,
}

/// Contest mutation acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct ContestActionResponse {
    pub message: String,
    pub contest: Contest,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub message: String,
    pub vote: Vote,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsResponse {
    pub ens_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account: String,
    pub balance: String,
}

/// Pinning service receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
    #[serde(rename = "PinSize")]
    pub pin_size: u64,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

/// Shape returned by `GET /api/contests/{id}`
pub type PopulatedContest = Contest<Submission>;

/// Display form of a wallet without an ENS name: `0x1234...abcd`
pub fn short_address(account: &str) -> String {
    let chars: Vec<char> = account.chars().collect();
    if chars.len() <= 10 {
        return account.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
