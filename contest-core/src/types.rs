//! Core document types
//!
//! Documents serialize with camelCase field names and an `_id` key, which is the
//! shape the web client consumes.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Wallet recorded for submissions that arrive without one
pub const UNKNOWN_WALLET: &str = "NA";

/// Canonical form of a wallet address
///
/// Hex addresses are case-insensitive, so `0x`-prefixed values are lowercased;
/// anything else is only trimmed.
pub fn normalize_wallet(raw: &str) -> String {
    let wallet = raw.trim();
    match wallet.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => wallet.to_ascii_lowercase(),
        _ => wallet.to_string(),
    }
}

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new time-ordered id
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Parse a client-supplied id, rejecting malformed input
            pub fn parse(raw: &str) -> Result<Self> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| Error::InvalidId(format!("{} id {:?}", $kind, raw)))
            }

            /// Raw key bytes
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            /// Rebuild from key bytes
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

document_id!(
    /// Contest identifier
    ContestId,
    "contest"
);
document_id!(
    /// Submission identifier
    SubmissionId,
    "submission"
);
document_id!(
    /// Vote identifier
    VoteId,
    "vote"
);

/// Contest document
///
/// `S` is the representation of the submissions list: ids as stored, or full
/// [`Submission`] records once populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest<S = SubmissionId> {
    /// Contest id
    #[serde(rename = "_id")]
    pub id: ContestId,

    /// Display name
    pub name: String,

    /// Contest opens
    pub start_date_time: DateTime<Utc>,

    /// Contest closes
    pub end_date_time: DateTime<Utc>,

    /// Fee paid per submission
    pub entry_fee: Decimal,

    /// Fee paid per vote
    pub voting_fee: Decimal,

    /// Share of pooled fees paid to the winner (percent)
    pub winner_percentage: Decimal,

    /// Number of voters drawn for a bonus prize
    pub number_of_lucky_voters: u32,

    /// Contest contract on chain
    pub contract_address: String,

    /// Fee token on chain
    pub token_address: String,

    /// Owner wallet
    pub contest_owner: String,

    /// Set once, never cleared
    #[serde(default)]
    pub contest_ended: bool,

    /// Prize distribution transaction
    #[serde(rename = "distributionTX", default)]
    pub distribution_tx: Option<String>,

    /// Submissions in intake order; the position is the submission index
    #[serde(default)]
    pub submissions: Vec<S>,

    /// Wallets that voted
    #[serde(default)]
    pub voters: BTreeSet<String>,

    /// Current leader
    #[serde(default)]
    pub winning_submission: Option<SubmissionId>,

    /// Vote count of the current leader
    #[serde(default)]
    pub highest_votes: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl<S> Contest<S> {
    /// Replace the submissions list with another representation
    pub fn with_submissions<T>(self, submissions: Vec<T>) -> Contest<T> {
        Contest {
            id: self.id,
            name: self.name,
            start_date_time: self.start_date_time,
            end_date_time: self.end_date_time,
            entry_fee: self.entry_fee,
            voting_fee: self.voting_fee,
            winner_percentage: self.winner_percentage,
            number_of_lucky_voters: self.number_of_lucky_voters,
            contract_address: self.contract_address,
            token_address: self.token_address,
            contest_owner: self.contest_owner,
            contest_ended: self.contest_ended,
            distribution_tx: self.distribution_tx,
            submissions,
            voters: self.voters,
            winning_submission: self.winning_submission,
            highest_votes: self.highest_votes,
            created_at: self.created_at,
        }
    }

    /// Whether this wallet already voted
    pub fn has_voted(&self, voter: &str) -> bool {
        self.voters.contains(&normalize_wallet(voter))
    }
}

impl Contest {
    /// Build a fresh contest from validated terms
    pub fn create(terms: NewContest) -> Result<Self> {
        terms.validate()?;

        Ok(Self {
            id: ContestId::new(),
            name: terms.name.trim().to_string(),
            start_date_time: terms.start_date_time,
            end_date_time: terms.end_date_time,
            entry_fee: terms.entry_fee,
            voting_fee: terms.voting_fee,
            winner_percentage: terms.winner_percentage,
            number_of_lucky_voters: terms.number_of_lucky_voters,
            contract_address: terms.contract_address,
            token_address: terms.token_address,
            contest_owner: terms.contest_owner,
            contest_ended: false,
            distribution_tx: None,
            submissions: Vec::new(),
            voters: BTreeSet::new(),
            winning_submission: None,
            highest_votes: 0,
            created_at: Utc::now(),
        })
    }

    /// Submission id at `index`, if any
    pub fn submission_at(&self, index: i64) -> Option<SubmissionId> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.submissions.get(i).copied())
    }

    /// Whether the submission belongs to this contest
    pub fn contains_submission(&self, id: SubmissionId) -> bool {
        self.submissions.contains(&id)
    }
}

/// Terms for a new contest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContest {
    /// Display name
    pub name: String,
    /// Contest opens
    pub start_date_time: DateTime<Utc>,
    /// Contest closes
    pub end_date_time: DateTime<Utc>,
    /// Fee paid per submission
    pub entry_fee: Decimal,
    /// Fee paid per vote
    pub voting_fee: Decimal,
    /// Share of pooled fees paid to the winner (percent)
    pub winner_percentage: Decimal,
    /// Number of voters drawn for a bonus prize
    pub number_of_lucky_voters: u32,
    /// Contest contract on chain
    pub contract_address: String,
    /// Fee token on chain
    pub token_address: String,
    /// Owner wallet
    pub contest_owner: String,
}

impl NewContest {
    /// Check the terms before a contest is created
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("contractAddress", &self.contract_address),
            ("tokenAddress", &self.token_address),
            ("contestOwner", &self.contest_owner),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidInput(format!("{} is required", field)));
            }
        }

        if self.end_date_time <= self.start_date_time {
            return Err(Error::InvalidInput(
                "endDateTime must be after startDateTime".to_string(),
            ));
        }

        if self.entry_fee.is_sign_negative() || self.voting_fee.is_sign_negative() {
            return Err(Error::InvalidInput("fees must not be negative".to_string()));
        }

        if self.winner_percentage.is_sign_negative() || self.winner_percentage > Decimal::from(100) {
            return Err(Error::InvalidInput(
                "winnerPercentage must be between 0 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

/// Submission document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Submission id
    #[serde(rename = "_id")]
    pub id: SubmissionId,

    /// Submitter wallet
    pub wallet: String,

    /// IPFS hash or URL of the image
    pub image: String,

    /// Owning contest
    pub contest: ContestId,

    /// Votes received
    #[serde(default)]
    pub votes: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Intake request for a submission
#[derive(Debug, Clone)]
pub struct NewSubmission {
    /// Target contest
    pub contest: ContestId,
    /// Submitter wallet, `"NA"` when absent
    pub wallet: Option<String>,
    /// Image reference
    pub image: Option<String>,
}

/// Vote document (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Vote id
    #[serde(rename = "_id")]
    pub id: VoteId,

    /// Contest voted in
    pub contest: ContestId,

    /// Submission voted for
    pub submission: SubmissionId,

    /// Voter wallet
    pub voter: String,

    /// Time of the vote
    pub vote_date: DateTime<Utc>,

    /// Fee payment transaction (not verified)
    #[serde(default)]
    pub tx_hash: String,
}

/// How a ballot addresses its submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteTarget {
    /// Position in the contest's submission list
    Index(i64),
    /// Stable submission id, unparsed
    Id(String),
}

/// Vote as received from a client, before validation
#[derive(Debug, Clone, Default)]
pub struct Ballot {
    /// Contest id
    pub contest_id: Option<String>,
    /// Voter wallet
    pub voter: Option<String>,
    /// Submission addressed by the vote
    pub target: Option<VoteTarget>,
    /// Fee payment transaction
    pub tx_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::terms;
    use chrono::Duration;

    #[test]
    fn test_create_contest_starts_open_and_empty() {
        let contest = Contest::create(terms()).unwrap();
        assert!(!contest.contest_ended);
        assert!(contest.submissions.is_empty());
        assert!(contest.voters.is_empty());
        assert_eq!(contest.winning_submission, None);
        assert_eq!(contest.highest_votes, 0);
    }

    #[test]
    fn test_create_rejects_inverted_dates() {
        let mut t = terms();
        t.end_date_time = t.start_date_time - Duration::hours(1);
        assert!(matches!(Contest::create(t), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_create_rejects_negative_fee() {
        let mut t = terms();
        t.voting_fee = Decimal::new(-1, 0);
        assert!(matches!(Contest::create(t), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_create_accepts_zero_fees() {
        let mut t = terms();
        t.entry_fee = Decimal::ZERO;
        t.voting_fee = Decimal::ZERO;
        assert!(Contest::create(t).is_ok());
    }

    #[test]
    fn test_create_rejects_blank_owner() {
        let mut t = terms();
        t.contest_owner = "  ".to_string();
        assert!(matches!(Contest::create(t), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_winner_percentage_bounds() {
        let mut t = terms();
        t.winner_percentage = Decimal::from(101);
        assert!(Contest::create(t).is_err());
    }

    #[test]
    fn test_id_parse() {
        let id = ContestId::new();
        assert_eq!(ContestId::parse(&id.to_string()).unwrap(), id);
        assert!(matches!(
            ContestId::parse("not-an-id"),
            Err(Error::InvalidId(_))
        ));
    }

    #[test]
    fn test_submission_at_rejects_negative_and_out_of_range() {
        let mut contest = Contest::create(terms()).unwrap();
        let first = SubmissionId::new();
        contest.submissions.push(first);

        assert_eq!(contest.submission_at(0), Some(first));
        assert_eq!(contest.submission_at(1), None);
        assert_eq!(contest.submission_at(-1), None);
    }

    #[test]
    fn test_contest_json_shape() {
        let contest = Contest::create(terms()).unwrap();
        let json = serde_json::to_value(&contest).unwrap();

        assert!(json.get("_id").is_some());
        assert!(json.get("startDateTime").is_some());
        assert!(json.get("distributionTX").is_some());
        assert_eq!(json["contestEnded"], serde_json::json!(false));
    }

    #[test]
    fn test_normalize_wallet() {
        assert_eq!(normalize_wallet(" 0xAbCdEF01 "), "0xabcdef01");
        assert_eq!(normalize_wallet("0XABC"), "0xabc");
        assert_eq!(normalize_wallet("alice.eth"), "alice.eth");
        assert_eq!(normalize_wallet(UNKNOWN_WALLET), UNKNOWN_WALLET);
    }
}
