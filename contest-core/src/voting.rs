//! Voting ledger
//!
//! A vote is checked and applied while the contest lock is held, then committed as
//! one batch: the vote record, the submission tally, and the contest's voters and
//! winner pointer. Concurrent ballots for one contest are therefore serialized and
//! neither the duplicate check nor the winner comparison can observe stale state.

use crate::{
    types::{
        normalize_wallet, Ballot, Contest, ContestId, Submission, SubmissionId, Vote, VoteId,
        VoteTarget,
    },
    ContestBook, Error, Result,
};
use chrono::Utc;

/// Apply one vote's tally to the contest's winner pointer
///
/// The leader changes only when there is none yet or the new count strictly exceeds
/// the current highest; ties keep the earlier leader.
pub fn reevaluate_winner(contest: &mut Contest, submission: &Submission) {
    if contest.winning_submission.is_none() || submission.votes > contest.highest_votes {
        contest.winning_submission = Some(submission.id);
        contest.highest_votes = submission.votes;
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("Missing required field: {}", field)))
}

impl ContestBook {
    /// Record one wallet's vote for a submission
    ///
    /// Checks run in order and the first failure wins: input present, ids well-formed,
    /// contest exists, contest open, wallet has not voted, submission resolves.
    pub async fn record_vote(&self, ballot: Ballot) -> Result<Vote> {
        let contest_id = required(&ballot.contest_id, "contestId")?;
        let voter = normalize_wallet(required(&ballot.voter, "voter")?);
        let target = ballot
            .target
            .ok_or_else(|| Error::InvalidInput("Missing required field: submissionIndex".to_string()))?;
        let tx_hash = required(&ballot.tx_hash, "txHash")?.to_string();
        let contest_id = ContestId::parse(contest_id)?;
        let target = Target::parse(target)?;

        let _guard = self.locks.acquire(contest_id).await;

        let mut contest = self.storage.get_contest(contest_id)?;

        if contest.contest_ended {
            return Err(Error::ContestEnded(contest_id.to_string()));
        }

        if contest.has_voted(&voter) {
            tracing::warn!(contest_id = %contest_id, voter = %voter, "Duplicate vote rejected");
            return Err(Error::DuplicateVote {
                contest: contest_id.to_string(),
                voter,
            });
        }

        let submission_id = resolve_target(&contest, target)?;
        let mut submission = self.storage.get_submission(submission_id)?;

        let vote = Vote {
            id: VoteId::new(),
            contest: contest_id,
            submission: submission.id,
            voter: voter.clone(),
            vote_date: Utc::now(),
            tx_hash,
        };

        submission.votes += 1;
        contest.voters.insert(voter);
        reevaluate_winner(&mut contest, &submission);

        self.storage.commit_vote(&vote, &submission, &contest)?;

        tracing::info!(
            contest_id = %contest_id,
            submission_id = %submission.id,
            voter = %vote.voter,
            votes = submission.votes,
            leader = ?contest.winning_submission,
            "Vote recorded"
        );

        Ok(vote)
    }
}

/// Ballot target with its id parsed
enum Target {
    Index(i64),
    Id(SubmissionId),
}

impl Target {
    fn parse(target: VoteTarget) -> Result<Self> {
        match target {
            VoteTarget::Index(index) => Ok(Self::Index(index)),
            VoteTarget::Id(raw) => SubmissionId::parse(&raw).map(Self::Id),
        }
    }
}

/// Translate a ballot target to the stable submission id
fn resolve_target(contest: &Contest, target: Target) -> Result<SubmissionId> {
    match target {
        Target::Index(index) => contest
            .submission_at(index)
            .ok_or_else(|| Error::SubmissionNotFound(format!("index {}", index))),
        Target::Id(id) if contest.contains_submission(id) => Ok(id),
        Target::Id(id) => Err(Error::SubmissionNotFound(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{open_book, terms};
    use crate::types::NewSubmission;
    use std::sync::Arc;

    async fn contest_with_entries(book: &ContestBook, entries: usize) -> Contest {
        let contest = book.create_contest(terms()).await.unwrap();
        for i in 0..entries {
            book.submit(NewSubmission {
                contest: contest.id,
                wallet: Some(format!("0xartist{}", i)),
                image: Some(format!("QmImage{}", i)),
            })
            .await
            .unwrap();
        }
        book.storage.get_contest(contest.id).unwrap()
    }

    fn ballot(contest: ContestId, voter: &str, index: i64, tx: &str) -> Ballot {
        Ballot {
            contest_id: Some(contest.to_string()),
            voter: Some(voter.to_string()),
            target: Some(VoteTarget::Index(index)),
            tx_hash: Some(tx.to_string()),
        }
    }

    #[tokio::test]
    async fn test_vote_updates_tally_and_winner() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 2).await;

        let vote = book.record_vote(ballot(contest.id, "0xA", 1, "tx1")).await.unwrap();
        assert_eq!(vote.submission, contest.submissions[1]);
        assert_eq!(vote.tx_hash, "tx1");

        let stored = book.storage.get_contest(contest.id).unwrap();
        assert_eq!(stored.winning_submission, Some(contest.submissions[1]));
        assert_eq!(stored.highest_votes, 1);
        assert_eq!(book.storage.get_submission(contest.submissions[1]).unwrap().votes, 1);
    }

    #[tokio::test]
    async fn test_index_zero_is_valid() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 1).await;

        let vote = book.record_vote(ballot(contest.id, "0xA", 0, "tx1")).await.unwrap();
        assert_eq!(vote.submission, contest.submissions[0]);
    }

    #[tokio::test]
    async fn test_duplicate_vote_rejected() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 2).await;

        book.record_vote(ballot(contest.id, "0xA", 0, "tx1")).await.unwrap();
        let second = book.record_vote(ballot(contest.id, "0xA", 1, "tx2")).await;

        assert!(matches!(second, Err(Error::DuplicateVote { .. })));
        let stored = book.storage.get_contest(contest.id).unwrap();
        assert_eq!(stored.voters.len(), 1);
        assert_eq!(book.storage.get_submission(contest.submissions[1]).unwrap().votes, 0);
    }

    #[tokio::test]
    async fn test_tie_keeps_earlier_leader_and_strict_overtake_replaces_it() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 2).await;
        let (s0, s1) = (contest.submissions[0], contest.submissions[1]);

        book.record_vote(ballot(contest.id, "0xA", 0, "tx1")).await.unwrap();
        book.record_vote(ballot(contest.id, "0xB", 1, "tx2")).await.unwrap();

        let tied = book.storage.get_contest(contest.id).unwrap();
        assert_eq!(tied.winning_submission, Some(s0));
        assert_eq!(tied.highest_votes, 1);

        book.record_vote(ballot(contest.id, "0xC", 1, "tx3")).await.unwrap();

        let overtaken = book.storage.get_contest(contest.id).unwrap();
        assert_eq!(overtaken.winning_submission, Some(s1));
        assert_eq!(overtaken.highest_votes, 2);
    }

    #[tokio::test]
    async fn test_missing_fields_are_invalid_input() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 1).await;

        let mut no_tx = ballot(contest.id, "0xA", 0, "tx1");
        no_tx.tx_hash = None;
        let mut no_target = ballot(contest.id, "0xA", 0, "tx1");
        no_target.target = None;
        let mut blank_voter = ballot(contest.id, "0xA", 0, "tx1");
        blank_voter.voter = Some(String::new());

        for bad in [no_tx, no_target, blank_voter, Ballot::default()] {
            assert!(matches!(
                book.record_vote(bad).await,
                Err(Error::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_check_order_contest_before_submission() {
        let (book, _temp) = open_book();

        let missing = book
            .record_vote(ballot(ContestId::new(), "0xA", 99, "tx1"))
            .await;
        assert!(matches!(missing, Err(Error::ContestNotFound(_))));

        let contest = contest_with_entries(&book, 1).await;
        book.record_vote(ballot(contest.id, "0xA", 0, "tx1")).await.unwrap();

        // Duplicate wins over a bad index
        let duplicate = book.record_vote(ballot(contest.id, "0xA", 99, "tx2")).await;
        assert!(matches!(duplicate, Err(Error::DuplicateVote { .. })));
    }

    #[tokio::test]
    async fn test_unknown_submission() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 1).await;
        let other = contest_with_entries(&book, 1).await;

        for target in [
            VoteTarget::Index(1),
            VoteTarget::Index(-1),
            VoteTarget::Id(other.submissions[0].to_string()),
        ] {
            let mut b = ballot(contest.id, "0xA", 0, "tx1");
            b.target = Some(target);
            assert!(matches!(
                book.record_vote(b).await,
                Err(Error::SubmissionNotFound(_))
            ));
        }
        assert!(book.storage.get_contest(contest.id).unwrap().voters.is_empty());
    }

    #[tokio::test]
    async fn test_vote_by_submission_id() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 2).await;

        let mut b = ballot(contest.id, "0xA", 0, "tx1");
        b.target = Some(VoteTarget::Id(contest.submissions[1].to_string()));

        let vote = book.record_vote(b).await.unwrap();
        assert_eq!(vote.submission, contest.submissions[1]);
    }

    #[tokio::test]
    async fn test_ended_contest_rejects_votes() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 1).await;
        book.end_contest(contest.id).await.unwrap();

        assert!(matches!(
            book.record_vote(ballot(contest.id, "0xA", 0, "tx1")).await,
            Err(Error::ContestEnded(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_contest_id() {
        let (book, _temp) = open_book();
        let mut b = ballot(ContestId::new(), "0xA", 0, "tx1");
        b.contest_id = Some("65f0c0ffee".to_string());

        assert!(matches!(book.record_vote(b).await, Err(Error::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_missing_field_reported_before_malformed_submission_id() {
        let (book, _temp) = open_book();
        let b = Ballot {
            contest_id: None,
            voter: Some("0xA".to_string()),
            target: Some(VoteTarget::Id("not-a-uuid".to_string())),
            tx_hash: Some("tx1".to_string()),
        };

        assert!(matches!(book.record_vote(b).await, Err(Error::InvalidInput(_))));

        let contest = contest_with_entries(&book, 1).await;
        let mut malformed = ballot(contest.id, "0xA", 0, "tx1");
        malformed.target = Some(VoteTarget::Id("not-a-uuid".to_string()));
        assert!(matches!(
            book.record_vote(malformed).await,
            Err(Error::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn test_wallet_case_does_not_allow_second_vote() {
        let (book, _temp) = open_book();
        let contest = contest_with_entries(&book, 2).await;

        let vote = book
            .record_vote(ballot(contest.id, "0xAbCdEf", 0, "tx1"))
            .await
            .unwrap();
        assert_eq!(vote.voter, "0xabcdef");

        let again = book.record_vote(ballot(contest.id, "0xabcdef", 1, "tx2")).await;
        assert!(matches!(again, Err(Error::DuplicateVote { .. })));

        let voted = book.contests_voted_by_wallet("0XABCDEF").unwrap();
        assert_eq!(voted.len(), 1);
    }

    #[tokio::test]
    async fn test_votes_on_missing_contests_leave_no_lock_entries() {
        let (book, _temp) = open_book();

        for _ in 0..100 {
            let missing = book
                .record_vote(ballot(ContestId::new(), "0xA", 0, "tx1"))
                .await;
            assert!(matches!(missing, Err(Error::ContestNotFound(_))));
        }

        assert!(book.locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_votes_record_once() {
        let (book, _temp) = open_book();
        let book = Arc::new(book);
        let contest = contest_with_entries(&book, 2).await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let book = book.clone();
                tokio::spawn(async move {
                    book.record_vote(ballot(contest.id, "0xSAME", i % 2, "tx")).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(book.storage.votes_by_voter("0xsame").unwrap().len(), 1);
    }
}
