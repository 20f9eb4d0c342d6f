//! Read-side projections over the document store

use crate::{
    types::{normalize_wallet, Contest, ContestId, Submission, SubmissionId},
    ContestBook, Error, Result,
};
use std::collections::{BTreeSet, HashSet};

impl ContestBook {
    /// All contests, unfiltered
    pub fn list_contests(&self) -> Result<Vec<Contest>> {
        self.storage.list_contests()
    }

    /// One contest with its submissions resolved to full records
    pub fn get_contest(&self, contest_id: ContestId) -> Result<Contest<Submission>> {
        let contest = self.storage.get_contest(contest_id)?;
        self.storage.populate(contest)
    }

    /// Submissions by id; an empty result is `SubmissionNotFound`
    pub fn get_submissions(&self, ids: &[SubmissionId]) -> Result<Vec<Submission>> {
        let submissions = self.storage.get_submissions(ids)?;
        if submissions.is_empty() {
            return Err(Error::SubmissionNotFound("Submissions not found".to_string()));
        }
        Ok(submissions)
    }

    /// Contests the wallet submitted to, each narrowed to the wallet's own submissions
    pub fn contests_submitted_by_wallet(&self, wallet: &str) -> Result<Vec<Contest>> {
        let own: HashSet<SubmissionId> = self
            .storage
            .submission_ids_by_wallet(&normalize_wallet(wallet))?
            .into_iter()
            .collect();
        if own.is_empty() {
            return Ok(Vec::new());
        }

        let contest_ids: BTreeSet<ContestId> = self
            .storage
            .get_submissions(&own.iter().copied().collect::<Vec<_>>())?
            .into_iter()
            .map(|submission| submission.contest)
            .collect();

        self.narrowed_contests(contest_ids, |id| own.contains(id))
    }

    /// Contests the wallet voted in, each narrowed to the submissions it voted for
    pub fn contests_voted_by_wallet(&self, wallet: &str) -> Result<Vec<Contest>> {
        let votes = self.storage.votes_by_voter(&normalize_wallet(wallet))?;

        let voted_for: HashSet<SubmissionId> = votes.iter().map(|vote| vote.submission).collect();
        let contest_ids: BTreeSet<ContestId> = votes.iter().map(|vote| vote.contest).collect();

        self.narrowed_contests(contest_ids, |id| voted_for.contains(id))
    }

    /// The submission's owning contest, narrowed to just that submission
    pub fn get_contest_by_submission(&self, submission_id: SubmissionId) -> Result<Contest> {
        let submission = self.storage.get_submission(submission_id)?;
        let contest = self.storage.get_contest(submission.contest)?;
        Ok(contest.with_submissions(vec![submission_id]))
    }

    /// Load contests in id order, keeping only submissions accepted by `keep`
    fn narrowed_contests<F>(&self, contest_ids: BTreeSet<ContestId>, keep: F) -> Result<Vec<Contest>>
    where
        F: Fn(&SubmissionId) -> bool,
    {
        let mut contests = Vec::with_capacity(contest_ids.len());
        for contest_id in contest_ids {
            let contest = match self.storage.get_contest(contest_id) {
                Ok(contest) => contest,
                Err(Error::ContestNotFound(_)) => {
                    tracing::warn!(contest_id = %contest_id, "Projection references missing contest");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let narrowed: Vec<SubmissionId> =
                contest.submissions.iter().copied().filter(|id| keep(id)).collect();
            if !narrowed.is_empty() {
                contests.push(contest.with_submissions(narrowed));
            }
        }
        Ok(contests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{open_book, terms};
    use crate::types::{Ballot, NewSubmission, VoteTarget};

    async fn submit(book: &ContestBook, contest: ContestId, wallet: &str) -> Submission {
        book.submit(NewSubmission {
            contest,
            wallet: Some(wallet.to_string()),
            image: Some("QmImage".to_string()),
        })
        .await
        .unwrap()
    }

    async fn vote(book: &ContestBook, contest: ContestId, voter: &str, index: i64) {
        book.record_vote(Ballot {
            contest_id: Some(contest.to_string()),
            voter: Some(voter.to_string()),
            target: Some(VoteTarget::Index(index)),
            tx_hash: Some("0xtx".to_string()),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_get_contest_populates_in_order() {
        let (book, _temp) = open_book();
        let contest = book.create_contest(terms()).await.unwrap();
        let a = submit(&book, contest.id, "0xa").await;
        let b = submit(&book, contest.id, "0xb").await;

        let populated = book.get_contest(contest.id).unwrap();
        let ids: Vec<_> = populated.submissions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_get_missing_contest() {
        let (book, _temp) = open_book();
        assert!(matches!(
            book.get_contest(ContestId::new()),
            Err(Error::ContestNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_contests_submitted_by_wallet() {
        let (book, _temp) = open_book();
        let first = book.create_contest(terms()).await.unwrap();
        let second = book.create_contest(terms()).await.unwrap();
        let untouched = book.create_contest(terms()).await.unwrap();

        let mine_1 = submit(&book, first.id, "0xme").await;
        submit(&book, first.id, "0xother").await;
        let mine_2 = submit(&book, first.id, "0xme").await;
        let mine_3 = submit(&book, second.id, "0xme").await;
        submit(&book, untouched.id, "0xother").await;

        let contests = book.contests_submitted_by_wallet("0xme").unwrap();
        assert_eq!(contests.len(), 2);

        let in_first = contests.iter().find(|c| c.id == first.id).unwrap();
        assert_eq!(in_first.submissions, vec![mine_1.id, mine_2.id]);
        let in_second = contests.iter().find(|c| c.id == second.id).unwrap();
        assert_eq!(in_second.submissions, vec![mine_3.id]);
    }

    #[tokio::test]
    async fn test_contests_submitted_by_unknown_wallet() {
        let (book, _temp) = open_book();
        let contest = book.create_contest(terms()).await.unwrap();
        submit(&book, contest.id, "0xother").await;

        assert!(book.contests_submitted_by_wallet("0xnobody").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contests_voted_by_wallet() {
        let (book, _temp) = open_book();
        let first = book.create_contest(terms()).await.unwrap();
        let second = book.create_contest(terms()).await.unwrap();
        submit(&book, first.id, "0xa").await;
        let voted = submit(&book, first.id, "0xb").await;
        submit(&book, second.id, "0xc").await;

        vote(&book, first.id, "0xvoter", 1).await;
        vote(&book, second.id, "0xsomeone", 0).await;

        let contests = book.contests_voted_by_wallet("0xvoter").unwrap();
        assert_eq!(contests.len(), 1);
        assert_eq!(contests[0].id, first.id);
        assert_eq!(contests[0].submissions, vec![voted.id]);
    }

    #[tokio::test]
    async fn test_get_contest_by_submission() {
        let (book, _temp) = open_book();
        let contest = book.create_contest(terms()).await.unwrap();
        submit(&book, contest.id, "0xa").await;
        let target = submit(&book, contest.id, "0xb").await;

        let narrowed = book.get_contest_by_submission(target.id).unwrap();
        assert_eq!(narrowed.id, contest.id);
        assert_eq!(narrowed.submissions, vec![target.id]);

        assert!(matches!(
            book.get_contest_by_submission(SubmissionId::new()),
            Err(Error::SubmissionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_submissions_none_found() {
        let (book, _temp) = open_book();
        assert!(matches!(
            book.get_submissions(&[SubmissionId::new()]),
            Err(Error::SubmissionNotFound(_))
        ));
    }
}
