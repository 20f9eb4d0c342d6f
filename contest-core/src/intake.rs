//! Submission intake
//!
//! A submission, its contest's appended id and the wallet index entry are committed
//! in one batch while the contest lock is held, so the position assigned to the
//! submission is exactly its index in the contest.

use crate::{
    types::{normalize_wallet, NewSubmission, Submission, SubmissionId, UNKNOWN_WALLET},
    ContestBook, Error, Result,
};
use chrono::Utc;

impl ContestBook {
    /// Attach a new submission to an open contest
    pub async fn submit(&self, request: NewSubmission) -> Result<Submission> {
        let image = request
            .image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
            .ok_or(Error::MissingContentRef)?
            .to_string();

        let wallet = request
            .wallet
            .as_deref()
            .map(normalize_wallet)
            .filter(|wallet| !wallet.is_empty())
            .unwrap_or_else(|| UNKNOWN_WALLET.to_string());

        let _guard = self.locks.acquire(request.contest).await;

        let mut contest = self.storage.get_contest(request.contest)?;
        if contest.contest_ended {
            return Err(Error::ContestEnded(contest.id.to_string()));
        }

        let submission = Submission {
            id: SubmissionId::new(),
            wallet,
            image,
            contest: contest.id,
            votes: 0,
            created_at: Utc::now(),
        };
        contest.submissions.push(submission.id);

        self.storage.commit_submission(&submission, &contest)?;

        tracing::info!(
            contest_id = %contest.id,
            submission_id = %submission.id,
            index = contest.submissions.len() - 1,
            wallet = %submission.wallet,
            "Submission accepted"
        );

        Ok(submission)
    }
}
