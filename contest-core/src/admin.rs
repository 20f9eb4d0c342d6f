//! Contest administration: creation, ending, ownership and prize distribution

use crate::{
    types::{Contest, ContestId, NewContest},
    ContestBook, Error, Result,
};

impl ContestBook {
    /// Create a contest from validated terms
    pub async fn create_contest(&self, terms: NewContest) -> Result<Contest> {
        let contest = Contest::create(terms)?;
        self.storage.put_contest(&contest)?;

        tracing::info!(
            contest_id = %contest.id,
            owner = %contest.contest_owner,
            "Contest created"
        );

        Ok(contest)
    }

    /// Close a contest to further submissions and votes
    ///
    /// The flag flips exactly once; ending an ended contest is rejected.
    pub async fn end_contest(&self, contest_id: ContestId) -> Result<Contest> {
        let _guard = self.locks.acquire(contest_id).await;

        let contest = self.storage.update_contest(contest_id, |contest| {
            if contest.contest_ended {
                return Err(Error::ContestEnded(contest_id.to_string()));
            }
            contest.contest_ended = true;
            Ok(())
        })?;

        tracing::info!(
            contest_id = %contest_id,
            winner = ?contest.winning_submission,
            highest_votes = contest.highest_votes,
            "Contest ended"
        );

        Ok(contest)
    }

    /// Hand the contest to a new owner wallet
    pub async fn transfer_ownership(&self, contest_id: ContestId, new_owner: &str) -> Result<Contest> {
        let new_owner = new_owner.trim();
        if new_owner.is_empty() {
            return Err(Error::InvalidInput("New owner address is required".to_string()));
        }

        let _guard = self.locks.acquire(contest_id).await;

        let contest = self.storage.update_contest(contest_id, |contest| {
            contest.contest_owner = new_owner.to_string();
            Ok(())
        })?;

        tracing::info!(contest_id = %contest_id, owner = %new_owner, "Contest owner updated");

        Ok(contest)
    }

    /// Record the prize distribution transaction of an ended contest
    pub async fn record_distribution(&self, contest_id: ContestId, tx_hash: &str) -> Result<Contest> {
        let tx_hash = tx_hash.trim();
        if tx_hash.is_empty() {
            return Err(Error::InvalidInput("txHash is required".to_string()));
        }

        let _guard = self.locks.acquire(contest_id).await;

        let contest = self.storage.update_contest(contest_id, |contest| {
            if !contest.contest_ended {
                return Err(Error::ContestNotEnded(contest_id.to_string()));
            }
            if contest.distribution_tx.is_some() {
                return Err(Error::DistributionAlreadyRecorded(contest_id.to_string()));
            }
            contest.distribution_tx = Some(tx_hash.to_string());
            Ok(())
        })?;

        tracing::info!(contest_id = %contest_id, tx_hash = %tx_hash, "Prize distribution recorded");

        Ok(contest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{open_book, terms};

    #[tokio::test]
    async fn test_create_contest_is_stored() {
        let (book, _temp) = open_book();

        let contest = book.create_contest(terms()).await.unwrap();

        let stored = book.get_contest(contest.id).unwrap();
        assert!(!stored.contest_ended);
        assert!(stored.submissions.is_empty());
    }

    #[tokio::test]
    async fn test_create_contest_rejects_invalid_terms() {
        let (book, _temp) = open_book();
        let mut bad = terms();
        bad.name = String::new();

        assert!(matches!(
            book.create_contest(bad).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(book.list_contests().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_contest_once() {
        let (book, _temp) = open_book();
        let contest = book.create_contest(terms()).await.unwrap();

        let ended = book.end_contest(contest.id).await.unwrap();
        assert!(ended.contest_ended);

        assert!(matches!(
            book.end_contest(contest.id).await,
            Err(Error::ContestEnded(_))
        ));
    }

    #[tokio::test]
    async fn test_end_missing_contest() {
        let (book, _temp) = open_book();
        assert!(matches!(
            book.end_contest(ContestId::new()).await,
            Err(Error::ContestNotFound(_))
        ));
        assert!(book.transfer_ownership(ContestId::new(), "0xowner").await.is_err());
        assert!(book.record_distribution(ContestId::new(), "0xpayout").await.is_err());
        assert!(book.locks.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_ownership() {
        let (book, _temp) = open_book();
        let contest = book.create_contest(terms()).await.unwrap();

        let updated = book.transfer_ownership(contest.id, "0xnewowner").await.unwrap();
        assert_eq!(updated.contest_owner, "0xnewowner");

        assert!(matches!(
            book.transfer_ownership(contest.id, " ").await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_record_distribution_requires_ended_contest() {
        let (book, _temp) = open_book();
        let contest = book.create_contest(terms()).await.unwrap();

        assert!(matches!(
            book.record_distribution(contest.id, "0xpayout").await,
            Err(Error::ContestNotEnded(_))
        ));

        book.end_contest(contest.id).await.unwrap();
        let paid = book.record_distribution(contest.id, "0xpayout").await.unwrap();
        assert_eq!(paid.distribution_tx.as_deref(), Some("0xpayout"));

        assert!(matches!(
            book.record_distribution(contest.id, "0xagain").await,
            Err(Error::DistributionAlreadyRecorded(_))
        ));
    }
}
