use crate::chain_client::ChainClient;
use crate::errors::{ContestApiError, Result};
use crate::metrics;
use crate::models::{
    short_address, BalanceResponse, CreateContestRequest, CreateSubmissionRequest,
    DistributionRequest, EnsResponse, PinResponse, PopulatedContest, RecordVoteRequest,
    SubmissionsQuery, UpdateOwnerRequest,
};
use crate::pinning_client::PinningClient;
use contest_core::{Contest, ContestBook, ContestId, Submission, SubmissionId, Vote};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared by every worker
pub struct ContestService {
    pub book: Arc<ContestBook>,
    pub chain: Arc<dyn ChainClient>,
    pub pinning: Arc<dyn PinningClient>,
}

impl ContestService {
    pub fn new(
        book: Arc<ContestBook>,
        chain: Arc<dyn ChainClient>,
        pinning: Arc<dyn PinningClient>,
    ) -> Self {
        ContestService {
            book,
            chain,
            pinning,
        }
    }

    pub fn list_contests(&self) -> Result<Vec<Contest>> {
        Ok(self.book.list_contests()?)
    }

    pub fn get_contest(&self, contest_id: &str) -> Result<PopulatedContest> {
        let contest_id = ContestId::parse(contest_id)?;
        Ok(self.book.get_contest(contest_id)?)
    }

    pub async fn create_contest(&self, request: CreateContestRequest) -> Result<Contest> {
        let terms = request.into_terms()?;
        let contest = self.book.create_contest(terms).await?;
        metrics::CONTESTS_CREATED.inc();
        Ok(contest)
    }

    pub async fn end_contest(&self, contest_id: &str) -> Result<Contest> {
        let contest_id = ContestId::parse(contest_id)?;
        let contest = self.book.end_contest(contest_id).await?;
        metrics::CONTESTS_ENDED.inc();
        Ok(contest)
    }

    pub async fn transfer_ownership(
        &self,
        contest_id: &str,
        request: UpdateOwnerRequest,
    ) -> Result<Contest> {
        let contest_id = ContestId::parse(contest_id)?;
        Ok(self
            .book
            .transfer_ownership(contest_id, &request.new_owner)
            .await?)
    }

    pub async fn record_distribution(
        &self,
        contest_id: &str,
        request: DistributionRequest,
    ) -> Result<Contest> {
        let contest_id = ContestId::parse(contest_id)?;
        Ok(self
            .book
            .record_distribution(contest_id, &request.tx_hash)
            .await?)
    }

    pub fn contests_submitted_by_wallet(&self, wallet: &str) -> Result<Vec<Contest>> {
        Ok(self.book.contests_submitted_by_wallet(wallet)?)
    }

    pub fn contests_voted_by_wallet(&self, wallet: &str) -> Result<Vec<Contest>> {
        Ok(self.book.contests_voted_by_wallet(wallet)?)
    }

    pub async fn create_submission(&self, request: CreateSubmissionRequest) -> Result<Submission> {
        let submission = self.book.submit(request.into_new_submission()?).await?;
        metrics::SUBMISSIONS_ACCEPTED.inc();
        Ok(submission)
    }

    pub fn get_submissions(&self, query: &SubmissionsQuery) -> Result<Vec<Submission>> {
        let ids = query.ids()?;
        Ok(self.book.get_submissions(&ids)?)
    }

    pub fn get_contest_by_submission(&self, submission_id: &str) -> Result<Contest> {
        let submission_id = SubmissionId::parse(submission_id)?;
        Ok(self.book.get_contest_by_submission(submission_id)?)
    }

    pub async fn record_vote(&self, request: RecordVoteRequest) -> Result<Vote> {
        let result = self
            .book
            .record_vote(request.into_ballot())
            .await
            .map_err(ContestApiError::from);

        match &result {
            Ok(_) => metrics::VOTES_RECORDED.inc(),
            Err(e) => {
                warn!(reason = e.error_type(), "Vote rejected: {}", e);
                metrics::VOTES_REJECTED
                    .with_label_values(&[e.error_type()])
                    .inc();
            }
        }

        result
    }

    pub async fn pin_file(&self, bytes: Vec<u8>, filename: Option<String>) -> Result<PinResponse> {
        if bytes.is_empty() {
            return Err(ContestApiError::Validation("No file uploaded".to_string()));
        }

        let filename = filename
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "upload".to_string());

        let result = self.pinning.pin_file(bytes, &filename).await;
        metrics::observe_upstream("pinning", &result);
        result
    }

    /// ENS name of the account, or its shortened form when none resolves
    pub async fn ens_name(&self, account: &str) -> Result<EnsResponse> {
        let result = self.chain.lookup_address(account).await;
        metrics::observe_upstream("chain", &result);

        let ens_name = result?.unwrap_or_else(|| short_address(account));
        Ok(EnsResponse { ens_name })
    }

    pub async fn balance(&self, account: &str) -> Result<BalanceResponse> {
        let result = self.chain.get_balance(account).await;
        metrics::observe_upstream("chain", &result);

        Ok(BalanceResponse {
            account: account.to_string(),
            balance: result?,
        })
    }

    /// Flush the store once the server has stopped
    pub fn shutdown(&self) -> Result<()> {
        info!("Shutting down contest service");
        Ok(self.book.shutdown()?)
    }
}
