use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContestApiError>;

#[derive(Error, Debug)]
pub enum ContestApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("No IPFS hash provided")]
    MissingContentRef,

    #[error("Contest not found")]
    ContestNotFound(String),

    #[error("Submission not found")]
    SubmissionNotFound(String),

    #[error("Vote not found")]
    VoteNotFound(String),

    #[error("Voter has already voted.")]
    DuplicateVote { contest: String, voter: String },

    #[error("Contest has ended")]
    ContestEnded(String),

    #[error("Contest has not ended")]
    ContestNotEnded(String),

    #[error("Prize distribution already recorded")]
    DistributionAlreadyRecorded(String),

    #[error("Chain RPC error: {0}")]
    ChainError(String),

    #[error("Pinning service error: {0}")]
    PinningError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<contest_core::Error> for ContestApiError {
    fn from(err: contest_core::Error) -> Self {
        use contest_core::Error as Core;

        match err {
            Core::InvalidId(msg) => ContestApiError::InvalidId(msg),
            Core::InvalidInput(msg) => ContestApiError::Validation(msg),
            Core::MissingContentRef => ContestApiError::MissingContentRef,
            Core::ContestNotFound(id) => ContestApiError::ContestNotFound(id),
            Core::SubmissionNotFound(id) => ContestApiError::SubmissionNotFound(id),
            Core::VoteNotFound(id) => ContestApiError::VoteNotFound(id),
            Core::DuplicateVote { contest, voter } => {
                ContestApiError::DuplicateVote { contest, voter }
            }
            Core::ContestEnded(id) => ContestApiError::ContestEnded(id),
            Core::ContestNotEnded(id) => ContestApiError::ContestNotEnded(id),
            Core::DistributionAlreadyRecorded(id) => {
                ContestApiError::DistributionAlreadyRecorded(id)
            }
            other @ (Core::Storage(_) | Core::Serialization(_) | Core::Io(_)) => {
                ContestApiError::Storage(other.to_string())
            }
            Core::Config(msg) => ContestApiError::Internal(msg),
        }
    }
}

impl ResponseError for ContestApiError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Server-side details stay in the log
        let error_message = if status_code.is_server_error() {
            tracing::error!(error = %self, error_type = self.error_type(), "Request failed");
            match self {
                ContestApiError::ChainError(_) | ContestApiError::PinningError(_) => {
                    "Upstream service error".to_string()
                }
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": error_message,
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ContestApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ContestApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ContestApiError::MissingContentRef => StatusCode::BAD_REQUEST,
            ContestApiError::ContestNotFound(_) => StatusCode::NOT_FOUND,
            ContestApiError::SubmissionNotFound(_) => StatusCode::NOT_FOUND,
            ContestApiError::VoteNotFound(_) => StatusCode::NOT_FOUND,
            ContestApiError::DuplicateVote { .. } => StatusCode::BAD_REQUEST,
            ContestApiError::ContestEnded(_) => StatusCode::CONFLICT,
            ContestApiError::ContestNotEnded(_) => StatusCode::CONFLICT,
            ContestApiError::DistributionAlreadyRecorded(_) => StatusCode::CONFLICT,
            ContestApiError::ChainError(_) => StatusCode::BAD_GATEWAY,
            ContestApiError::PinningError(_) => StatusCode::BAD_GATEWAY,
            ContestApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ContestApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ContestApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ContestApiError::Validation(_) => "validation_error",
            ContestApiError::InvalidId(_) => "invalid_id",
            ContestApiError::MissingContentRef => "validation_error",
            ContestApiError::ContestNotFound(_) => "not_found",
            ContestApiError::SubmissionNotFound(_) => "not_found",
            ContestApiError::VoteNotFound(_) => "not_found",
            ContestApiError::DuplicateVote { .. } => "duplicate_vote",
            ContestApiError::ContestEnded(_) => "contest_ended",
            ContestApiError::ContestNotEnded(_) => "contest_not_ended",
            ContestApiError::DistributionAlreadyRecorded(_) => "distribution_recorded",
            ContestApiError::ChainError(_) => "external_service_error",
            ContestApiError::PinningError(_) => "external_service_error",
            ContestApiError::Storage(_) => "storage_error",
            ContestApiError::Internal(_) => "internal_error",
        }
    }
}
