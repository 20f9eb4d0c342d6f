use crate::errors::ContestApiError;
use crate::metrics;
use crate::models::{
    AccountQuery, ContestActionResponse, CreateContestRequest, CreateSubmissionRequest,
    DistributionRequest, PinFileForm, RecordVoteRequest, SubmissionsQuery, UpdateOwnerRequest,
    VoteResponse,
};
use crate::services::ContestService;
use actix_multipart::{
    form::{MultipartForm, MultipartFormConfig},
    MultipartError,
};
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use serde_json::json;
use std::sync::Arc;

/// Upper bound for `POST /api/pinFile` bodies
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "contest-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus metrics
pub async fn metrics_endpoint() -> Result<HttpResponse, ContestApiError> {
    let body = metrics::metrics_handler()
        .map_err(|e| ContestApiError::Internal(format!("Failed to encode metrics: {}", e)))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

/// List all contests
pub async fn list_contests(
    service: web::Data<Arc<ContestService>>,
) -> Result<HttpResponse, ContestApiError> {
    let contests = service.list_contests()?;
    Ok(HttpResponse::Ok().json(contests))
}

/// Get contest by ID with its submissions
pub async fn get_contest(
    service: web::Data<Arc<ContestService>>,
    contest_id: web::Path<String>,
) -> Result<HttpResponse, ContestApiError> {
    let contest = service.get_contest(&contest_id)?;
    Ok(HttpResponse::Ok().json(contest))
}

/// Create contest
pub async fn create_contest(
    service: web::Data<Arc<ContestService>>,
    request: web::Json<CreateContestRequest>,
) -> Result<HttpResponse, ContestApiError> {
    let contest = service.create_contest(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(contest))
}

/// End contest
pub async fn end_contest(
    service: web::Data<Arc<ContestService>>,
    contest_id: web::Path<String>,
) -> Result<HttpResponse, ContestApiError> {
    let contest = service.end_contest(&contest_id).await?;
    Ok(HttpResponse::Ok().json(ContestActionResponse {
        message: "Contest ended successfully".to_string(),
        contest,
    }))
}

/// Transfer contest ownership
pub async fn update_contest_owner(
    service: web::Data<Arc<ContestService>>,
    contest_id: web::Path<String>,
    request: web::Json<UpdateOwnerRequest>,
) -> Result<HttpResponse, ContestApiError> {
    let contest = service
        .transfer_ownership(&contest_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ContestActionResponse {
        message: "Contest owner updated successfully".to_string(),
        contest,
    }))
}

/// Record the prize distribution transaction
pub async fn record_distribution(
    service: web::Data<Arc<ContestService>>,
    contest_id: web::Path<String>,
    request: web::Json<DistributionRequest>,
) -> Result<HttpResponse, ContestApiError> {
    let contest = service
        .record_distribution(&contest_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ContestActionResponse {
        message: "Distribution recorded successfully".to_string(),
        contest,
    }))
}

/// Contests the wallet submitted to
pub async fn submissions_by_wallet(
    service: web::Data<Arc<ContestService>>,
    wallet: web::Path<String>,
) -> Result<HttpResponse, ContestApiError> {
    let contests = service.contests_submitted_by_wallet(&wallet)?;
    Ok(HttpResponse::Ok().json(contests))
}

/// Contests the wallet voted in
pub async fn voted_contests(
    service: web::Data<Arc<ContestService>>,
    wallet: web::Path<String>,
) -> Result<HttpResponse, ContestApiError> {
    let contests = service.contests_voted_by_wallet(&wallet)?;
    Ok(HttpResponse::Ok().json(contests))
}

/// Submit an image to a contest
pub async fn create_submission(
    service: web::Data<Arc<ContestService>>,
    request: web::Json<CreateSubmissionRequest>,
) -> Result<HttpResponse, ContestApiError> {
    let submission = service.create_submission(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(submission))
}

/// Fetch submissions by a comma separated id list
pub async fn get_submissions(
    service: web::Data<Arc<ContestService>>,
    query: web::Query<SubmissionsQuery>,
) -> Result<HttpResponse, ContestApiError> {
    let submissions = service.get_submissions(&query)?;
    Ok(HttpResponse::Ok().json(submissions))
}

/// Owning contest of a submission, narrowed to that submission
pub async fn get_contest_by_submission(
    service: web::Data<Arc<ContestService>>,
    submission_id: web::Path<String>,
) -> Result<HttpResponse, ContestApiError> {
    let contest = service.get_contest_by_submission(&submission_id)?;
    Ok(HttpResponse::Ok().json(contest))
}

/// Record a vote
pub async fn record_vote(
    service: web::Data<Arc<ContestService>>,
    request: web::Json<RecordVoteRequest>,
) -> Result<HttpResponse, ContestApiError> {
    let vote = service.record_vote(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(VoteResponse {
        message: "Vote recorded successfully".to_string(),
        vote,
    }))
}

/// Pin the uploaded `file` field to IPFS
pub async fn pin_file(
    service: web::Data<Arc<ContestService>>,
    MultipartForm(form): MultipartForm<PinFileForm>,
) -> Result<HttpResponse, ContestApiError> {
    let file = form
        .file
        .ok_or_else(|| ContestApiError::Validation("No file uploaded".to_string()))?;

    let pin = service.pin_file(file.data.to_vec(), file.file_name).await?;
    Ok(HttpResponse::Ok().json(pin))
}

/// ENS name (or shortened address) of an account
pub async fn get_ens(
    service: web::Data<Arc<ContestService>>,
    query: web::Query<AccountQuery>,
) -> Result<HttpResponse, ContestApiError> {
    let response = service.ens_name(query.account()?).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Ether balance of an account
pub async fn get_balance(
    service: web::Data<Arc<ContestService>>,
    query: web::Query<AccountQuery>,
) -> Result<HttpResponse, ContestApiError> {
    let response = service.balance(query.account()?).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Malformed JSON bodies answer with the standard error envelope
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ContestApiError::Validation(format!("Invalid request body: {}", err)).into()
}

/// Malformed query strings answer with the standard error envelope
fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    ContestApiError::Validation(format!("Invalid query: {}", err)).into()
}

/// Non-multipart or oversized uploads answer with the standard error envelope
fn multipart_error_handler(err: MultipartError, _req: &HttpRequest) -> actix_web::Error {
    ContestApiError::Validation(format!("Invalid upload: {}", err)).into()
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics_endpoint))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/contests")
                        .route("", web::get().to(list_contests))
                        .route("", web::post().to(create_contest))
                        .route("/submissionsByWallet/{wallet}", web::get().to(submissions_by_wallet))
                        .route("/votedContests/{wallet}", web::get().to(voted_contests))
                        .route("/{contest_id}", web::get().to(get_contest))
                        .route("/{contest_id}/end", web::patch().to(end_contest))
                        .route("/{contest_id}/owner", web::patch().to(update_contest_owner))
                        .route("/{contest_id}/distribution", web::patch().to(record_distribution)),
                )
                .service(
                    web::scope("/submissions")
                        .route("", web::get().to(get_submissions))
                        .route("", web::post().to(create_submission))
                        .route("/{submission_id}", web::get().to(get_contest_by_submission)),
                )
                .route("/votes", web::post().to(record_vote))
                .service(
                    web::resource("/pinFile")
                        .app_data(
                            MultipartFormConfig::default()
                                .total_limit(MAX_UPLOAD_BYTES)
                                .memory_limit(MAX_UPLOAD_BYTES)
                                .error_handler(multipart_error_handler),
                        )
                        .route(web::post().to(pin_file)),
                )
                .route("/getEns", web::get().to(get_ens))
                .route("/getBalance", web::get().to(get_balance)),
        );
}
