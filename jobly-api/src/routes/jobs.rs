/// Job endpoints
///
/// - `POST /jobs` (admin)
/// - `GET /jobs?title=&minSalary=&hasEquity=`
/// - `GET /jobs/:id`
/// - `PATCH /jobs/:id` (admin)
/// - `DELETE /jobs/:id` (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{parse_job_id, QueryPairs, ValidatedJson, ValidatedPatch},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use jobly_shared::models::job::{Job, JobFilters, NewJob};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

/// New job request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJobRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(range(min = 0, message = "Salary must be >= 0"))]
    pub salary: Option<i32>,

    pub equity: Option<Decimal>,

    #[validate(length(min = 1, max = 25, message = "Company handle must be 1-25 characters"))]
    pub company_handle: String,
}

/// Job update request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,

    #[validate(range(min = 0, message = "Salary must be >= 0"))]
    pub salary: Option<i32>,

    pub equity: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job: Job,
}

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: i32,
}

/// Equity is a fraction of the company
fn check_equity(equity: Option<Decimal>) -> ApiResult<()> {
    match equity {
        Some(value) if value < Decimal::ZERO || value > Decimal::ONE => {
            Err(ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "equity".to_string(),
                message: "Equity must be between 0 and 1".to_string(),
            }]))
        }
        _ => Ok(()),
    }
}

pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewJobRequest>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    check_equity(req.equity)?;

    let job = Job::create(
        &state.db,
        NewJob {
            title: req.title,
            salary: req.salary,
            equity: req.equity,
            company_handle: req.company_handle,
        },
    )
    .await?;

    info!(id = job.id, company = %job.company_handle, "Created job");
    Ok((StatusCode::CREATED, Json(JobResponse { job })))
}

pub async fn list(State(state): State<AppState>, query: QueryPairs) -> ApiResult<Json<JobsResponse>> {
    let filters = JobFilters::from_params(query.iter())?;
    let jobs = Job::find_all(&state.db, &filters).await?;

    Ok(Json(JobsResponse { jobs }))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<JobResponse>> {
    let job = Job::get(&state.db, parse_job_id(&id)?).await?;
    Ok(Json(JobResponse { job }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedPatch { data, patch }: ValidatedPatch<UpdateJobRequest>,
) -> ApiResult<Json<JobResponse>> {
    let id = parse_job_id(&id)?;
    check_equity(data.equity)?;

    let job = Job::update(&state.db, id, &patch).await?;

    info!(id, "Updated job");
    Ok(Json(JobResponse { job }))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<DeletedResponse>> {
    let id = parse_job_id(&id)?;
    Job::remove(&state.db, id).await?;

    info!(id, "Deleted job");
    Ok(Json(DeletedResponse { deleted: id }))
}
