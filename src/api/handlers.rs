// src/api/handlers.rs
// =============================================================================
// Request handlers for the jobs API.
//
// POST   /jobs       validate, register, start the job in the background
// GET    /jobs/{id}  failures recorded so far
// DELETE /jobs/{id}  forget the job (in-flight checks are not cancelled)
// =============================================================================

use super::{error::ApiError, AppState};
use crate::checker::LinkResult;
use crate::job::{run_job, Job, JobRequest};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

pub async fn create_job(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    // The body is decoded as JSON whatever Content-Type the client sent
    let request: JobRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("failed to parse JSON input: {e}")))?;

    let job = Job::new(request)?;

    // The job must exist in the store before we answer, so an immediate GET
    // never sees a 404
    state.store.create(&job.id).await?;
    info!(job_id = %job.id, url = %job.url, link_timeout = job.link_timeout, "job created");

    // Fire and forget: the handle is dropped, the job runs to completion
    tokio::spawn(run_job(
        job.clone(),
        state.store.clone(),
        state.max_concurrent_checks,
    ));

    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LinkResult>>, ApiError> {
    let failures = state.store.list_failures(&id).await?;
    Ok(Json(failures))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.remove(&id).await?;
    info!(job_id = %id, "job removed");
    Ok(StatusCode::OK)
}
