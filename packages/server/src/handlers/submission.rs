use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::ApiResponse;
use crate::models::submission::{SubmissionResponse, SubmitCodeRequest, validate_submit_code};
use crate::services::submission::{SubmissionLookup, SubmissionService, SubmitResult};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/submissions",
    tag = "Submissions",
    operation_id = "submitCode",
    summary = "Submit code for a match",
    description = "Runs the code against the public and private tests and stores the result. Manual submissions become the final submission; autosaves only while no manual submission exists.",
    request_body = SubmitCodeRequest,
    responses(
        (status = 201, description = "Submission stored", body = ApiResponse<SubmissionResponse>),
        (status = 400, description = "Validation error (INVALID_INPUT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not your match (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Match not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Coding phase not running (INVALID_PHASE)", body = ErrorBody),
        (status = 503, description = "Code runner unavailable (RUNNER_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(match_id = payload.match_id, user_id = auth_user.user_id))]
pub async fn submit_code(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_student()?;
    validate_submit_code(&payload)?;

    let result = SubmissionService::new(&state.db)
        .submit(
            state.runner.as_ref(),
            auth_user.user_id,
            payload.match_id,
            payload.code,
            payload.is_automatic,
        )
        .await?;

    match result {
        SubmitResult::Submitted(model) => Ok((
            StatusCode::CREATED,
            ApiResponse::ok(SubmissionResponse::from(model)),
        )),
        SubmitResult::MatchNotFound => Err(AppError::NotFound(format!(
            "Match {} not found",
            payload.match_id
        ))),
        SubmitResult::NotOwner => Err(AppError::PermissionDenied),
        SubmitResult::InvalidPhase(status) => Err(AppError::InvalidPhase(format!(
            "Submissions are closed while the challenge is {status}"
        ))),
        SubmitResult::DeadlinePassed => Err(AppError::InvalidPhase(
            "The coding phase has ended".into(),
        )),
        SubmitResult::RunnerUnavailable(msg) => Err(AppError::RunnerUnavailable(msg)),
    }
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    tag = "Submissions",
    operation_id = "getSubmission",
    summary = "Get a submission",
    description = "Owners and staff may read a submission. Private test results are reduced to counts.",
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission", body = ApiResponse<SubmissionResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<SubmissionResponse>>, AppError> {
    match SubmissionService::new(&state.db)
        .find_for_viewer(id, auth_user.user_id, auth_user.is_staff())
        .await?
    {
        SubmissionLookup::Found(model) => Ok(ApiResponse::ok(SubmissionResponse::from(model))),
        SubmissionLookup::NotFound => Err(AppError::NotFound(format!("Submission {id} not found"))),
        SubmissionLookup::Forbidden => Err(AppError::PermissionDenied),
    }
}
