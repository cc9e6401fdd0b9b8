use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::MatchSettingStatus;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::match_setting;
use crate::entity::match_setting::TestCase;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::match_setting::*;
use crate::models::shared::ApiResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/match-settings",
    tag = "Match Settings",
    operation_id = "listMatchSettings",
    summary = "List the problem catalog",
    responses(
        (status = 200, description = "Every problem, newest first", body = ApiResponse<Vec<MatchSettingResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_match_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MatchSettingResponse>>>, AppError> {
    auth_user.require_staff()?;

    let rows = match_setting::Entity::find()
        .order_by_desc(match_setting::Column::CreatedAt)
        .all(&state.db)
        .await?;
    Ok(ApiResponse::ok(
        rows.into_iter().map(MatchSettingResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/match-settings",
    tag = "Match Settings",
    operation_id = "createMatchSetting",
    summary = "Create a problem",
    description = "New problems start as `draft` and must be published before a challenge can assign them.",
    request_body = CreateMatchSettingRequest,
    responses(
        (status = 201, description = "Problem created", body = ApiResponse<MatchSettingResponse>),
        (status = 400, description = "Validation error (INVALID_INPUT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 409, description = "Title already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.problem_title))]
pub async fn create_match_setting(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateMatchSettingRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;
    validate_create_match_setting(&payload)?;

    let to_json = |tests: &[TestCase]| {
        serde_json::to_value(tests).map_err(|e| AppError::Internal(format!("Test encode error: {e}")))
    };

    let now = chrono::Utc::now();
    let model = match_setting::ActiveModel {
        problem_title: Set(payload.problem_title.trim().to_string()),
        problem_description: Set(payload.problem_description),
        reference_solution: Set(payload.reference_solution),
        public_tests: Set(to_json(&payload.public_tests)?),
        private_tests: Set(to_json(&payload.private_tests)?),
        status: Set(MatchSettingStatus::Draft),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A problem with this title already exists".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(MatchSettingResponse::from(model)),
    ))
}

#[utoipa::path(
    get,
    path = "/match-settings/{id}",
    tag = "Match Settings",
    operation_id = "getMatchSetting",
    summary = "Get a problem",
    params(("id" = i32, Path, description = "Match setting ID")),
    responses(
        (status = 200, description = "Problem with every test", body = ApiResponse<MatchSettingResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_match_setting(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MatchSettingResponse>>, AppError> {
    auth_user.require_staff()?;

    let model = match_setting::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match setting {id} not found")))?;
    Ok(ApiResponse::ok(MatchSettingResponse::from(model)))
}

#[utoipa::path(
    post,
    path = "/match-settings/{id}/publish",
    tag = "Match Settings",
    operation_id = "publishMatchSetting",
    summary = "Mark a problem ready",
    description = "Moves a draft problem to `ready`. Publishing a ready problem is a no-op.",
    params(("id" = i32, Path, description = "Match setting ID")),
    responses(
        (status = 200, description = "Problem is ready", body = ApiResponse<MatchSettingResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn publish_match_setting(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MatchSettingResponse>>, AppError> {
    auth_user.require_staff()?;

    match_setting::Entity::update_many()
        .col_expr(
            match_setting::Column::Status,
            Expr::value(MatchSettingStatus::Ready),
        )
        .col_expr(match_setting::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(match_setting::Column::Id.eq(id))
        .filter(match_setting::Column::Status.eq(MatchSettingStatus::Draft))
        .exec(&state.db)
        .await?;

    let model = match_setting::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match setting {id} not found")))?;
    Ok(ApiResponse::ok(MatchSettingResponse::from(model)))
}
