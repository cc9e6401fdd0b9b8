use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::reward::*;
use crate::models::shared::ApiResponse;
use crate::services::profile::ProfileService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/rules",
    tag = "Rewards",
    operation_id = "getRules",
    summary = "Badge and title rules",
    description = "The badge catalog grouped by category and the title ladder ordered by rank.",
    responses(
        (status = 200, description = "Reward rules", body = ApiResponse<RulesResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn rules(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RulesResponse>>, AppError> {
    let rules = ProfileService::new(&state.db).rules().await?;

    let mut badges: BTreeMap<String, Vec<BadgeResponse>> = BTreeMap::new();
    for badge in rules.badges {
        badges
            .entry(badge.category.to_string())
            .or_default()
            .push(BadgeResponse::from(badge));
    }

    Ok(ApiResponse::ok(RulesResponse {
        badges,
        titles: rules.titles.into_iter().map(TitleResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/students/me/profile",
    tag = "Rewards",
    operation_id = "getMyProfile",
    summary = "The calling student's profile",
    description = "Current title, completed challenges, average score, earned badges and the next title to reach.",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Only students have profiles (FORBIDDEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn my_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProfileResponse>>, AppError> {
    auth_user.require_student()?;

    let profile = ProfileService::new(&state.db)
        .profile(auth_user.user_id)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(ApiResponse::ok(ProfileResponse {
        id: profile.user.id,
        username: profile.user.username,
        email: profile.user.email,
        current_title: profile.current_title.map(TitleResponse::from),
        stats: profile.stats,
        badges: profile
            .badges
            .into_iter()
            .map(|(badge, earned_at)| EarnedBadgeResponse {
                badge: BadgeResponse::from(badge),
                earned_at,
            })
            .collect(),
        next_title: profile.next_title.map(TitleResponse::from),
    }))
}
