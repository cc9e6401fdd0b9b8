use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::events::ServerEvent;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::peer_review::*;
use crate::models::reward::{BadgeResponse, TitleResponse};
use crate::models::shared::ApiResponse;
use crate::services::finalization::{FinalizationService, FinalizeResult};
use crate::services::peer_review::{PeerReviewService, ReviewAccess, VoteResult};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/peer-reviews/{assignmentId}/vote",
    tag = "Peer Review",
    operation_id = "submitVote",
    summary = "Vote on an assigned submission",
    description = "Only the assigned reviewer may vote; the vote is checked after that. Casts `correct`, `incorrect` or `abstain`. An `incorrect` vote must carry `testCaseInput` and `expectedOutput`, each a JSON array. Voting twice returns the first vote with `alreadyVoted: true`.",
    params(("assignmentId" = i32, Path, description = "Review assignment ID")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded or already present", body = ApiResponse<VoteResponse>),
        (status = 400, description = "Bad vote (INVALID_INPUT) or bad evidence (INVALID_TEST_CASE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the assigned reviewer (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Peer review not running (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, vote = %payload.vote))]
pub async fn submit_vote(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<i32>,
    AppJson(payload): AppJson<VoteRequest>,
) -> Result<Json<ApiResponse<VoteResponse>>, AppError> {
    let service = PeerReviewService::new(&state.db);
    let review = match service
        .assigned_review(auth_user.user_id, assignment_id)
        .await?
    {
        ReviewAccess::Granted(review) => review,
        ReviewAccess::AssignmentNotFound => {
            return Err(AppError::NotFound(format!(
                "Review assignment {assignment_id} not found"
            )));
        }
        ReviewAccess::NotReviewer => return Err(AppError::PermissionDenied),
    };
    let vote = validate_vote_request(&payload)?;

    let (stored, already_voted) = match service
        .submit_vote(state.runner.as_ref(), review, vote)
        .await?
    {
        VoteResult::Recorded(v) => (v, false),
        VoteResult::AlreadyVoted(v) => (v, true),
        VoteResult::InvalidPhase(status) => {
            return Err(AppError::InvalidPhase(format!(
                "Voting is closed while the challenge is {status}"
            )));
        }
    };

    Ok(ApiResponse::ok(VoteResponse {
        assignment_id,
        vote: stored.vote,
        already_voted,
        is_bug_proven: stored.is_bug_proven,
    }))
}

#[utoipa::path(
    post,
    path = "/peer-review/finalize-challenge",
    tag = "Peer Review",
    operation_id = "finalizeChallenge",
    summary = "Score a challenge and hand out rewards",
    description = "Computes every participant's score breakdown, then awards badges and title promotions. Requires peer review to have ended unless `allowEarly` is set. Safe to repeat.",
    request_body = FinalizeRequest,
    responses(
        (status = 200, description = "Challenge finalized", body = ApiResponse<FinalizeResponse>),
        (status = 400, description = "Missing challenge id or no participants (INVALID_INPUT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Peer review has not ended (INVALID_PHASE)", body = ErrorBody),
        (status = 500, description = "Scoring failed and was rolled back (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(challenge_id = ?payload.challenge_id, allow_early = payload.allow_early))]
pub async fn finalize_challenge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<FinalizeRequest>,
) -> Result<Json<ApiResponse<FinalizeResponse>>, AppError> {
    auth_user.require_staff()?;

    let result = FinalizationService::new(&state.db)
        .finalize_challenge(payload.challenge_id, payload.allow_early)
        .await;

    match result {
        FinalizeResult::Finalized { challenge, rewards } => {
            state
                .events
                .broadcast(ServerEvent::finalization_updated(challenge.id), None);
            state
                .events
                .broadcast(ServerEvent::challenge_updated(challenge.id, challenge.status), None);

            Ok(ApiResponse::ok(FinalizeResponse {
                finalized: true,
                badge_results: rewards
                    .into_iter()
                    .map(|r| StudentRewardResult {
                        student_id: r.student_id,
                        new_badges: r.new_badges.into_iter().map(BadgeResponse::from).collect(),
                        promoted_to: r.promoted_to.map(TitleResponse::from),
                    })
                    .collect(),
            }))
        }
        FinalizeResult::MissingChallenge => {
            Err(AppError::Validation("challengeId is required".into()))
        }
        FinalizeResult::ChallengeNotFound => Err(AppError::NotFound("Challenge not found".into())),
        FinalizeResult::PeerReviewNotEnded(status) => Err(AppError::InvalidPhase(format!(
            "Peer review has not ended (challenge is {status})"
        ))),
        FinalizeResult::NoParticipants => {
            Err(AppError::Validation("Challenge has no participants".into()))
        }
        FinalizeResult::UpdateFailed => Err(AppError::Internal(
            "Finalization failed and was rolled back".into(),
        )),
    }
}
