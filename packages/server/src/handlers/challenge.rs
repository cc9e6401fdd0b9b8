use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use common::{ChallengeStatus, UserRole};
use sea_orm::sea_query::{OnConflict, Query as SeaQuery};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{
    challenge, challenge_match_setting, challenge_participant, match_setting, participant_match,
    user,
};
use crate::error::{AppError, ErrorBody};
use crate::events::ServerEvent;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::challenge::*;
use crate::models::peer_review::ReviewAssignmentResponse;
use crate::models::shared::ApiResponse;
use crate::services::participation::{Enrollment, JoinResult, ParticipationService};
use crate::services::peer_review::PeerReviewService;
use crate::services::phase::{PhaseService, TransitionResult};
use crate::state::AppState;

fn phase_outcome<T>(result: TransitionResult<T>, challenge_id: i32) -> Result<T, AppError> {
    match result {
        TransitionResult::Done(value) => Ok(value),
        TransitionResult::ChallengeNotFound => Err(AppError::NotFound(format!(
            "Challenge {challenge_id} not found"
        ))),
        TransitionResult::InvalidPhase(status) => Err(AppError::InvalidPhase(format!(
            "Challenge is {status}"
        ))),
        TransitionResult::Precondition(msg) => Err(AppError::Validation(msg.into())),
    }
}

fn announce(state: &AppState, challenge: &challenge::Model) {
    let delivered = state.events.broadcast(
        ServerEvent::challenge_updated(challenge.id, challenge.status),
        None,
    );
    tracing::debug!(challenge_id = challenge.id, delivered, "challenge-updated sent");
}

async fn find_challenge(db: &DatabaseConnection, id: i32) -> Result<challenge::Model, AppError> {
    challenge::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge {id} not found")))
}

/// Students only see public challenges and the ones they joined.
async fn ensure_visible(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    challenge: &challenge::Model,
) -> Result<bool, AppError> {
    let joined = ParticipationService::new(db)
        .find(challenge.id, auth_user.user_id)
        .await?
        .is_some();
    if auth_user.is_staff() || joined || challenge.status == ChallengeStatus::Public {
        Ok(joined)
    } else {
        Err(AppError::NotFound(format!(
            "Challenge {} not found",
            challenge.id
        )))
    }
}

#[utoipa::path(
    get,
    path = "/challenges",
    tag = "Challenges",
    operation_id = "listChallenges",
    summary = "List challenges",
    description = "Teachers and admins see every challenge. Students see public challenges and those they joined.",
    params(ChallengeListQuery),
    responses(
        (status = 200, description = "Challenges, newest first", body = ApiResponse<Vec<ChallengeResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_challenges(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ChallengeListQuery>,
) -> Result<Json<ApiResponse<Vec<ChallengeResponse>>>, AppError> {
    let mut select = challenge::Entity::find();

    if !auth_user.is_staff() {
        select = select.filter(
            Condition::any()
                .add(challenge::Column::Status.eq(ChallengeStatus::Public))
                .add(
                    challenge::Column::Id.in_subquery(
                        SeaQuery::select()
                            .column(challenge_participant::Column::ChallengeId)
                            .from(challenge_participant::Entity)
                            .and_where(
                                challenge_participant::Column::StudentId.eq(auth_user.user_id),
                            )
                            .to_owned(),
                    ),
                ),
        );
    }
    if let Some(status) = query.status {
        select = select.filter(challenge::Column::Status.eq(status));
    }

    let rows = select
        .order_by_desc(challenge::Column::CreatedAt)
        .order_by_desc(challenge::Column::Id)
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(
        rows.into_iter().map(ChallengeResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/challenges",
    tag = "Challenges",
    operation_id = "createChallenge",
    summary = "Create a challenge",
    description = "Creates a challenge owned by the caller and links the given match settings. The initial status defaults to `public`.",
    request_body = CreateChallengeRequest,
    responses(
        (status = 201, description = "Challenge created", body = ApiResponse<ChallengeDetailResponse>),
        (status = 400, description = "Validation error (INVALID_INPUT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 409, description = "Title already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_challenge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;
    validate_create_challenge(&payload)?;

    let mut setting_ids = payload.match_setting_ids.clone();
    setting_ids.sort_unstable();
    setting_ids.dedup();

    let txn = state.db.begin().await?;

    if !setting_ids.is_empty() {
        let found = match_setting::Entity::find()
            .filter(match_setting::Column::Id.is_in(setting_ids.iter().copied()))
            .count(&txn)
            .await?;
        if found != setting_ids.len() as u64 {
            return Err(AppError::Validation(
                "matchSettingIds contains unknown match settings".into(),
            ));
        }
    }

    let now = chrono::Utc::now();
    let model = challenge::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        duration: Set(payload.duration),
        allowed_number_of_review: Set(payload.allowed_number_of_review),
        teacher_id: Set(auth_user.user_id),
        status: Set(payload.status.unwrap_or(ChallengeStatus::Public)),
        scoring_status: Set(common::ScoringStatus::Pending),
        start_datetime: Set(payload.start_datetime),
        start_phase_one_at: Set(None),
        end_phase_one_at: Set(None),
        start_phase_two_at: Set(None),
        end_phase_two_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A challenge with this title already exists".into())
        }
        _ => AppError::from(e),
    })?;

    if !setting_ids.is_empty() {
        let links = setting_ids
            .iter()
            .map(|&match_setting_id| challenge_match_setting::ActiveModel {
                challenge_id: Set(model.id),
                match_setting_id: Set(match_setting_id),
                ..Default::default()
            });
        challenge_match_setting::Entity::insert_many(links)
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(ChallengeDetailResponse {
            challenge: ChallengeResponse::from(model),
            match_setting_ids: setting_ids,
            participant_count: 0,
            joined: false,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/challenges/{id}",
    tag = "Challenges",
    operation_id = "getChallenge",
    summary = "Get a challenge",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Challenge details", body = ApiResponse<ChallengeDetailResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_challenge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ChallengeDetailResponse>>, AppError> {
    let challenge = find_challenge(&state.db, id).await?;
    let joined = ensure_visible(&state.db, &auth_user, &challenge).await?;

    let match_setting_ids: Vec<i32> = challenge_match_setting::Entity::find()
        .select_only()
        .column(challenge_match_setting::Column::MatchSettingId)
        .filter(challenge_match_setting::Column::ChallengeId.eq(id))
        .order_by_asc(challenge_match_setting::Column::MatchSettingId)
        .into_tuple()
        .all(&state.db)
        .await?;

    let participant_count = challenge_participant::Entity::find()
        .filter(challenge_participant::Column::ChallengeId.eq(id))
        .count(&state.db)
        .await?;

    Ok(ApiResponse::ok(ChallengeDetailResponse {
        challenge: ChallengeResponse::from(challenge),
        match_setting_ids,
        participant_count,
        joined,
    }))
}

#[utoipa::path(
    post,
    path = "/challenges/{id}/join",
    tag = "Challenge Participants",
    operation_id = "joinChallenge",
    summary = "Join a public challenge",
    description = "Enrolls the calling student. Joining twice is not an error; the response reports `alreadyJoined`.",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Joined or already joined", body = ApiResponse<JoinResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Only students can join (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Challenge is not open for joining (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn join_challenge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<JoinResponse>>, AppError> {
    auth_user.require_student()?;
    enroll(&state, id, auth_user.user_id, Enrollment::SelfJoin).await
}

async fn enroll(
    state: &AppState,
    challenge_id: i32,
    student_id: i32,
    mode: Enrollment,
) -> Result<Json<ApiResponse<JoinResponse>>, AppError> {
    let already_joined = match ParticipationService::new(&state.db)
        .join(challenge_id, student_id, mode)
        .await?
    {
        JoinResult::Joined(_) => {
            state.events.broadcast(
                ServerEvent::participant_joined(challenge_id, student_id),
                None,
            );
            false
        }
        JoinResult::AlreadyJoined => true,
        JoinResult::ChallengeNotFound => {
            return Err(AppError::NotFound(format!(
                "Challenge {challenge_id} not found"
            )));
        }
        JoinResult::NotJoinable(status) => {
            return Err(AppError::InvalidPhase(format!(
                "Challenge is {status} and cannot be joined"
            )));
        }
    };

    Ok(ApiResponse::ok(JoinResponse {
        challenge_id,
        student_id,
        already_joined,
    }))
}

#[utoipa::path(
    get,
    path = "/challenges/{id}/participants",
    tag = "Challenge Participants",
    operation_id = "listParticipants",
    summary = "List participants",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Participants in join order", body = ApiResponse<Vec<ParticipantResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_participants(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ParticipantResponse>>>, AppError> {
    auth_user.require_staff()?;
    find_challenge(&state.db, id).await?;

    let rows = ParticipationService::new(&state.db).list(id).await?;
    let data = rows
        .into_iter()
        .map(|(p, u)| ParticipantResponse {
            id: p.id,
            challenge_id: p.challenge_id,
            student_id: p.student_id,
            username: u.map(|u| u.username).unwrap_or_default(),
            joined_at: p.joined_at,
        })
        .collect();
    Ok(ApiResponse::ok(data))
}

#[utoipa::path(
    post,
    path = "/challenges/{id}/participants",
    tag = "Challenge Participants",
    operation_id = "addParticipant",
    summary = "Add a student to a challenge",
    description = "Teachers may enroll any student while the challenge is public or private.",
    params(("id" = i32, Path, description = "Challenge ID")),
    request_body = AddParticipantRequest,
    responses(
        (status = 200, description = "Added or already present", body = ApiResponse<JoinResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge or student not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Enrollment closed (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(student_id = payload.student_id))]
pub async fn add_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AddParticipantRequest>,
) -> Result<Json<ApiResponse<JoinResponse>>, AppError> {
    auth_user.require_staff()?;

    let is_student = user::Entity::find_by_id(payload.student_id)
        .one(&state.db)
        .await?
        .is_some_and(|u| u.role == UserRole::Student);
    if !is_student {
        return Err(AppError::NotFound(format!(
            "Student {} not found",
            payload.student_id
        )));
    }

    enroll(&state, id, payload.student_id, Enrollment::AddedByStaff).await
}

#[utoipa::path(
    post,
    path = "/challenges/{id}/match-settings",
    tag = "Challenges",
    operation_id = "linkMatchSetting",
    summary = "Link a problem to a challenge",
    description = "Allowed until participants are assigned. Linking the same problem twice is a no-op.",
    params(("id" = i32, Path, description = "Challenge ID")),
    request_body = LinkMatchSettingRequest,
    responses(
        (status = 200, description = "Linked problem ids", body = ApiResponse<Vec<i32>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge or match setting not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Challenge already assigned (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(match_setting_id = payload.match_setting_id))]
pub async fn link_match_setting(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<LinkMatchSettingRequest>,
) -> Result<Json<ApiResponse<Vec<i32>>>, AppError> {
    auth_user.require_staff()?;

    let challenge = find_challenge(&state.db, id).await?;
    if !challenge.status.is_enrollable() {
        return Err(AppError::InvalidPhase(format!(
            "Challenge is {}",
            challenge.status
        )));
    }
    match_setting::Entity::find_by_id(payload.match_setting_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Match setting {} not found",
                payload.match_setting_id
            ))
        })?;

    let link = challenge_match_setting::ActiveModel {
        challenge_id: Set(id),
        match_setting_id: Set(payload.match_setting_id),
        ..Default::default()
    };
    match challenge_match_setting::Entity::insert(link)
        .on_conflict(
            OnConflict::columns([
                challenge_match_setting::Column::ChallengeId,
                challenge_match_setting::Column::MatchSettingId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    let ids: Vec<i32> = challenge_match_setting::Entity::find()
        .select_only()
        .column(challenge_match_setting::Column::MatchSettingId)
        .filter(challenge_match_setting::Column::ChallengeId.eq(id))
        .order_by_asc(challenge_match_setting::Column::MatchSettingId)
        .into_tuple()
        .all(&state.db)
        .await?;
    Ok(ApiResponse::ok(ids))
}

#[utoipa::path(
    post,
    path = "/challenges/{id}/assign",
    tag = "Challenge Phases",
    operation_id = "assignChallenge",
    summary = "Assign problems to participants",
    description = "Moves a public or private challenge to `assigned`, creating one match per participant round-robin over the ready problems.",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Assigned", body = ApiResponse<AssignResponse>),
        (status = 400, description = "No participants or no ready problems (INVALID_INPUT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Illegal transition (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn assign(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AssignResponse>>, AppError> {
    auth_user.require_staff()?;
    let assigned = phase_outcome(PhaseService::new(&state.db).assign(id).await?, id)?;
    announce(&state, &assigned.challenge);
    Ok(ApiResponse::ok(AssignResponse {
        challenge: ChallengeResponse::from(assigned.challenge),
        matches_created: assigned.matches_created,
    }))
}

#[utoipa::path(
    post,
    path = "/challenges/{id}/start",
    tag = "Challenge Phases",
    operation_id = "startCoding",
    summary = "Start the coding phase",
    description = "Moves an assigned challenge to `started_phase_one`. The phase ends automatically after `duration` minutes.",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Coding started", body = ApiResponse<ChallengeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Illegal transition (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn start_coding(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ChallengeResponse>>, AppError> {
    auth_user.require_staff()?;
    let challenge = phase_outcome(PhaseService::new(&state.db).start_coding(id).await?, id)?;
    announce(&state, &challenge);
    Ok(ApiResponse::ok(ChallengeResponse::from(challenge)))
}

#[utoipa::path(
    post,
    path = "/challenges/{id}/end-coding",
    tag = "Challenge Phases",
    operation_id = "endCoding",
    summary = "End the coding phase early",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Coding ended", body = ApiResponse<ChallengeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Illegal transition (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn end_coding(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ChallengeResponse>>, AppError> {
    auth_user.require_staff()?;
    let challenge = phase_outcome(PhaseService::new(&state.db).end_coding(id).await?, id)?;
    announce(&state, &challenge);
    Ok(ApiResponse::ok(ChallengeResponse::from(challenge)))
}

#[utoipa::path(
    post,
    path = "/challenges/{id}/peer-review/start",
    tag = "Challenge Phases",
    operation_id = "startPeerReview",
    summary = "Start peer review",
    description = "Moves the challenge to `started_phase_two` and generates review assignments within each problem group.",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Peer review started", body = ApiResponse<PeerReviewStartResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Illegal transition (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn start_peer_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PeerReviewStartResponse>>, AppError> {
    auth_user.require_staff()?;
    let started = phase_outcome(PhaseService::new(&state.db).start_peer_review(id).await?, id)?;
    announce(&state, &started.challenge);
    Ok(ApiResponse::ok(PeerReviewStartResponse {
        challenge: ChallengeResponse::from(started.challenge),
        assignments_created: started.assignments_created,
    }))
}

#[utoipa::path(
    post,
    path = "/challenges/{id}/peer-review/end",
    tag = "Challenge Phases",
    operation_id = "endPeerReview",
    summary = "End peer review",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Peer review ended", body = ApiResponse<ChallengeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Challenge not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Illegal transition (INVALID_PHASE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn end_peer_review(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ChallengeResponse>>, AppError> {
    auth_user.require_staff()?;
    let challenge = phase_outcome(PhaseService::new(&state.db).end_peer_review(id).await?, id)?;
    announce(&state, &challenge);
    Ok(ApiResponse::ok(ChallengeResponse::from(challenge)))
}

#[utoipa::path(
    get,
    path = "/challenges/{id}/my-match",
    tag = "Challenge Participants",
    operation_id = "getMyMatch",
    summary = "The caller's problem in a challenge",
    description = "Returns the assigned problem with its public tests only. Available once the challenge is assigned.",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Assigned problem", body = ApiResponse<MyMatchResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Only students have matches (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Not a participant or not assigned yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn my_match(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MyMatchResponse>>, AppError> {
    auth_user.require_student()?;
    let challenge = find_challenge(&state.db, id).await?;

    let participant = ParticipationService::new(&state.db)
        .find(id, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("You have not joined this challenge".into()))?;

    let m = participant_match::Entity::find()
        .filter(participant_match::Column::ChallengeParticipantId.eq(participant.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No problem assigned yet".into()))?;

    let link = challenge_match_setting::Entity::find_by_id(m.challenge_match_setting_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Dangling match {}", m.id)))?;
    let setting = match_setting::Entity::find_by_id(link.match_setting_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Dangling match setting link {}", link.id)))?;

    let final_submission_id = PeerReviewService::new(&state.db)
        .final_submissions(&[participant.id])
        .await?
        .remove(&participant.id)
        .map(|s| s.id);

    Ok(ApiResponse::ok(MyMatchResponse {
        match_id: m.id,
        challenge_id: id,
        match_setting_id: setting.id,
        public_tests: setting.public_test_cases(),
        problem_title: setting.problem_title,
        problem_description: setting.problem_description,
        challenge_status: challenge.status,
        coding_deadline: challenge.coding_deadline(),
        final_submission_id,
    }))
}

#[utoipa::path(
    get,
    path = "/challenges/{id}/peer-reviews",
    tag = "Peer Review",
    operation_id = "listMyReviews",
    summary = "The caller's review assignments",
    params(("id" = i32, Path, description = "Challenge ID")),
    responses(
        (status = 200, description = "Assignments with the code to review", body = ApiResponse<Vec<ReviewAssignmentResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Not a participant (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn my_peer_reviews(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ReviewAssignmentResponse>>>, AppError> {
    auth_user.require_student()?;

    let views = PeerReviewService::new(&state.db)
        .list_for_reviewer(id, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("You have not joined this challenge".into()))?;

    Ok(ApiResponse::ok(
        views
            .into_iter()
            .map(|v| ReviewAssignmentResponse {
                id: v.assignment.id,
                submission_id: v.assignment.submission_id,
                code: v.code,
                is_extra: v.assignment.is_extra,
                vote: v.vote,
                created_at: v.assignment.created_at,
            })
            .collect(),
    ))
}
