//! Operator-driven and time-driven challenge phase transitions.

use chrono::{DateTime, Utc};
use common::{ChallengeStatus, MatchSettingStatus};
use sea_orm::sea_query::{Expr, LockBehavior, LockType, OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entity::{
    challenge, challenge_match_setting, challenge_participant, match_setting, participant_match,
};
use crate::services::peer_review::PeerReviewService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult<T> {
    Done(T),
    ChallengeNotFound,
    /// The current phase does not allow this transition.
    InvalidPhase(ChallengeStatus),
    /// The phase is right but a requirement is missing.
    Precondition(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assigned {
    pub challenge: challenge::Model,
    pub matches_created: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerReviewStarted {
    pub challenge: challenge::Model,
    pub assignments_created: u64,
}

/// Participant `i` gets setting `i mod len`.
pub fn distribute_round_robin(participant_ids: &[i32], setting_ids: &[i32]) -> Vec<(i32, i32)> {
    if setting_ids.is_empty() {
        return Vec::new();
    }
    participant_ids
        .iter()
        .enumerate()
        .map(|(i, &p)| (p, setting_ids[i % setting_ids.len()]))
        .collect()
}

pub struct PhaseService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PhaseService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// PUBLIC/PRIVATE → ASSIGNED. Creates one match per participant,
    /// spreading participants over the challenge's ready problems.
    pub async fn assign(&self, challenge_id: i32) -> Result<TransitionResult<Assigned>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(challenge) = challenge::Entity::find_by_id(challenge_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(TransitionResult::ChallengeNotFound);
        };
        if !challenge.status.can_transition_to(ChallengeStatus::Assigned) {
            return Ok(TransitionResult::InvalidPhase(challenge.status));
        }

        let participant_ids: Vec<i32> = challenge_participant::Entity::find()
            .select_only()
            .column(challenge_participant::Column::Id)
            .filter(challenge_participant::Column::ChallengeId.eq(challenge_id))
            .order_by_asc(challenge_participant::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;
        if participant_ids.is_empty() {
            return Ok(TransitionResult::Precondition("Challenge has no participants"));
        }

        let setting_ids: Vec<i32> = challenge_match_setting::Entity::find()
            .select_only()
            .column(challenge_match_setting::Column::Id)
            .filter(challenge_match_setting::Column::ChallengeId.eq(challenge_id))
            .filter(
                challenge_match_setting::Column::MatchSettingId.in_subquery(
                    Query::select()
                        .column(match_setting::Column::Id)
                        .from(match_setting::Entity)
                        .and_where(match_setting::Column::Status.eq(MatchSettingStatus::Ready))
                        .to_owned(),
                ),
            )
            .order_by_asc(challenge_match_setting::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;
        if setting_ids.is_empty() {
            return Ok(TransitionResult::Precondition(
                "Challenge has no ready match settings",
            ));
        }

        let now = Utc::now();
        let rows = distribute_round_robin(&participant_ids, &setting_ids)
            .into_iter()
            .map(|(participant_id, setting_id)| participant_match::ActiveModel {
                challenge_match_setting_id: Set(setting_id),
                challenge_participant_id: Set(participant_id),
                created_at: Set(now),
                ..Default::default()
            });
        let matches_created = match participant_match::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::column(participant_match::Column::ChallengeParticipantId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
        {
            Ok(n) => n,
            Err(DbErr::RecordNotInserted) => 0,
            Err(e) => return Err(e),
        };

        let mut active = challenge.into_active_model();
        active.status = Set(ChallengeStatus::Assigned);
        active.updated_at = Set(now);
        let challenge = active.update(&txn).await?;

        txn.commit().await?;
        Ok(TransitionResult::Done(Assigned {
            challenge,
            matches_created,
        }))
    }

    /// ASSIGNED → STARTED_PHASE_ONE.
    pub async fn start_coding(
        &self,
        challenge_id: i32,
    ) -> Result<TransitionResult<challenge::Model>, DbErr> {
        self.transition(challenge_id, ChallengeStatus::StartedPhaseOne, |c, now| {
            c.start_phase_one_at = Set(Some(now));
        })
        .await
    }

    /// STARTED_PHASE_ONE → ENDED_PHASE_ONE before the timer runs out.
    pub async fn end_coding(
        &self,
        challenge_id: i32,
    ) -> Result<TransitionResult<challenge::Model>, DbErr> {
        self.transition(challenge_id, ChallengeStatus::EndedPhaseOne, |c, now| {
            c.end_phase_one_at = Set(Some(now));
        })
        .await
    }

    /// ENDED_PHASE_ONE → STARTED_PHASE_TWO, generating review assignments.
    pub async fn start_peer_review(
        &self,
        challenge_id: i32,
    ) -> Result<TransitionResult<PeerReviewStarted>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(challenge) = challenge::Entity::find_by_id(challenge_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(TransitionResult::ChallengeNotFound);
        };
        if !challenge
            .status
            .can_transition_to(ChallengeStatus::StartedPhaseTwo)
        {
            return Ok(TransitionResult::InvalidPhase(challenge.status));
        }

        let assignments_created = PeerReviewService::new(&txn)
            .generate_assignments(&challenge)
            .await?;

        let now = Utc::now();
        let mut active = challenge.into_active_model();
        active.status = Set(ChallengeStatus::StartedPhaseTwo);
        active.start_phase_two_at = Set(Some(now));
        active.updated_at = Set(now);
        let challenge = active.update(&txn).await?;

        txn.commit().await?;
        Ok(TransitionResult::Done(PeerReviewStarted {
            challenge,
            assignments_created,
        }))
    }

    /// STARTED_PHASE_TWO → ENDED_PHASE_TWO.
    pub async fn end_peer_review(
        &self,
        challenge_id: i32,
    ) -> Result<TransitionResult<challenge::Model>, DbErr> {
        self.transition(challenge_id, ChallengeStatus::EndedPhaseTwo, |c, now| {
            c.end_phase_two_at = Set(Some(now));
        })
        .await
    }

    async fn transition(
        &self,
        challenge_id: i32,
        next: ChallengeStatus,
        stamp: impl FnOnce(&mut challenge::ActiveModel, DateTime<Utc>),
    ) -> Result<TransitionResult<challenge::Model>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(challenge) = challenge::Entity::find_by_id(challenge_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(TransitionResult::ChallengeNotFound);
        };
        if !challenge.status.can_transition_to(next) {
            return Ok(TransitionResult::InvalidPhase(challenge.status));
        }

        let now = Utc::now();
        let mut active = challenge.into_active_model();
        active.status = Set(next);
        active.updated_at = Set(now);
        stamp(&mut active, now);
        let challenge = active.update(&txn).await?;

        txn.commit().await?;
        Ok(TransitionResult::Done(challenge))
    }

    /// Close every coding phase whose deadline is at or before `now`.
    ///
    /// Rows locked by a concurrent sweep are skipped and the update repeats
    /// the status predicate, so overlapping runs never double-transition.
    /// Returns the ids that moved to ENDED_PHASE_ONE.
    pub async fn end_expired_coding_phases(&self, now: DateTime<Utc>) -> Result<Vec<i32>, DbErr> {
        let txn = self.db.begin().await?;

        let running = challenge::Entity::find()
            .filter(challenge::Column::Status.eq(ChallengeStatus::StartedPhaseOne))
            .filter(challenge::Column::StartPhaseOneAt.is_not_null())
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .all(&txn)
            .await?;

        let expired: Vec<i32> = running
            .iter()
            .filter(|c| c.coding_deadline().is_some_and(|deadline| deadline <= now))
            .map(|c| c.id)
            .collect();
        if expired.is_empty() {
            return Ok(Vec::new());
        }

        challenge::Entity::update_many()
            .col_expr(
                challenge::Column::Status,
                Expr::value(ChallengeStatus::EndedPhaseOne),
            )
            .col_expr(challenge::Column::EndPhaseOneAt, Expr::value(now))
            .col_expr(challenge::Column::UpdatedAt, Expr::value(now))
            .filter(challenge::Column::Id.is_in(expired.iter().copied()))
            .filter(challenge::Column::Status.eq(ChallengeStatus::StartedPhaseOne))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(expired)
    }
}
