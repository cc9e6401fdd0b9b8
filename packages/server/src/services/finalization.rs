//! Scoring and reward pass run once peer review is over.

use std::collections::BTreeSet;

use chrono::Utc;
use common::{ChallengeStatus, ScoringStatus};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QuerySelect, Set,
    TransactionTrait,
};

use crate::entity::{badge, challenge, title};
use crate::services::badge::BadgeService;
use crate::services::scoring::ScoringService;
use crate::services::title::TitleService;

/// Rewards handed to one student by a finalization run.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRewards {
    pub student_id: i32,
    pub new_badges: Vec<badge::Model>,
    pub promoted_to: Option<title::Model>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeResult {
    MissingChallenge,
    ChallengeNotFound,
    PeerReviewNotEnded(ChallengeStatus),
    NoParticipants,
    /// The transaction failed and was rolled back.
    UpdateFailed,
    Finalized {
        challenge: challenge::Model,
        rewards: Vec<StudentRewards>,
    },
}

fn can_finalize(status: ChallengeStatus, allow_early: bool) -> bool {
    status == ChallengeStatus::EndedPhaseTwo
        || (allow_early && status == ChallengeStatus::StartedPhaseTwo)
}

pub struct FinalizationService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> FinalizationService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Score every participant, then award badges and titles, in one transaction.
    ///
    /// Safe to repeat: breakdowns are upserted, badges only inserted when
    /// missing and titles advance at most one rank per run.
    pub async fn finalize_challenge(
        &self,
        challenge_id: Option<i32>,
        allow_early: bool,
    ) -> FinalizeResult {
        let Some(challenge_id) = challenge_id else {
            return FinalizeResult::MissingChallenge;
        };

        match self.run(challenge_id, allow_early).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(challenge_id, error = %e, "Finalization rolled back");
                FinalizeResult::UpdateFailed
            }
        }
    }

    async fn run(&self, challenge_id: i32, allow_early: bool) -> Result<FinalizeResult, DbErr> {
        let txn = self.db.begin().await?;

        let Some(challenge) = challenge::Entity::find_by_id(challenge_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(FinalizeResult::ChallengeNotFound);
        };
        if !can_finalize(challenge.status, allow_early) {
            return Ok(FinalizeResult::PeerReviewNotEnded(challenge.status));
        }

        let now = Utc::now();
        let early = challenge.status == ChallengeStatus::StartedPhaseTwo;
        let mut active = challenge.into_active_model();
        active.scoring_status = Set(ScoringStatus::Computing);
        if early {
            active.status = Set(ChallengeStatus::EndedPhaseTwo);
            active.end_phase_two_at = Set(Some(now));
        }
        active.updated_at = Set(now);
        let challenge = active.update(&txn).await?;

        let cards = ScoringService::new(&txn).score_challenge(challenge_id).await?;
        if cards.is_empty() {
            return Ok(FinalizeResult::NoParticipants);
        }

        let students: BTreeSet<i32> = cards.iter().map(|c| c.student_id).collect();
        let badges = BadgeService::new(&txn);
        let titles = TitleService::new(&txn);
        let mut rewards = Vec::with_capacity(students.len());
        for student_id in students {
            let new_badges = badges.evaluate_badges(student_id).await?;
            let promoted_to = titles.evaluate_title(student_id).await?;
            rewards.push(StudentRewards {
                student_id,
                new_badges,
                promoted_to,
            });
        }

        let mut active = challenge.into_active_model();
        active.scoring_status = Set(ScoringStatus::Completed);
        active.updated_at = Set(Utc::now());
        let challenge = active.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            challenge_id,
            scored = cards.len(),
            "Challenge finalized"
        );
        Ok(FinalizeResult::Finalized { challenge, rewards })
    }
}
