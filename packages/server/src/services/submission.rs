use chrono::{DateTime, Utc};
use common::{ChallengeStatus, SubmissionStatus, get_submission_status};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};

use crate::entity::{
    challenge, challenge_match_setting, challenge_participant, match_setting, participant_match,
    submission,
};
use crate::runner::{CodeRunner, TestRunReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    Submitted(submission::Model),
    MatchNotFound,
    /// The match belongs to another student.
    NotOwner,
    InvalidPhase(ChallengeStatus),
    /// Manual submissions are closed once the coding timer runs out.
    DeadlinePassed,
    RunnerUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionLookup {
    Found(submission::Model),
    NotFound,
    Forbidden,
}

/// Status derived from both test sets of a run.
pub fn evaluate_reports(public: &TestRunReport, private: &TestRunReport) -> SubmissionStatus {
    get_submission_status(Some(&public.summary()), Some(&private.summary()))
}

/// Autosaves keep working until the sweep closes the phase; explicit submits stop at the deadline.
fn accepts_submission(challenge: &challenge::Model, is_automatic: bool, now: DateTime<Utc>) -> bool {
    is_automatic
        || challenge
            .coding_deadline()
            .is_none_or(|deadline| now < deadline)
}

pub struct SubmissionService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SubmissionService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Run the code against the problem's tests and store the result.
    ///
    /// A manual submission always becomes the final one. An automatic one
    /// is final only while no manual submission exists for the participant.
    pub async fn submit(
        &self,
        runner: &dyn CodeRunner,
        user_id: i32,
        match_id: i32,
        code: String,
        is_automatic: bool,
    ) -> Result<SubmitResult, DbErr> {
        let Some(m) = participant_match::Entity::find_by_id(match_id)
            .one(self.db)
            .await?
        else {
            return Ok(SubmitResult::MatchNotFound);
        };

        let owner = challenge_participant::Entity::find_by_id(m.challenge_participant_id)
            .one(self.db)
            .await?;
        let Some(participant) = owner.filter(|p| p.student_id == user_id) else {
            return Ok(SubmitResult::NotOwner);
        };

        let challenge = challenge::Entity::find_by_id(participant.challenge_id)
            .one(self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("challenge {}", participant.challenge_id)))?;
        if challenge.status != ChallengeStatus::StartedPhaseOne {
            return Ok(SubmitResult::InvalidPhase(challenge.status));
        }
        if !accepts_submission(&challenge, is_automatic, Utc::now()) {
            return Ok(SubmitResult::DeadlinePassed);
        }

        let link = challenge_match_setting::Entity::find_by_id(m.challenge_match_setting_id)
            .one(self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("challenge_match_setting {}", m.challenge_match_setting_id)))?;
        let setting = match_setting::Entity::find_by_id(link.match_setting_id)
            .one(self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("match_setting {}", link.match_setting_id)))?;

        let public = match runner.run(&code, &setting.public_test_cases()).await {
            Ok(report) => report,
            Err(e) => return Ok(SubmitResult::RunnerUnavailable(e.to_string())),
        };
        let private = match runner.run(&code, &setting.private_test_cases()).await {
            Ok(report) => report,
            Err(e) => return Ok(SubmitResult::RunnerUnavailable(e.to_string())),
        };
        let status = evaluate_reports(&public, &private);

        let txn = self.db.begin().await?;

        // The phase may have closed while the runner was busy.
        let challenge = challenge::Entity::find_by_id(challenge.id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("challenge {}", challenge.id)))?;
        if challenge.status != ChallengeStatus::StartedPhaseOne {
            return Ok(SubmitResult::InvalidPhase(challenge.status));
        }
        if !accepts_submission(&challenge, is_automatic, Utc::now()) {
            return Ok(SubmitResult::DeadlinePassed);
        }

        let is_final = if is_automatic {
            submission::Entity::find()
                .filter(submission::Column::ChallengeParticipantId.eq(participant.id))
                .filter(submission::Column::IsAutomaticSubmission.eq(false))
                .count(&txn)
                .await?
                == 0
        } else {
            true
        };

        if is_final {
            submission::Entity::update_many()
                .col_expr(submission::Column::IsFinal, Expr::value(false))
                .filter(submission::Column::ChallengeParticipantId.eq(participant.id))
                .filter(submission::Column::IsFinal.eq(true))
                .exec(&txn)
                .await?;
        }

        let saved = submission::ActiveModel {
            match_id: Set(m.id),
            challenge_participant_id: Set(participant.id),
            code: Set(code),
            is_automatic_submission: Set(is_automatic),
            is_final: Set(is_final),
            public_test_results: Set(public.to_json()),
            private_test_results: Set(private.to_json()),
            status: Set(status),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        tracing::info!(
            submission_id = saved.id,
            match_id,
            %status,
            is_final,
            "Submission stored"
        );
        Ok(SubmitResult::Submitted(saved))
    }

    /// Owners and staff may read a submission.
    pub async fn find_for_viewer(
        &self,
        submission_id: i32,
        user_id: i32,
        is_staff: bool,
    ) -> Result<SubmissionLookup, DbErr> {
        let Some(row) = submission::Entity::find_by_id(submission_id)
            .one(self.db)
            .await?
        else {
            return Ok(SubmissionLookup::NotFound);
        };
        if is_staff {
            return Ok(SubmissionLookup::Found(row));
        }

        let owns = challenge_participant::Entity::find_by_id(row.challenge_participant_id)
            .one(self.db)
            .await?
            .is_some_and(|p| p.student_id == user_id);
        Ok(if owns {
            SubmissionLookup::Found(row)
        } else {
            SubmissionLookup::Forbidden
        })
    }
}
