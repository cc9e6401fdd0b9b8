use chrono::{DateTime, Utc};
use common::{ChallengeStatus, ScoringStatus};
use serde::{Deserialize, Serialize};

use super::shared::validate_title;
use crate::entity::match_setting::TestCase;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeRequest {
    #[schema(example = "Sorting week")]
    pub title: String,
    /// Coding phase length in minutes (1-1440).
    #[schema(example = 60)]
    pub duration: i32,
    /// Reviews each submission receives (1-10).
    #[schema(example = 2)]
    pub allowed_number_of_review: i32,
    pub start_datetime: DateTime<Utc>,
    /// `public` or `private`. Default: `private`.
    pub status: Option<ChallengeStatus>,
    /// Catalog problems to link right away. Each must be `ready`.
    #[serde(default)]
    pub match_setting_ids: Vec<i32>,
}

pub fn validate_create_challenge(req: &CreateChallengeRequest) -> Result<(), AppError> {
    validate_title(&req.title, "Title")?;
    if !(1..=1440).contains(&req.duration) {
        return Err(AppError::Validation(
            "duration must be between 1 and 1440 minutes".into(),
        ));
    }
    if !(1..=10).contains(&req.allowed_number_of_review) {
        return Err(AppError::Validation(
            "allowedNumberOfReview must be between 1 and 10".into(),
        ));
    }
    if let Some(status) = req.status
        && !status.is_enrollable()
    {
        return Err(AppError::Validation(
            "status must be 'public' or 'private'".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ChallengeListQuery {
    /// Only challenges in this phase.
    pub status: Option<ChallengeStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub id: i32,
    pub title: String,
    pub duration: i32,
    pub allowed_number_of_review: i32,
    pub teacher_id: i32,
    pub status: ChallengeStatus,
    pub scoring_status: ScoringStatus,
    pub start_datetime: DateTime<Utc>,
    pub start_phase_one_at: Option<DateTime<Utc>>,
    pub end_phase_one_at: Option<DateTime<Utc>>,
    pub start_phase_two_at: Option<DateTime<Utc>>,
    pub end_phase_two_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::challenge::Model> for ChallengeResponse {
    fn from(m: crate::entity::challenge::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            duration: m.duration,
            allowed_number_of_review: m.allowed_number_of_review,
            teacher_id: m.teacher_id,
            status: m.status,
            scoring_status: m.scoring_status,
            start_datetime: m.start_datetime,
            start_phase_one_at: m.start_phase_one_at,
            end_phase_one_at: m.end_phase_one_at,
            start_phase_two_at: m.start_phase_two_at,
            end_phase_two_at: m.end_phase_two_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDetailResponse {
    #[serde(flatten)]
    pub challenge: ChallengeResponse,
    pub match_setting_ids: Vec<i32>,
    pub participant_count: u64,
    /// Whether the caller is enrolled.
    pub joined: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantRequest {
    pub student_id: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkMatchSettingRequest {
    pub match_setting_id: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub id: i32,
    pub challenge_id: i32,
    pub student_id: i32,
    pub username: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub challenge_id: i32,
    pub student_id: i32,
    /// `true` when the student was already enrolled.
    pub already_joined: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignResponse {
    pub challenge: ChallengeResponse,
    pub matches_created: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeerReviewStartResponse {
    pub challenge: ChallengeResponse,
    pub assignments_created: u64,
}

/// The caller's problem in a challenge.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyMatchResponse {
    pub match_id: i32,
    pub challenge_id: i32,
    pub match_setting_id: i32,
    pub problem_title: String,
    pub problem_description: String,
    pub public_tests: Vec<TestCase>,
    pub challenge_status: ChallengeStatus,
    pub coding_deadline: Option<DateTime<Utc>>,
    /// Id of the current final submission, if any.
    pub final_submission_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateChallengeRequest {
        CreateChallengeRequest {
            title: "Arrays".into(),
            duration: 30,
            allowed_number_of_review: 2,
            start_datetime: Utc::now(),
            status: None,
            match_setting_ids: vec![],
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(validate_create_challenge(&request()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let mut req = request();
        req.duration = 0;
        assert!(validate_create_challenge(&req).is_err());

        let mut req = request();
        req.allowed_number_of_review = 11;
        assert!(validate_create_challenge(&req).is_err());
    }

    #[test]
    fn rejects_non_enrollable_initial_status() {
        let mut req = request();
        req.status = Some(ChallengeStatus::StartedPhaseOne);
        assert!(validate_create_challenge(&req).is_err());
    }
}
