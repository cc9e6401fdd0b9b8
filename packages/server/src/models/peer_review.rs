use chrono::{DateTime, Utc};
use common::VoteValue;
use serde::{Deserialize, Serialize};

use super::reward::{BadgeResponse, TitleResponse};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// `correct`, `incorrect` or `abstain`.
    #[schema(example = "incorrect")]
    pub vote: String,
    /// Required for `incorrect`: a JSON array of arguments.
    #[schema(example = "[2, 7, 11, 15]")]
    pub test_case_input: Option<String>,
    /// Required for `incorrect`: the JSON array the correct program prints.
    #[schema(example = "[0, 1]")]
    pub expected_output: Option<String>,
}

/// A validated vote, with bug evidence only for `incorrect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidVote {
    pub vote: VoteValue,
    pub evidence: Option<BugEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugEvidence {
    pub test_case_input: String,
    pub expected_output: String,
}

fn is_json_array(raw: &str) -> bool {
    matches!(
        serde_json::from_str::<serde_json::Value>(raw),
        Ok(serde_json::Value::Array(_))
    )
}

pub fn validate_vote_request(req: &VoteRequest) -> Result<ValidVote, AppError> {
    let vote: VoteValue = req.vote.trim().parse().map_err(|e: common::ParseEnumError| {
        AppError::Validation(e.to_string())
    })?;

    if vote != VoteValue::Incorrect {
        return Ok(ValidVote {
            vote,
            evidence: None,
        });
    }

    let input = req.test_case_input.as_deref().map(str::trim).unwrap_or("");
    let expected = req.expected_output.as_deref().map(str::trim).unwrap_or("");
    if input.is_empty() || expected.is_empty() {
        return Err(AppError::InvalidTestCase(
            "An incorrect vote needs testCaseInput and expectedOutput".into(),
        ));
    }
    if !is_json_array(input) || !is_json_array(expected) {
        return Err(AppError::InvalidTestCase(
            "testCaseInput and expectedOutput must be JSON arrays".into(),
        ));
    }

    Ok(ValidVote {
        vote,
        evidence: Some(BugEvidence {
            test_case_input: input.to_string(),
            expected_output: expected.to_string(),
        }),
    })
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub assignment_id: i32,
    pub vote: VoteValue,
    /// `true` when a vote already existed; the stored vote is returned.
    pub already_voted: bool,
    /// Set for `incorrect` votes once the reviewed code has run on the evidence.
    pub is_bug_proven: Option<bool>,
}

/// One submission the caller has to review.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAssignmentResponse {
    pub id: i32,
    pub submission_id: i32,
    pub code: String,
    pub is_extra: bool,
    pub vote: Option<VoteValue>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub challenge_id: Option<i32>,
    /// Finalize while peer review is still running, closing it first.
    #[serde(default)]
    pub allow_early: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRewardResult {
    pub student_id: i32,
    pub new_badges: Vec<BadgeResponse>,
    pub promoted_to: Option<TitleResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    #[schema(example = true)]
    pub finalized: bool,
    pub badge_results: Vec<StudentRewardResult>,
}
