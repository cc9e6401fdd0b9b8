use chrono::{DateTime, Utc};
use common::SubmissionStatus;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::runner::TestRunReport;

const MAX_CODE_BYTES: usize = 256 * 1024;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCodeRequest {
    pub match_id: i32,
    pub code: String,
    /// Autosave from the editor rather than an explicit submit.
    #[serde(default)]
    pub is_automatic: bool,
}

pub fn validate_submit_code(req: &SubmitCodeRequest) -> Result<(), AppError> {
    if req.code.trim().is_empty() {
        return Err(AppError::Validation("Code must not be empty".into()));
    }
    if req.code.len() > MAX_CODE_BYTES {
        return Err(AppError::Validation(format!(
            "Code must be at most {} KB",
            MAX_CODE_BYTES / 1024
        )));
    }
    Ok(())
}

/// Pass counts of one test set.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestTally {
    pub passed: u32,
    pub total: u32,
}

impl TestTally {
    fn from_json(value: &serde_json::Value) -> Self {
        let report: TestRunReport = serde_json::from_value(value.clone()).unwrap_or_default();
        Self {
            passed: report.passed,
            total: report.total,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: i32,
    pub match_id: i32,
    pub challenge_participant_id: i32,
    pub code: String,
    pub is_automatic_submission: bool,
    pub is_final: bool,
    pub status: SubmissionStatus,
    pub public_tests: TestTally,
    /// Counts only; private cases stay hidden.
    pub private_tests: TestTally,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::submission::Model> for SubmissionResponse {
    fn from(m: crate::entity::submission::Model) -> Self {
        Self {
            public_tests: TestTally::from_json(&m.public_test_results),
            private_tests: TestTally::from_json(&m.private_test_results),
            id: m.id,
            match_id: m.match_id,
            challenge_participant_id: m.challenge_participant_id,
            code: m.code,
            is_automatic_submission: m.is_automatic_submission,
            is_final: m.is_final,
            status: m.status,
            created_at: m.created_at,
        }
    }
}
