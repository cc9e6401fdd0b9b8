use chrono::{DateTime, Utc};
use common::MatchSettingStatus;
use serde::{Deserialize, Serialize};

use super::shared::{validate_text, validate_title};
use crate::entity::match_setting::TestCase;
use crate::error::AppError;

const MAX_TESTS: usize = 200;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchSettingRequest {
    #[schema(example = "Two Sum")]
    pub problem_title: String,
    pub problem_description: String,
    pub reference_solution: String,
    pub public_tests: Vec<TestCase>,
    #[serde(default)]
    pub private_tests: Vec<TestCase>,
}

pub fn validate_create_match_setting(req: &CreateMatchSettingRequest) -> Result<(), AppError> {
    validate_title(&req.problem_title, "problemTitle")?;
    validate_text(&req.problem_description, "problemDescription")?;
    validate_text(&req.reference_solution, "referenceSolution")?;
    if req.public_tests.is_empty() {
        return Err(AppError::Validation(
            "At least one public test is required".into(),
        ));
    }
    if req.public_tests.len() + req.private_tests.len() > MAX_TESTS {
        return Err(AppError::Validation(format!(
            "At most {MAX_TESTS} tests are allowed"
        )));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchSettingResponse {
    pub id: i32,
    pub problem_title: String,
    pub problem_description: String,
    pub reference_solution: String,
    pub public_tests: Vec<TestCase>,
    pub private_tests: Vec<TestCase>,
    pub status: MatchSettingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::match_setting::Model> for MatchSettingResponse {
    fn from(m: crate::entity::match_setting::Model) -> Self {
        Self {
            public_tests: m.public_test_cases(),
            private_tests: m.private_test_cases(),
            id: m.id,
            problem_title: m.problem_title,
            problem_description: m.problem_description,
            reference_solution: m.reference_solution,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
