use common::MatchSettingStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single `{input, output}` pair of a problem's test suite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TestCase {
    pub input: String,
    pub output: String,
}

/// A problem in the catalog, reusable across challenges.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "match_setting")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub problem_title: String,
    #[sea_orm(column_type = "Text")]
    pub problem_description: String,
    #[sea_orm(column_type = "Text")]
    pub reference_solution: String,

    /// JSON array of `TestCase`, shown to participants.
    #[sea_orm(column_type = "JsonBinary")]
    pub public_tests: Json,
    /// JSON array of `TestCase`, hidden from participants.
    #[sea_orm(column_type = "JsonBinary")]
    pub private_tests: Json,

    pub status: MatchSettingStatus,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn public_test_cases(&self) -> Vec<TestCase> {
        serde_json::from_value(self.public_tests.clone()).unwrap_or_default()
    }

    pub fn private_test_cases(&self) -> Vec<TestCase> {
        serde_json::from_value(self.private_tests.clone()).unwrap_or_default()
    }
}
