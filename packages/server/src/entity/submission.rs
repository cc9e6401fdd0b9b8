use common::SubmissionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub match_id: i32,
    #[sea_orm(belongs_to, from = "match_id", to = "id", on_delete = "Cascade")]
    pub participant_match: HasOne<super::participant_match::Entity>,

    #[sea_orm(indexed)]
    pub challenge_participant_id: i32,
    #[sea_orm(
        belongs_to,
        from = "challenge_participant_id",
        to = "id",
        on_delete = "Cascade"
    )]
    pub challenge_participant: HasOne<super::challenge_participant::Entity>,

    #[sea_orm(column_type = "Text")]
    pub code: String,
    /// Saved by the editor rather than explicitly submitted.
    pub is_automatic_submission: bool,
    /// The submission that is scored and reviewed.
    pub is_final: bool,

    /// Serialized `TestRunReport` of the public test set.
    #[sea_orm(column_type = "JsonBinary")]
    pub public_test_results: Json,
    /// Serialized `TestRunReport` of the private test set.
    #[sea_orm(column_type = "JsonBinary")]
    pub private_test_results: Json,

    pub status: SubmissionStatus,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
