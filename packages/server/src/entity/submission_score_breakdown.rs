use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission_score_breakdown")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub challenge_participant_id: i32,
    #[sea_orm(
        belongs_to,
        from = "challenge_participant_id",
        to = "id",
        on_delete = "Cascade"
    )]
    pub challenge_participant: HasOne<super::challenge_participant::Entity>,

    /// The scored submission; NULL when the participant never submitted.
    pub submission_id: Option<i32>,
    #[sea_orm(belongs_to, from = "submission_id", to = "id", on_delete = "SetNull")]
    pub submission: HasOne<super::submission::Entity>,

    pub code_review_score: i32,
    pub implementation_score: i32,
    pub total_score: i32,

    #[sea_orm(column_type = "JsonBinary")]
    pub stats: Json,

    pub computed_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
