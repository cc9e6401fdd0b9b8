use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A reviewer's task to judge one submission. Unique per (submission_id, reviewer_id).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "peer_review_assignment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub submission_id: i32,
    #[sea_orm(belongs_to, from = "submission_id", to = "id", on_delete = "Cascade")]
    pub submission: HasOne<super::submission::Entity>,

    /// The reviewing challenge participant.
    #[sea_orm(indexed)]
    pub reviewer_id: i32,
    #[sea_orm(belongs_to, from = "reviewer_id", to = "id", on_delete = "Cascade")]
    pub reviewer: HasOne<super::challenge_participant::Entity>,

    /// Assigned beyond the challenge's configured review count.
    pub is_extra: bool,

    /// Reviewer-side test results, if the reviewer ran their own tests.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub feedback_tests: Option<Json>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
