use common::VoteValue;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "peer_review_vote")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub peer_review_assignment_id: i32,
    #[sea_orm(
        belongs_to,
        from = "peer_review_assignment_id",
        to = "id",
        on_delete = "Cascade"
    )]
    pub assignment: HasOne<super::peer_review_assignment::Entity>,

    pub vote: VoteValue,

    // Bug-proof evidence, only for `incorrect` votes.
    #[sea_orm(column_type = "Text", nullable)]
    pub test_case_input: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub expected_output: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub actual_output: Option<String>,
    pub is_bug_proven: Option<bool>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
