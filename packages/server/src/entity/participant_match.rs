use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pairs a participant with the problem they solve in a challenge.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "match")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub challenge_match_setting_id: i32,
    #[sea_orm(
        belongs_to,
        from = "challenge_match_setting_id",
        to = "id",
        on_delete = "Cascade"
    )]
    pub challenge_match_setting: HasOne<super::challenge_match_setting::Entity>,

    #[sea_orm(unique)]
    pub challenge_participant_id: i32,
    #[sea_orm(
        belongs_to,
        from = "challenge_participant_id",
        to = "id",
        on_delete = "Cascade"
    )]
    pub challenge_participant: HasOne<super::challenge_participant::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
