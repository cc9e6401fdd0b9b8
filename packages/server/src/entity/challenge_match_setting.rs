use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Links a catalog problem to a challenge. Unique per (challenge_id, match_setting_id).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "challenge_match_setting")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub challenge_id: i32,
    #[sea_orm(belongs_to, from = "challenge_id", to = "id", on_delete = "Cascade")]
    pub challenge: HasOne<super::challenge::Entity>,

    pub match_setting_id: i32,
    #[sea_orm(belongs_to, from = "match_setting_id", to = "id")]
    pub match_setting: HasOne<super::match_setting::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
