use common::{BadgeCategory, BadgeMetric};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "badge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stable identifier used by the seeder and the frontend.
    #[sea_orm(unique)]
    pub key: String,
    pub name: String,
    pub description: String,
    pub icon_key: String,

    pub category: BadgeCategory,
    pub metric: BadgeMetric,
    pub threshold: i32,
}

impl ActiveModelBehavior for ActiveModel {}
