use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tier of the title ladder. Higher `rank` is better.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "title")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    pub description: String,

    #[sea_orm(unique)]
    pub rank: i32,

    pub min_challenges: i32,
    pub min_avg_score: f64,
    pub min_badges: i32,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Model> for common::TitleRequirement {
    fn from(m: &Model) -> Self {
        Self {
            id: m.id,
            rank: m.rank,
            min_challenges: m.min_challenges,
            min_avg_score: m.min_avg_score,
            min_badges: m.min_badges,
        }
    }
}
