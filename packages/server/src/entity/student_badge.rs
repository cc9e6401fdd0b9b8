use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Unique per (student_id, badge_id); see `migration`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_badge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub student_id: i32,
    #[sea_orm(belongs_to, from = "student_id", to = "id", on_delete = "Cascade")]
    pub student: HasOne<super::user::Entity>,

    pub badge_id: i32,
    #[sea_orm(belongs_to, from = "badge_id", to = "id", on_delete = "Cascade")]
    pub badge: HasOne<super::badge::Entity>,

    pub earned_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
