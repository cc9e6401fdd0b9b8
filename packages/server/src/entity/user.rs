use common::UserRole;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string; hashed by the auth service before insert.
    pub password: String,

    pub role: UserRole,

    /// Free-form client preferences.
    #[sea_orm(column_type = "JsonBinary")]
    pub settings: Json,

    pub current_title_id: Option<i32>,
    #[sea_orm(belongs_to, from = "current_title_id", to = "id")]
    pub current_title: HasOne<super::title::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
