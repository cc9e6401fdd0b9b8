use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger of applied schema migrations.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schema_migration")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub version: String,
    pub applied_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
