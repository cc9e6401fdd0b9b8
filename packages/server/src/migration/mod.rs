//! Versioned, reversible schema migrations.
//!
//! Each migration is a pair of statement lists. `Migrator::up` applies every
//! pending migration in version order, one transaction per migration, and
//! records it in the `schema_migration` ledger. `Migrator::down` reverts the
//! most recent ones in reverse order. The cumulative result of all
//! migrations is the schema the entities describe.

mod steps;

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::PostgresQueryBuilder;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, Schema,
    Set, TransactionTrait,
};
use tracing::info;

use crate::entity::schema_migration;

pub use steps::MIGRATIONS;

/// One schema change.
pub struct Migration {
    /// Sortable identifier, also the ledger key.
    pub version: &'static str,
    pub up: fn(&Schema) -> Vec<String>,
    pub down: fn(&Schema) -> Vec<String>,
}

pub struct Migrator;

impl Migrator {
    fn schema() -> Schema {
        Schema::new(DbBackend::Postgres)
    }

    async fn ensure_ledger(db: &DatabaseConnection) -> Result<(), DbErr> {
        let mut stmt = Self::schema().create_table_from_entity(schema_migration::Entity);
        stmt.if_not_exists();
        db.execute_unprepared(&stmt.to_string(PostgresQueryBuilder))
            .await?;
        Ok(())
    }

    async fn applied_versions(db: &DatabaseConnection) -> Result<HashSet<String>, DbErr> {
        Ok(schema_migration::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect())
    }

    /// Apply every pending migration. Returns the number applied.
    pub async fn up(db: &DatabaseConnection) -> Result<usize, DbErr> {
        Self::ensure_ledger(db).await?;
        let applied = Self::applied_versions(db).await?;
        let schema = Self::schema();

        let mut count = 0;
        for migration in MIGRATIONS.iter().filter(|m| !applied.contains(m.version)) {
            let txn = db.begin().await?;
            for sql in (migration.up)(&schema) {
                txn.execute_unprepared(&sql).await?;
            }
            schema_migration::ActiveModel {
                version: Set(migration.version.to_string()),
                applied_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;
            txn.commit().await?;

            info!(version = migration.version, "Applied migration");
            count += 1;
        }

        Ok(count)
    }

    /// Revert the `steps` most recently applied migrations. Returns the number reverted.
    pub async fn down(db: &DatabaseConnection, steps: usize) -> Result<usize, DbErr> {
        Self::ensure_ledger(db).await?;
        let applied = Self::applied_versions(db).await?;
        let schema = Self::schema();

        let mut count = 0;
        for migration in MIGRATIONS
            .iter()
            .rev()
            .filter(|m| applied.contains(m.version))
            .take(steps)
        {
            let txn = db.begin().await?;
            for sql in (migration.down)(&schema) {
                txn.execute_unprepared(&sql).await?;
            }
            schema_migration::Entity::delete_by_id(migration.version.to_string())
                .exec(&txn)
                .await?;
            txn.commit().await?;

            info!(version = migration.version, "Reverted migration");
            count += 1;
        }

        Ok(count)
    }

    /// Every known migration paired with whether it is applied.
    pub async fn status(db: &DatabaseConnection) -> Result<Vec<(&'static str, bool)>, DbErr> {
        Self::ensure_ledger(db).await?;
        let applied = Self::applied_versions(db).await?;
        Ok(MIGRATIONS
            .iter()
            .map(|m| (m.version, applied.contains(m.version)))
            .collect())
    }
}
