use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};

use server::migration::{MIGRATIONS, Migrator};

use crate::common::TestApp;

async fn names(db: &DatabaseConnection, sql: &str) -> Vec<String> {
    db.query_all_raw(Statement::from_string(DbBackend::Postgres, sql.to_string()))
        .await
        .expect("Failed to query catalog")
        .iter()
        .map(|row| row.try_get::<String>("", "name").expect("Missing name column"))
        .collect()
}

async fn tables(db: &DatabaseConnection) -> Vec<String> {
    names(
        db,
        "SELECT table_name::text AS name FROM information_schema.tables \
         WHERE table_schema = 'public' ORDER BY table_name",
    )
    .await
}

async fn indexes(db: &DatabaseConnection) -> Vec<String> {
    names(
        db,
        "SELECT indexname::text AS name FROM pg_indexes \
         WHERE schemaname = 'public' ORDER BY indexname",
    )
    .await
}

#[tokio::test]
async fn down_then_up_restores_schema_and_ledger() {
    let app = TestApp::spawn().await;
    let db = &app.db;

    let tables_before = tables(db).await;
    let indexes_before = indexes(db).await;
    let status = Migrator::status(db).await.unwrap();
    assert_eq!(status.len(), MIGRATIONS.len());
    assert!(status.iter().all(|(_, applied)| *applied));

    let reverted = Migrator::down(db, MIGRATIONS.len()).await.unwrap();
    assert_eq!(reverted, MIGRATIONS.len());
    assert_eq!(tables(db).await, vec!["schema_migration".to_string()]);
    assert!(
        Migrator::status(db)
            .await
            .unwrap()
            .iter()
            .all(|(_, applied)| !*applied)
    );

    let applied = Migrator::up(db).await.unwrap();
    assert_eq!(applied, MIGRATIONS.len());
    assert_eq!(tables(db).await, tables_before);
    assert_eq!(indexes(db).await, indexes_before);
    assert_eq!(Migrator::status(db).await.unwrap(), status);
}

#[tokio::test]
async fn down_reverts_newest_first() {
    let app = TestApp::spawn().await;
    let db = &app.db;

    assert_eq!(Migrator::down(db, 1).await.unwrap(), 1);

    let status = Migrator::status(db).await.unwrap();
    let (newest, applied) = status.last().copied().unwrap();
    assert_eq!(newest, MIGRATIONS[MIGRATIONS.len() - 1].version);
    assert!(!applied);
    assert!(status[..status.len() - 1].iter().all(|(_, a)| *a));
    assert!(!indexes(db).await.contains(&"idx_challenge_status_phase_one".to_string()));

    assert_eq!(Migrator::up(db).await.unwrap(), 1);
    assert!(indexes(db).await.contains(&"idx_challenge_status_phase_one".to_string()));
}
