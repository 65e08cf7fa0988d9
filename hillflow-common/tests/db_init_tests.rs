//! Tests for database initialization on first run and reopen

use hillflow_common::db::init::init_database;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("hillflow.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_rows() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("hillflow.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO general_landuse (id, label) VALUES (0, 'Corn')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await.unwrap();
    let label: String = sqlx::query_scalar("SELECT label FROM general_landuse WHERE id = 0")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(label, "Corn");
}

#[tokio::test]
async fn test_flowpath_identity_is_unique() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("hillflow.db")).await.unwrap();

    let insert = "INSERT INTO flowpaths (scenario, huc_12, fpath) VALUES (0, '070801050306', 7)";
    sqlx::query(insert).execute(&pool).await.unwrap();
    let duplicate = sqlx::query(insert).execute(&pool).await;

    assert!(duplicate.is_err(), "Duplicate flowpath identity should be rejected");
}
