//! General land use code table

use sqlx::SqliteConnection;

/// All known (label, code) pairs
pub async fn load_all(conn: &mut SqliteConnection) -> sqlx::Result<Vec<(String, i64)>> {
    sqlx::query_as("SELECT label, id FROM general_landuse ORDER BY id")
        .fetch_all(&mut *conn)
        .await
}

pub async fn find_by_label(conn: &mut SqliteConnection, label: &str) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar("SELECT id FROM general_landuse WHERE label = ?")
        .bind(label)
        .fetch_optional(&mut *conn)
        .await
}

/// Mint the next code (max + 1, or 0 for an empty table) for a new label
///
/// Fails with a unique violation if another writer took the label or the
/// code first; the caller re-reads and retries.
pub async fn insert_next(conn: &mut SqliteConnection, label: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        r#"
        INSERT INTO general_landuse (id, label)
        SELECT COALESCE(MAX(id) + 1, 0), ? FROM general_landuse
        RETURNING id
        "#,
    )
    .bind(label)
    .fetch_one(&mut *conn)
    .await
}
