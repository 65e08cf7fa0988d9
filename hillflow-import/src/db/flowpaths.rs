//! Flowpath database operations
//!
//! Catalog of flowpath identities and their point rows. Every function takes
//! the connection of the caller's open transaction, so a batch of units
//! commits or rolls back as a whole.

use crate::models::{FlowpathKey, FlowpathPointRow, Polyline, StoredFlowpath};
use sqlx::SqliteConnection;

/// Point row as stored, geometry kept as EWKT text
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredPoint {
    pub flowpath: i64,
    pub segid: i64,
    pub elevation: f64,
    pub length: f64,
    pub surgo: Option<i64>,
    pub management: Option<String>,
    pub slope: f64,
    pub geom: String,
    pub landuse: Option<String>,
    pub scenario: i64,
    pub gridorder: i64,
    pub genlu: i64,
    pub fbndid: i64,
}

/// Rows removed by a delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteCounts {
    pub flowpaths: u64,
    pub points: u64,
}

/// Look up a flowpath identity
pub async fn find(conn: &mut SqliteConnection, key: &FlowpathKey) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar(
        "SELECT fid FROM flowpaths WHERE huc_12 = ? AND fpath = ? AND scenario = ?",
    )
    .bind(&key.huc12)
    .bind(key.fpath)
    .bind(key.scenario)
    .fetch_optional(&mut *conn)
    .await
}

/// Get or create the identity for (scenario, huc_12, fpath)
pub async fn get_or_create(conn: &mut SqliteConnection, key: &FlowpathKey) -> sqlx::Result<i64> {
    if let Some(fid) = find(conn, key).await? {
        return Ok(fid);
    }

    sqlx::query_scalar(
        r#"
        INSERT INTO flowpaths (huc_12, fpath, scenario)
        VALUES (?, ?, ?)
        RETURNING fid
        "#,
    )
    .bind(&key.huc12)
    .bind(key.fpath)
    .bind(key.scenario)
    .fetch_one(&mut *conn)
    .await
}

/// Delete a flowpath and every point it owns
///
/// Safe on identities that are half built or already gone.
pub async fn delete(conn: &mut SqliteConnection, fid: i64) -> sqlx::Result<DeleteCounts> {
    let points = sqlx::query("DELETE FROM flowpath_points WHERE flowpath = ?")
        .bind(fid)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let flowpaths = sqlx::query("DELETE FROM flowpaths WHERE fid = ?")
        .bind(fid)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(DeleteCounts { flowpaths, points })
}

/// Replace all point rows of a flowpath
pub async fn replace_points(
    conn: &mut SqliteConnection,
    fid: i64,
    scenario: i64,
    srid: i32,
    rows: &[FlowpathPointRow],
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM flowpath_points WHERE flowpath = ?")
        .bind(fid)
        .execute(&mut *conn)
        .await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO flowpath_points (
                flowpath, segid, elevation, length, surgo, management, slope,
                geom, landuse, scenario, gridorder, genlu, fbndid
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(fid)
        .bind(row.sequence_index)
        .bind(row.elevation)
        .bind(row.cumulative_length)
        .bind(row.soil_code)
        .bind(&row.management_rotation_string)
        .bind(row.slope)
        .bind(row.position.to_ewkt(srid))
        .bind(&row.land_use_rotation_string)
        .bind(scenario)
        .bind(row.grid_order)
        .bind(row.general_land_use_code)
        .bind(row.field_boundary_index)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Store the derived flowpath-level attributes
pub async fn apply_geometry(
    conn: &mut SqliteConnection,
    fid: i64,
    geometry: &Polyline,
    srid: i32,
    is_irrigated: bool,
    max_slope: f64,
    bulk_slope: f64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE flowpaths
        SET geom = ?, irrigated = ?, max_slope = ?, bulk_slope = ?
        WHERE fid = ?
        "#,
    )
    .bind(geometry.to_ewkt(srid))
    .bind(is_irrigated)
    .bind(max_slope)
    .bind(bulk_slope)
    .bind(fid)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Delete every flowpath (and its points) of one scenario and unit
pub async fn purge_scenario_unit(
    conn: &mut SqliteConnection,
    scenario: i64,
    huc12: &str,
) -> sqlx::Result<DeleteCounts> {
    let points = sqlx::query(
        r#"
        DELETE FROM flowpath_points
        WHERE flowpath IN (
            SELECT fid FROM flowpaths WHERE scenario = ? AND huc_12 = ?
        )
        "#,
    )
    .bind(scenario)
    .bind(huc12)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let flowpaths = sqlx::query("DELETE FROM flowpaths WHERE scenario = ? AND huc_12 = ?")
        .bind(scenario)
        .bind(huc12)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(DeleteCounts { flowpaths, points })
}

/// Load one flowpath identity row
pub async fn load_flowpath(
    conn: &mut SqliteConnection,
    fid: i64,
) -> sqlx::Result<Option<StoredFlowpath>> {
    sqlx::query_as::<_, StoredFlowpath>(
        r#"
        SELECT fid, scenario, huc_12, fpath, geom, irrigated, max_slope, bulk_slope
        FROM flowpaths
        WHERE fid = ?
        "#,
    )
    .bind(fid)
    .fetch_optional(&mut *conn)
    .await
}

/// Load the flowpaths of one scenario and unit, ordered by flowpath number
pub async fn load_unit_flowpaths(
    conn: &mut SqliteConnection,
    scenario: i64,
    huc12: &str,
) -> sqlx::Result<Vec<StoredFlowpath>> {
    sqlx::query_as::<_, StoredFlowpath>(
        r#"
        SELECT fid, scenario, huc_12, fpath, geom, irrigated, max_slope, bulk_slope
        FROM flowpaths
        WHERE scenario = ? AND huc_12 = ?
        ORDER BY fpath
        "#,
    )
    .bind(scenario)
    .bind(huc12)
    .fetch_all(&mut *conn)
    .await
}

/// Load the point rows of a flowpath in sequence order
pub async fn load_points(conn: &mut SqliteConnection, fid: i64) -> sqlx::Result<Vec<StoredPoint>> {
    sqlx::query_as::<_, StoredPoint>(
        r#"
        SELECT flowpath, segid, elevation, length, surgo, management, slope,
               geom, landuse, scenario, gridorder, genlu, fbndid
        FROM flowpath_points
        WHERE flowpath = ?
        ORDER BY segid
        "#,
    )
    .bind(fid)
    .fetch_all(&mut *conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn row(fid: i64, index: i64) -> FlowpathPointRow {
        FlowpathPointRow {
            flowpath_id: fid,
            sequence_index: index,
            elevation: 300.0 - index as f64,
            cumulative_length: index as f64 * 3.0,
            slope: 0.05,
            soil_code: Some(411_001),
            management_rotation_string: "1111111".to_string(),
            position: Position::new(index as f64 * 3.0, 0.0),
            land_use_rotation_string: "CBCCBCB".to_string(),
            grid_order: 1,
            general_land_use_code: 0,
            field_boundary_index: 3,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let pool = hillflow_common::db::init_memory_database().await.unwrap();
        let mut pooled = pool.acquire().await.unwrap();
        let conn = &mut *pooled;
        let key = FlowpathKey::new(0, "070801050306", 12);

        let first = get_or_create(conn, &key).await.unwrap();
        let second = get_or_create(conn, &key).await.unwrap();
        let other = get_or_create(conn, &FlowpathKey::new(1, "070801050306", 12))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_replace_points_clears_previous_rows() {
        let pool = hillflow_common::db::init_memory_database().await.unwrap();
        let mut pooled = pool.acquire().await.unwrap();
        let conn = &mut *pooled;
        let fid = get_or_create(conn, &FlowpathKey::new(0, "070801050306", 1))
            .await
            .unwrap();

        let rows: Vec<_> = (0..4).map(|i| row(fid, i)).collect();
        replace_points(conn, fid, 0, 5070, &rows).await.unwrap();
        replace_points(conn, fid, 0, 5070, &rows[..2]).await.unwrap();

        let stored = load_points(conn, fid).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].segid, 1);
        assert_eq!(stored[1].geom, "SRID=5070;POINT(3 0)");
    }

    #[tokio::test]
    async fn test_apply_geometry_sets_attributes() {
        let pool = hillflow_common::db::init_memory_database().await.unwrap();
        let mut pooled = pool.acquire().await.unwrap();
        let conn = &mut *pooled;
        let fid = get_or_create(conn, &FlowpathKey::new(0, "070801050306", 1))
            .await
            .unwrap();
        let line = Polyline::new(vec![Position::new(0.0, 0.0), Position::new(3.0, 0.0)]).unwrap();

        apply_geometry(conn, fid, &line, 5070, true, 0.25, 0.1).await.unwrap();

        let stored = load_flowpath(conn, fid).await.unwrap().unwrap();
        assert_eq!(stored.geom.as_deref(), Some("SRID=5070;LINESTRING(0 0, 3 0)"));
        assert_eq!(stored.irrigated, Some(true));
        assert_eq!(stored.max_slope, Some(0.25));
        assert_eq!(stored.bulk_slope, Some(0.1));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_tolerates_missing() {
        let pool = hillflow_common::db::init_memory_database().await.unwrap();
        let mut pooled = pool.acquire().await.unwrap();
        let conn = &mut *pooled;
        let fid = get_or_create(conn, &FlowpathKey::new(0, "070801050306", 1))
            .await
            .unwrap();
        let rows: Vec<_> = (0..3).map(|i| row(fid, i)).collect();
        replace_points(conn, fid, 0, 5070, &rows).await.unwrap();

        let removed = delete(conn, fid).await.unwrap();
        assert_eq!(removed, DeleteCounts { flowpaths: 1, points: 3 });
        assert!(load_flowpath(conn, fid).await.unwrap().is_none());

        let again = delete(conn, fid).await.unwrap();
        assert_eq!(again, DeleteCounts::default());
    }

    #[tokio::test]
    async fn test_purge_only_touches_one_unit() {
        let pool = hillflow_common::db::init_memory_database().await.unwrap();
        let mut pooled = pool.acquire().await.unwrap();
        let conn = &mut *pooled;

        for (scenario, huc12) in [(0, "070801050306"), (0, "070801050307"), (1, "070801050306")] {
            for fpath in 1..=2 {
                let fid = get_or_create(conn, &FlowpathKey::new(scenario, huc12, fpath))
                    .await
                    .unwrap();
                let rows: Vec<_> = (0..2).map(|i| row(fid, i)).collect();
                replace_points(conn, fid, scenario, 5070, &rows).await.unwrap();
            }
        }

        let removed = purge_scenario_unit(conn, 0, "070801050306").await.unwrap();

        assert_eq!(removed, DeleteCounts { flowpaths: 2, points: 4 });
        assert!(load_unit_flowpaths(conn, 0, "070801050306").await.unwrap().is_empty());
        assert_eq!(load_unit_flowpaths(conn, 0, "070801050307").await.unwrap().len(), 2);
        assert_eq!(load_unit_flowpaths(conn, 1, "070801050306").await.unwrap().len(), 2);
    }
}
