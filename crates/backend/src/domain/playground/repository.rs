use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use contracts::domain::playground::{Playground, PlaygroundFeature, PlaygroundFeatureProperties};
use contracts::shared::geometry::PointGeometry;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

/// Playground id and name, the root of the aggregate read.
pub async fn read_header_by_id(
    conn: &impl ConnectionTrait,
    fid: i32,
) -> Result<Option<(i32, String)>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT fid, name FROM playgrounds WHERE fid = $1",
            [fid.into()],
        ))
        .await
        .context("Failed to read playground by fid")?;

    map_header(row)
}

pub async fn read_header_by_name(
    conn: &impl ConnectionTrait,
    name: &str,
) -> Result<Option<(i32, String)>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT fid, name FROM playgrounds WHERE name = $1",
            [name.into()],
        ))
        .await
        .context("Failed to read playground by name")?;

    map_header(row)
}

fn map_header(row: Option<QueryResult>) -> Result<Option<(i32, String)>> {
    match row {
        Some(row) => {
            let fid: i32 = row.try_get("", "fid")?;
            let name: Option<String> = row.try_get("", "name")?;
            Ok(Some((fid, name.unwrap_or_default())))
        }
        None => Ok(None),
    }
}

const FEATURE_COLUMNS: &str = "fid, nummer, name, geom_x, geom_y";

/// All playgrounds as GeoJSON-style features for the public collection.
pub async fn features(conn: &impl ConnectionTrait) -> Result<Vec<PlaygroundFeature>> {
    let rows = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            format!("SELECT {FEATURE_COLUMNS} FROM playgrounds"),
        ))
        .await
        .context("Failed to read playground features")?;

    rows.iter().map(map_feature).collect()
}

pub async fn feature_by_fid(
    conn: &impl ConnectionTrait,
    fid: i32,
) -> Result<Option<PlaygroundFeature>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!("SELECT {FEATURE_COLUMNS} FROM playgrounds WHERE fid = $1"),
            [fid.into()],
        ))
        .await
        .context("Failed to read playground feature by fid")?;

    match row {
        Some(row) => Ok(Some(map_feature(&row)?)),
        None => Ok(None),
    }
}

/// Name list with the newest inspection date and open-defect flags per
/// playground, one row per name.
pub async fn only_names(conn: &impl ConnectionTrait) -> Result<Vec<Playground>> {
    let rows = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT DISTINCT ON (pg.name) pg.name, insp.inspection_date, \
             (SELECT count(*) > 0 FROM defects d \
              JOIN inspection_reports ir ON d.tid_inspection_report = ir.tid \
              JOIN playdevices pd ON ir.fid_playdevice = pd.fid \
              WHERE pd.fid_playground = pg.fid AND d.fid_resolved_by IS NULL) \
              AS has_device_defects, \
             (SELECT count(*) > 0 FROM defects d \
              JOIN inspection_reports ir ON d.tid_inspection_report = ir.tid \
              JOIN playdevice_details det ON ir.fid_playdevice_detail = det.fid \
              JOIN playdevices pd ON det.fid_playdevice = pd.fid \
              WHERE pd.fid_playground = pg.fid AND d.fid_resolved_by IS NULL) \
              AS has_detail_defects \
             FROM playgrounds pg \
             LEFT JOIN inspections insp ON insp.fid_playground = pg.fid \
             ORDER BY pg.name, insp.inspection_date DESC"
                .to_string(),
        ))
        .await
        .context("Failed to read playground names")?;

    rows.iter().map(map_name_row).collect()
}

/// Name list restricted to the playgrounds assigned to one inspector for
/// one inspection type.
pub async fn only_names_for_inspector(
    conn: &impl ConnectionTrait,
    mail: &str,
    base_type_name: &str,
) -> Result<Vec<Playground>> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT DISTINCT ON (pg.name) pg.name, insp.inspection_date, \
             false AS has_device_defects, false AS has_detail_defects \
             FROM playgrounds pg \
             JOIN inspection_assignments ia ON pg.fid = ia.fid_playground \
             JOIN inspectors i ON i.fid = ia.fid_inspector \
             JOIN inspection_types it ON it.id = ia.id_inspection_type \
             LEFT JOIN inspections insp ON insp.fid_playground = pg.fid \
             WHERE trim(lower(i.mail_address)) = $1 AND it.value = $2 \
             ORDER BY pg.name, insp.inspection_date DESC",
            [mail.into(), base_type_name.into()],
        ))
        .await
        .context("Failed to read assigned playground names")?;

    rows.iter().map(map_name_row).collect()
}

fn map_feature(row: &QueryResult) -> Result<PlaygroundFeature> {
    let fid: Option<i32> = row.try_get("", "fid")?;
    let nummer: Option<i32> = row.try_get("", "nummer")?;
    let name: Option<String> = row.try_get("", "name")?;
    let geom_x: Option<f64> = row.try_get("", "geom_x")?;
    let geom_y: Option<f64> = row.try_get("", "geom_y")?;

    let geometry = match (geom_x, geom_y) {
        (Some(x), Some(y)) => PointGeometry::point(x, y),
        _ => PointGeometry::empty(),
    };

    Ok(PlaygroundFeature {
        properties: PlaygroundFeatureProperties {
            fid: fid.unwrap_or(-1),
            nummer: nummer.unwrap_or(-1),
            name: name.unwrap_or_default(),
        },
        geometry,
        ..PlaygroundFeature::default()
    })
}

fn map_name_row(row: &QueryResult) -> Result<Playground> {
    let name: String = row.try_get("", "name")?;
    let date: Option<NaiveDate> = row.try_get("", "inspection_date")?;
    let has_device_defects: bool = row.try_get("", "has_device_defects")?;
    let has_detail_defects: bool = row.try_get("", "has_detail_defects")?;

    Ok(Playground {
        name,
        date_of_last_inspection: date.map(|d| NaiveDateTime::new(d, NaiveTime::MIN)),
        has_open_device_defects: has_device_defects,
        has_open_device_detail_defects: has_detail_defects,
        ..Playground::default()
    })
}
