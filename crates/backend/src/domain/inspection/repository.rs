use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use contracts::domain::inspection::InspectionReport;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

/// Inspection type option as shown to the client: "value (short)".
pub fn format_type_option(value: &str, short_value: &str) -> String {
    format!("{} ({})", value, short_value)
}

/// Inverse of [`format_type_option`]: strip the trailing " (XX)" so the
/// name matches the lookup table again.
pub fn base_type_name(option: &str) -> &str {
    if option.ends_with(')') {
        if let Some(pos) = option.rfind(" (") {
            return &option[..pos];
        }
    }
    option
}

/// All inspection type options, formatted for display.
pub async fn type_options(conn: &impl ConnectionTrait) -> Result<Vec<String>> {
    let rows = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT short_value, value FROM inspection_types ORDER BY id".to_string(),
        ))
        .await
        .context("Failed to read inspection types")?;

    let mut options = Vec::new();
    for row in rows {
        let short_value: String = row.try_get("", "short_value")?;
        let value: String = row.try_get("", "value")?;
        options.push(format_type_option(&value, &short_value));
    }
    Ok(options)
}

/// All renovation type names.
pub async fn renovation_type_options(conn: &impl ConnectionTrait) -> Result<Vec<String>> {
    let rows = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT value FROM renovation_types ORDER BY id".to_string(),
        ))
        .await
        .context("Failed to read renovation types")?;

    let mut options = Vec::new();
    for row in rows {
        options.push(row.try_get("", "value")?);
    }
    Ok(options)
}

/// Id of an inspection type by its base name.
pub async fn type_id_by_value(conn: &impl ConnectionTrait, value: &str) -> Result<Option<i32>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT id FROM inspection_types WHERE value = $1",
            [value.into()],
        ))
        .await
        .context("Failed to resolve inspection type id")?;

    match row {
        Some(row) => Ok(Some(row.try_get("", "id")?)),
        None => Ok(None),
    }
}

/// Playground a play-device belongs to.
pub async fn playground_fid_of_playdevice(
    conn: &impl ConnectionTrait,
    playdevice_fid: i32,
) -> Result<Option<i32>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT fid_playground FROM playdevices WHERE fid = $1",
            [playdevice_fid.into()],
        ))
        .await
        .context("Failed to resolve playground of playdevice")?;

    match row {
        Some(row) => Ok(row.try_get("", "fid_playground")?),
        None => Ok(None),
    }
}

/// Planned date of the next inspection of the given type, taken from the
/// playground row. Type ids 1 to 3 map to the three planning columns.
pub async fn target_inspection_date(
    conn: &impl ConnectionTrait,
    playground_fid: i32,
    inspection_type_id: i32,
) -> Result<Option<NaiveDate>> {
    let column = match inspection_type_id {
        1 => "next_visual_inspection",
        2 => "next_operational_inspection",
        3 => "next_main_inspection",
        _ => return Ok(None),
    };

    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!("SELECT {column} AS target_date FROM playgrounds WHERE fid = $1"),
            [playground_fid.into()],
        ))
        .await
        .context("Failed to read target inspection date")?;

    match row {
        Some(row) => Ok(row.try_get("", "target_date")?),
        None => Ok(None),
    }
}

/// Serialize concurrent submissions: the whole batch runs under an
/// exclusive lock on the report table, so the duplicate check of a later
/// submission sees the rows of an earlier one.
pub async fn lock_reports_table(conn: &impl ConnectionTrait) -> Result<()> {
    conn.execute(Statement::from_string(
        DatabaseBackend::Postgres,
        "LOCK TABLE inspection_reports IN ACCESS EXCLUSIVE MODE".to_string(),
    ))
    .await
    .context("Failed to lock inspection report table")?;

    Ok(())
}

/// Number of existing reports for one (playdevice, type, date) key.
pub async fn count_reports_for_key(
    conn: &impl ConnectionTrait,
    playdevice_fid: i32,
    inspection_type: &str,
    date: NaiveDate,
) -> Result<i64> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT count(*) AS report_count FROM inspection_reports \
             WHERE fid_playdevice = $1 AND inspection_type = $2 AND inspection_date = $3",
            [playdevice_fid.into(), inspection_type.into(), date.into()],
        ))
        .await
        .context("Failed to count existing inspection reports")?;

    match row {
        Some(row) => Ok(row.try_get("", "report_count")?),
        None => Ok(0),
    }
}

/// Whether a play-device takes part in inspections at all.
pub async fn can_be_checked(conn: &impl ConnectionTrait, playdevice_fid: i32) -> Result<bool> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT not_to_be_checked, not_checkable FROM playdevices WHERE fid = $1",
            [playdevice_fid.into()],
        ))
        .await
        .context("Failed to read check eligibility of playdevice")?;

    match row {
        Some(row) => {
            let not_to_be_checked: Option<bool> = row.try_get("", "not_to_be_checked")?;
            let not_checkable: Option<bool> = row.try_get("", "not_checkable")?;
            Ok(!not_to_be_checked.unwrap_or(false) && !not_checkable.unwrap_or(false))
        }
        None => Ok(false),
    }
}

/// Insert the parent inspection row of a batch. Returns the new tid.
pub async fn insert_inspection(
    conn: &impl ConnectionTrait,
    inspection_type_id: Option<i32>,
    playground_fid: Option<i32>,
    inspection_date: NaiveDate,
    inspector_fid: i32,
    target_date: Option<NaiveDate>,
) -> Result<i32> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO inspections \
             (tid, id_inspection_type, fid_playground, inspection_date, fid_inspector, \
              target_inspection_date) \
             VALUES ( \
             (SELECT CASE WHEN max(tid) IS NULL THEN 1 ELSE max(tid) + 1 END \
              FROM inspections), \
             $1, $2, $3, $4, $5) RETURNING tid",
            [
                inspection_type_id.into(),
                playground_fid.into(),
                inspection_date.into(),
                inspector_fid.into(),
                target_date.into(),
            ],
        ))
        .await
        .context("Failed to insert inspection")?;

    match row {
        Some(row) => Ok(row.try_get("", "tid")?),
        None => anyhow::bail!("Insert of inspection returned no tid"),
    }
}

/// Insert one report row of a batch. Returns the new tid.
pub async fn insert_report(
    conn: &impl ConnectionTrait,
    inspection_tid: i32,
    report: &InspectionReport,
    inspection_date: NaiveDate,
    inspector_name: &str,
) -> Result<i32> {
    let playdevice_fid: Option<i32> =
        (report.playdevice_fid != 0).then_some(report.playdevice_fid);
    let detail_fid: Option<i32> =
        (report.playdevice_detail_fid != 0).then_some(report.playdevice_detail_fid);

    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO inspection_reports \
             (tid, tid_inspection, fid_playdevice, fid_playdevice_detail, inspection_type, \
              inspection_date, inspector, inspection_text, inspection_done, \
              inspection_comment, maintenance_text, maintenance_done, maintenance_comment, \
              fall_protection_type) \
             VALUES ( \
             (SELECT CASE WHEN max(tid) IS NULL THEN 1 ELSE max(tid) + 1 END \
              FROM inspection_reports), \
             $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING tid",
            [
                inspection_tid.into(),
                playdevice_fid.into(),
                detail_fid.into(),
                report.inspection_type.clone().into(),
                inspection_date.into(),
                inspector_name.into(),
                report.inspection_text.clone().into(),
                report.inspection_done.into(),
                report.inspection_comment.clone().into(),
                report.maintenance_text.clone().into(),
                report.maintenance_done.into(),
                report.maintenance_comment.clone().into(),
                report.fall_protection_type.clone().into(),
            ],
        ))
        .await
        .context("Failed to insert inspection report")?;

    match row {
        Some(row) => Ok(row.try_get("", "tid")?),
        None => anyhow::bail!("Insert of inspection report returned no tid"),
    }
}

/// The two most recent inspection dates of a device for one type.
pub async fn last_inspection_dates(
    conn: &impl ConnectionTrait,
    fid: i32,
    inspection_type: &str,
    is_detail: bool,
) -> Result<Vec<NaiveDate>> {
    let column = if is_detail {
        "fid_playdevice_detail"
    } else {
        "fid_playdevice"
    };
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!(
                "SELECT DISTINCT inspection_date FROM inspection_reports \
                 WHERE {column} = $1 AND inspection_type = $2 \
                 ORDER BY inspection_date DESC LIMIT 2"
            ),
            [fid.into(), inspection_type.into()],
        ))
        .await
        .context("Failed to read inspection dates")?;

    let mut dates = Vec::new();
    for row in rows {
        dates.push(row.try_get("", "inspection_date")?);
    }
    Ok(dates)
}

/// Reports of a device for one type and date.
pub async fn reports_for_date(
    conn: &impl ConnectionTrait,
    fid: i32,
    inspection_type: &str,
    date: NaiveDate,
    is_detail: bool,
) -> Result<Vec<InspectionReport>> {
    let column = if is_detail {
        "fid_playdevice_detail"
    } else {
        "fid_playdevice"
    };
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!(
                "SELECT tid, inspection_type, inspection_date, inspector, inspection_text, \
                 inspection_done, inspection_comment, maintenance_text, maintenance_done, \
                 maintenance_comment, fall_protection_type \
                 FROM inspection_reports \
                 WHERE {column} = $1 AND inspection_type = $2 AND inspection_date = $3"
            ),
            [fid.into(), inspection_type.into(), date.into()],
        ))
        .await
        .context("Failed to read inspection reports")?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(map_report(&row)?);
    }
    Ok(reports)
}

fn map_report(row: &QueryResult) -> Result<InspectionReport> {
    let tid: Option<i32> = row.try_get("", "tid")?;
    let inspection_type: Option<String> = row.try_get("", "inspection_type")?;
    let date: Option<NaiveDate> = row.try_get("", "inspection_date")?;
    let inspector: Option<String> = row.try_get("", "inspector")?;
    let inspection_text: Option<String> = row.try_get("", "inspection_text")?;
    let inspection_done: Option<bool> = row.try_get("", "inspection_done")?;
    let inspection_comment: Option<String> = row.try_get("", "inspection_comment")?;
    let maintenance_text: Option<String> = row.try_get("", "maintenance_text")?;
    let maintenance_done: Option<bool> = row.try_get("", "maintenance_done")?;
    let maintenance_comment: Option<String> = row.try_get("", "maintenance_comment")?;
    let fall_protection_type: Option<String> = row.try_get("", "fall_protection_type")?;

    Ok(InspectionReport {
        tid: tid.unwrap_or(-1),
        inspection_type: inspection_type.unwrap_or_default(),
        date_of_service: date.map(|d| NaiveDateTime::new(d, NaiveTime::MIN)),
        inspector: inspector.unwrap_or_default(),
        inspection_text: inspection_text.unwrap_or_default(),
        inspection_done: inspection_done.unwrap_or(false),
        inspection_comment: inspection_comment.unwrap_or_default(),
        maintenance_text: maintenance_text.unwrap_or_default(),
        maintenance_done: maintenance_done.unwrap_or(false),
        maintenance_comment: maintenance_comment.unwrap_or_default(),
        fall_protection_type: fall_protection_type.unwrap_or_default(),
        ..InspectionReport::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_option_round_trip() {
        let option = format_type_option("Hauptinspektion", "HI");
        assert_eq!(option, "Hauptinspektion (HI)");
        assert_eq!(base_type_name(&option), "Hauptinspektion");
    }

    #[test]
    fn base_type_name_leaves_plain_names_alone() {
        assert_eq!(base_type_name("Hauptinspektion"), "Hauptinspektion");
        assert_eq!(base_type_name(""), "");
    }
}
