use anyhow::{Context, Result};
use chrono::NaiveDate;
use contracts::domain::defect::Defect;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

/// Display form of a priority row: "short (long)".
pub fn concat_priority(short_value: &str, long_value: &str) -> String {
    let short_value = short_value.trim();
    let long_value = long_value.trim();
    if short_value.is_empty() {
        long_value.to_string()
    } else if long_value.is_empty() {
        short_value.to_string()
    } else {
        format!("{} ({})", short_value, long_value)
    }
}

/// Priority option strings for the client's defect form.
pub async fn priority_options(conn: &impl ConnectionTrait) -> Result<Vec<String>> {
    let rows = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT id, short_value, value FROM defect_priorities ORDER BY id".to_string(),
        ))
        .await
        .context("Failed to read defect priorities")?;

    let mut options = Vec::new();
    for row in rows {
        let short_value: Option<String> = row.try_get("", "short_value")?;
        let long_value: Option<String> = row.try_get("", "value")?;
        let option = concat_priority(
            short_value.as_deref().unwrap_or(""),
            long_value.as_deref().unwrap_or(""),
        );
        if !option.is_empty() {
            options.push(option);
        }
    }
    Ok(options)
}

const DEFECT_COLUMNS: &str = "tid, fid_playdevice, id_priority, description, comment, \
     date_created, date_done, id_responsible_body";

/// Read one defect by its tid, including its picture tid lists.
pub async fn read(conn: &impl ConnectionTrait, tid: i32) -> Result<Option<Defect>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!("SELECT {DEFECT_COLUMNS} FROM defects WHERE tid = $1"),
            [tid.into()],
        ))
        .await
        .context("Failed to read defect")?;

    match row {
        Some(row) => {
            let mut defect = map_defect(&row)?;
            defect.defect_pics_tids = picture_tids(conn, defect.tid, false).await?;
            defect.defect_pics_after_fixing_tids = picture_tids(conn, defect.tid, true).await?;
            Ok(Some(defect))
        }
        None => Ok(None),
    }
}

/// Open defects of a play-device or one of its details.
pub async fn read_open_of_playdevice(
    conn: &impl ConnectionTrait,
    fid: i32,
    is_detail: bool,
) -> Result<Vec<Defect>> {
    let column = if is_detail {
        "fid_playdevice_detail"
    } else {
        "fid_playdevice"
    };
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!(
                "SELECT {DEFECT_COLUMNS} FROM defects \
                 WHERE {column} = $1 AND date_done IS NULL"
            ),
            [fid.into()],
        ))
        .await
        .context("Failed to read defects of playdevice")?;

    let mut defects = Vec::new();
    for row in rows {
        let defect = map_defect(&row)?;
        if defect.tid != -1 {
            defects.push(defect);
        }
    }
    Ok(defects)
}

/// Tids of the pictures of a defect, split by whether they were taken
/// after fixing.
pub async fn picture_tids(
    conn: &impl ConnectionTrait,
    defect_tid: i32,
    after_fixing: bool,
) -> Result<Vec<i32>> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT tid FROM defect_pictures WHERE tid_defect = $1 AND after_fixing = $2",
            [defect_tid.into(), after_fixing.into()],
        ))
        .await
        .context("Failed to read defect picture tids")?;

    let mut tids = Vec::new();
    for row in rows {
        tids.push(row.try_get("", "tid")?);
    }
    Ok(tids)
}

/// Insert a defect. The resolver is stamped only when the defect arrives
/// already resolved. Returns the new tid, or -1 on a dry run.
pub async fn insert(
    conn: &impl ConnectionTrait,
    defect: &Defect,
    report_tid: Option<i32>,
    resolver_fid: i32,
    dry_run: bool,
) -> Result<i32> {
    if defect.defect_description.trim().is_empty() {
        return Ok(-1);
    }
    if dry_run {
        return Ok(-1);
    }

    let done_today: Option<NaiveDate> = defect
        .date_done
        .map(|_| chrono::Local::now().date_naive());
    let resolver: Option<i32> = done_today.map(|_| resolver_fid);
    let responsible: Option<i32> = (defect.defects_responsible_body_id > 0)
        .then_some(defect.defects_responsible_body_id);

    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO defects \
             (tid, fid_playdevice, tid_inspection_report, date_created, id_priority, \
              description, comment, date_done, fid_resolved_by, id_responsible_body) \
             VALUES ( \
             (SELECT CASE WHEN max(tid) IS NULL THEN 1 ELSE max(tid) + 1 END FROM defects), \
             $1, $2, CURRENT_TIMESTAMP, $3, $4, $5, $6, $7, $8) RETURNING tid",
            [
                defect.playdevice_fid.into(),
                report_tid.into(),
                defect.priority.into(),
                defect.defect_description.clone().into(),
                defect.defect_comment.clone().into(),
                done_today.into(),
                resolver.into(),
                responsible.into(),
            ],
        ))
        .await
        .context("Failed to insert defect")?;

    match row {
        Some(row) => Ok(row.try_get("", "tid")?),
        None => Ok(-1),
    }
}

/// Update a defect. The resolver is stamped when the defect now carries a
/// resolution date, and cleared otherwise.
pub async fn update(
    conn: &impl ConnectionTrait,
    defect: &Defect,
    resolver_fid: i32,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        return Ok(());
    }

    let resolver: Option<i32> = defect.date_done.map(|_| resolver_fid);

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        "UPDATE defects SET id_priority = $1, description = $2, comment = $3, \
         date_done = $4, id_responsible_body = $5, fid_resolved_by = $6 \
         WHERE tid = $7",
        [
            defect.priority.into(),
            defect.defect_description.clone().into(),
            defect.defect_comment.clone().into(),
            defect.date_done.into(),
            defect.defects_responsible_body_id.into(),
            resolver.into(),
            defect.tid.into(),
        ],
    ))
    .await
    .context("Failed to update defect")?;

    Ok(())
}

/// Raw stored picture payload of a defect picture row.
pub async fn read_picture(conn: &impl ConnectionTrait, tid: i32) -> Result<Option<Vec<u8>>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT picture FROM defect_pictures WHERE tid = $1",
            [tid.into()],
        ))
        .await
        .context("Failed to read defect picture")?;

    match row {
        Some(row) => Ok(Some(row.try_get("", "picture")?)),
        None => Ok(None),
    }
}

/// Replace the payload of an existing defect picture row.
pub async fn update_picture(
    conn: &impl ConnectionTrait,
    tid: i32,
    picture: &[u8],
    dry_run: bool,
) -> Result<u64> {
    if dry_run {
        return Ok(0);
    }
    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE defect_pictures SET picture = $1 WHERE tid = $2",
            [picture.to_vec().into(), tid.into()],
        ))
        .await
        .context("Failed to update defect picture")?;

    Ok(result.rows_affected())
}

/// Attach a new picture to a defect. Returns the new tid, or -1 on dry run.
pub async fn insert_picture(
    conn: &impl ConnectionTrait,
    defect_tid: i32,
    picture: &[u8],
    after_fixing: bool,
    dry_run: bool,
) -> Result<i32> {
    if dry_run {
        return Ok(-1);
    }
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO defect_pictures (tid, tid_defect, picture, after_fixing) \
             VALUES ( \
             (SELECT CASE WHEN max(tid) IS NULL THEN 1 ELSE max(tid) + 1 END \
              FROM defect_pictures), \
             $1, $2, $3) RETURNING tid",
            [
                defect_tid.into(),
                picture.to_vec().into(),
                after_fixing.into(),
            ],
        ))
        .await
        .context("Failed to insert defect picture")?;

    match row {
        Some(row) => Ok(row.try_get("", "tid")?),
        None => Ok(-1),
    }
}

fn map_defect(row: &QueryResult) -> Result<Defect> {
    let tid: Option<i32> = row.try_get("", "tid")?;
    let priority: Option<i32> = row.try_get("", "id_priority")?;
    let description: Option<String> = row.try_get("", "description")?;
    let comment: Option<String> = row.try_get("", "comment")?;
    let responsible: Option<i32> = row.try_get("", "id_responsible_body")?;

    Ok(Defect {
        tid: tid.unwrap_or(-1),
        playdevice_fid: row
            .try_get::<Option<i32>>("", "fid_playdevice")?
            .unwrap_or(0),
        priority: priority.unwrap_or(-1),
        defect_description: description.unwrap_or_default(),
        date_creation: row.try_get("", "date_created")?,
        date_done: row.try_get("", "date_done")?,
        defect_comment: comment.unwrap_or_default(),
        defects_responsible_body_id: responsible.unwrap_or(-1),
        ..Defect::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_display_concatenation() {
        assert_eq!(concat_priority("hoch", "sofort beheben"), "hoch (sofort beheben)");
        assert_eq!(concat_priority(" hoch ", ""), "hoch");
        assert_eq!(concat_priority("", "sofort beheben"), "sofort beheben");
        assert_eq!(concat_priority("", ""), "");
    }
}
