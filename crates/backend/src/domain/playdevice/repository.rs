use anyhow::{Context, Result};
use contracts::domain::inspection::InspectionCriterion;
use contracts::domain::playdevice::{
    PlaydeviceDetail, PlaydeviceFeature, PlaydeviceFeatureProperties, PlaydeviceType,
};
use contracts::shared::geometry::PointGeometry;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

use crate::shared::pictures;

/// Checklist category of an inspection criterion row.
#[derive(Debug, Clone, Copy)]
pub enum CriteriaCategory {
    General,
    MainFallProtection,
    SecondaryFallProtection,
}

impl CriteriaCategory {
    fn as_str(&self) -> &'static str {
        match self {
            CriteriaCategory::General => "general",
            CriteriaCategory::MainFallProtection => "main_fall_protection",
            CriteriaCategory::SecondaryFallProtection => "secondary_fall_protection",
        }
    }
}

/// All play-devices of a playground, with type, supplier and picture but
/// without reports, details or criteria (those are filled in afterwards).
const FEATURE_QUERY: &str = "SELECT pd.fid, pd.comment, pd.geom_x, pd.geom_y, \
     pt.short_value AS type_name, pt.value AS type_description, pd.standard, pd.material, \
     sup.name AS supplier, pd.cost_estimation, pd.recommended_year_renovation, \
     pd.comment_renovation, pd.picture \
     FROM playdevices pd \
     LEFT JOIN playdevice_types pt ON pd.id_device_type = pt.id \
     LEFT JOIN suppliers sup ON pd.id_supplier = sup.fid";

pub async fn read_of_playground(
    conn: &impl ConnectionTrait,
    playground_fid: i32,
) -> Result<Vec<PlaydeviceFeature>> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!("{FEATURE_QUERY} WHERE pd.fid_playground = $1"),
            [playground_fid.into()],
        ))
        .await
        .context("Failed to read playdevices of playground")?;

    let mut features = Vec::new();
    for row in rows {
        features.push(map_feature(&row)?);
    }
    Ok(features)
}

/// One play-device with type, supplier and picture.
pub async fn read_by_fid(
    conn: &impl ConnectionTrait,
    fid: i32,
) -> Result<Option<PlaydeviceFeature>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!("{FEATURE_QUERY} WHERE pd.fid = $1"),
            [fid.into()],
        ))
        .await
        .context("Failed to read playdevice")?;

    match row {
        Some(row) => Ok(Some(map_feature(&row)?)),
        None => Ok(None),
    }
}

/// The details (components) of one play-device.
pub async fn read_details(
    conn: &impl ConnectionTrait,
    playdevice_fid: i32,
) -> Result<Vec<PlaydeviceDetail>> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT fid, description FROM playdevice_details WHERE fid_playdevice = $1",
            [playdevice_fid.into()],
        ))
        .await
        .context("Failed to read playdevice details")?;

    let mut details = Vec::new();
    for row in rows {
        let description: Option<String> = row.try_get("", "description")?;
        let detail = PlaydeviceDetail {
            properties: PlaydeviceFeatureProperties {
                fid: row.try_get("", "fid")?,
                device_type: PlaydeviceType {
                    description: description.unwrap_or_default(),
                    ..PlaydeviceType::default()
                },
                ..PlaydeviceFeatureProperties::default()
            },
            ..PlaydeviceDetail::default()
        };
        details.push(detail);
    }
    Ok(details)
}

/// Criteria of one checklist category for a play-device and inspection
/// type (base name, without the short suffix).
pub async fn criteria_of_playdevice(
    conn: &impl ConnectionTrait,
    playdevice_fid: i32,
    base_type_name: &str,
    category: CriteriaCategory,
) -> Result<Vec<InspectionCriterion>> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT realm, check_text, check_short_text, maintenance_text, inspection_type \
             FROM inspection_criteria \
             WHERE fid_playdevice = $1 AND inspection_type = $2 AND category = $3",
            [
                playdevice_fid.into(),
                base_type_name.into(),
                category.as_str().into(),
            ],
        ))
        .await
        .context("Failed to read inspection criteria of playdevice")?;

    rows.iter().map(map_criterion).collect()
}

/// General criteria for a play-device detail.
pub async fn criteria_of_detail(
    conn: &impl ConnectionTrait,
    detail_fid: i32,
    base_type_name: &str,
) -> Result<Vec<InspectionCriterion>> {
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT realm, check_text, check_short_text, maintenance_text, inspection_type \
             FROM inspection_criteria \
             WHERE fid_playdevice_detail = $1 AND inspection_type = $2 AND category = 'general'",
            [detail_fid.into(), base_type_name.into()],
        ))
        .await
        .context("Failed to read inspection criteria of playdevice detail")?;

    rows.iter().map(map_criterion).collect()
}

/// Update the renovation planning fields of a play-device.
pub async fn update_renovation(
    conn: &impl ConnectionTrait,
    properties: &PlaydeviceFeatureProperties,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        return Ok(());
    }

    let cost: Option<f32> =
        (properties.cost_estimation > 0.0).then_some(properties.cost_estimation);
    let year: Option<i32> = (properties.recommended_year_of_renovation > 0)
        .then_some(properties.recommended_year_of_renovation);
    let comment: Option<String> = (!properties
        .comment_recommended_year_of_renovation
        .is_empty())
    .then(|| properties.comment_recommended_year_of_renovation.clone());

    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        "UPDATE playdevices SET cost_estimation = $1, recommended_year_renovation = $2, \
         comment_renovation = $3 WHERE fid = $4",
        [
            cost.into(),
            year.into(),
            comment.into(),
            properties.fid.into(),
        ],
    ))
    .await
    .context("Failed to update playdevice renovation fields")?;

    Ok(())
}

/// Raw stored picture payload of a play-device.
pub async fn read_picture(conn: &impl ConnectionTrait, fid: i32) -> Result<Option<Vec<u8>>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT picture FROM playdevices WHERE fid = $1",
            [fid.into()],
        ))
        .await
        .context("Failed to read playdevice picture")?;

    match row {
        Some(row) => Ok(row.try_get("", "picture")?),
        None => Ok(None),
    }
}

/// Store a play-device picture as raw bytes. Returns affected rows.
pub async fn update_picture(
    conn: &impl ConnectionTrait,
    fid: i32,
    picture: &[u8],
    dry_run: bool,
) -> Result<u64> {
    if dry_run {
        return Ok(0);
    }
    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE playdevices SET picture = $1 WHERE fid = $2",
            [picture.to_vec().into(), fid.into()],
        ))
        .await
        .context("Failed to update playdevice picture")?;

    Ok(result.rows_affected())
}

fn map_feature(row: &QueryResult) -> Result<PlaydeviceFeature> {
    let comment: Option<String> = row.try_get("", "comment")?;
    let type_name: Option<String> = row.try_get("", "type_name")?;
    let type_description: Option<String> = row.try_get("", "type_description")?;
    let standard: Option<String> = row.try_get("", "standard")?;
    let material: Option<String> = row.try_get("", "material")?;
    let supplier: Option<String> = row.try_get("", "supplier")?;
    let cost_estimation: Option<f32> = row.try_get("", "cost_estimation")?;
    let year: Option<i32> = row.try_get("", "recommended_year_renovation")?;
    let comment_renovation: Option<String> = row.try_get("", "comment_renovation")?;
    let picture: Option<Vec<u8>> = row.try_get("", "picture")?;
    let geom_x: Option<f64> = row.try_get("", "geom_x")?;
    let geom_y: Option<f64> = row.try_get("", "geom_y")?;

    let geometry = match (geom_x, geom_y) {
        (Some(x), Some(y)) => PointGeometry::point(x, y),
        _ => PointGeometry::empty(),
    };

    // Legacy picture rows come in several encodings; hand the client a
    // plain base64 string regardless of what is stored.
    let picture_base64_string = match picture {
        Some(stored) if !stored.is_empty() => {
            let (bytes, _) = pictures::decode_stored(&stored);
            pictures::to_base64(&bytes)
        }
        _ => String::new(),
    };

    Ok(PlaydeviceFeature {
        properties: PlaydeviceFeatureProperties {
            fid: row.try_get("", "fid")?,
            comment: comment.unwrap_or_default(),
            device_type: PlaydeviceType {
                name: type_name.unwrap_or_default(),
                description: type_description.unwrap_or_default(),
                standard: standard.unwrap_or_default(),
            },
            supplier: supplier.unwrap_or_default(),
            material: material.unwrap_or_default(),
            cost_estimation: cost_estimation.unwrap_or(0.0),
            recommended_year_of_renovation: year.unwrap_or(0),
            comment_recommended_year_of_renovation: comment_renovation.unwrap_or_default(),
            picture_base64_string,
            ..PlaydeviceFeatureProperties::default()
        },
        geometry,
        ..PlaydeviceFeature::default()
    })
}

fn map_criterion(row: &QueryResult) -> Result<InspectionCriterion> {
    let realm: Option<String> = row.try_get("", "realm")?;
    let check: Option<String> = row.try_get("", "check_text")?;
    let check_short_text: Option<String> = row.try_get("", "check_short_text")?;
    let maintenance: Option<String> = row.try_get("", "maintenance_text")?;
    let inspection_type: Option<String> = row.try_get("", "inspection_type")?;

    Ok(InspectionCriterion {
        realm: realm.unwrap_or_default(),
        check: check.unwrap_or_default(),
        check_short_text: check_short_text.unwrap_or_default(),
        maintenance: maintenance.unwrap_or_default(),
        inspection_type: inspection_type.unwrap_or_default(),
        ..InspectionCriterion::default()
    })
}
