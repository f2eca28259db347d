use anyhow::Result;
use chrono::{NaiveDateTime, NaiveTime};
use contracts::domain::defect::Defect;
use contracts::domain::playdevice::{PlaydeviceFeature, PlaydeviceFeatureProperties};

use crate::domain::defect::repository as defect_repository;
use crate::domain::inspection::repository as inspection_repository;
use crate::domain::playdevice::repository;
use crate::domain::playdevice::repository::CriteriaCategory;
use crate::shared::pictures;
use crate::shared::state::AppState;

/// One play-device, fully loaded: details, criteria, recent reports and
/// open defects.
pub async fn get_playdevice(state: &AppState, fid: i32) -> Result<Option<PlaydeviceFeature>> {
    let device = match repository::read_by_fid(&state.db, fid).await? {
        Some(device) => device,
        None => return Ok(None),
    };

    let type_options = inspection_repository::type_options(&state.db).await?;
    let mut device = device;
    enrich(state, &mut device, &type_options).await?;
    Ok(Some(device))
}

/// Fill a bare device feature with its details, inspection criteria, the
/// two most recent report sets per inspection type, and open defects.
pub async fn enrich(
    state: &AppState,
    device: &mut PlaydeviceFeature,
    type_options: &[String],
) -> Result<()> {
    let device_fid = device.properties.fid;

    device.playdevice_details = repository::read_details(&state.db, device_fid).await?;

    for option in type_options {
        let base_name = inspection_repository::base_type_name(option);

        let general = repository::criteria_of_playdevice(
            &state.db,
            device_fid,
            base_name,
            CriteriaCategory::General,
        )
        .await?;
        device.properties.general_inspection_criteria.extend(general);

        let main = repository::criteria_of_playdevice(
            &state.db,
            device_fid,
            base_name,
            CriteriaCategory::MainFallProtection,
        )
        .await?;
        device
            .properties
            .main_fall_protection_inspection_criteria
            .extend(main);

        let secondary = repository::criteria_of_playdevice(
            &state.db,
            device_fid,
            base_name,
            CriteriaCategory::SecondaryFallProtection,
        )
        .await?;
        device
            .properties
            .secondary_fall_protection_inspection_criteria
            .extend(secondary);

        fill_reports(state, &mut device.properties, device_fid, option, false).await?;

        for detail in &mut device.playdevice_details {
            let detail_fid = detail.properties.fid;
            let criteria =
                repository::criteria_of_detail(&state.db, detail_fid, base_name).await?;
            detail.properties.general_inspection_criteria.extend(criteria);

            fill_reports(state, &mut detail.properties, detail_fid, option, true).await?;
        }
    }

    device.properties.defects = open_defects_with_pictures(state, device_fid, false).await?;
    for detail in &mut device.playdevice_details {
        detail.properties.defects =
            open_defects_with_pictures(state, detail.properties.fid, true).await?;
    }

    Ok(())
}

/// Fill the last and next-to-last report lists of a device or detail for
/// one inspection type option, and advance its date of service.
async fn fill_reports(
    state: &AppState,
    properties: &mut PlaydeviceFeatureProperties,
    fid: i32,
    type_option: &str,
    is_detail: bool,
) -> Result<()> {
    let dates =
        inspection_repository::last_inspection_dates(&state.db, fid, type_option, is_detail)
            .await?;

    if let Some(last) = dates.first() {
        let reports = inspection_repository::reports_for_date(
            &state.db,
            fid,
            type_option,
            *last,
            is_detail,
        )
        .await?;
        properties.last_inspection_reports.extend(reports);

        let last = NaiveDateTime::new(*last, NaiveTime::MIN);
        if properties.date_of_service.map_or(true, |d| last > d) {
            properties.date_of_service = Some(last);
        }
    }
    if let Some(next_to_last) = dates.get(1) {
        let reports = inspection_repository::reports_for_date(
            &state.db,
            fid,
            type_option,
            *next_to_last,
            is_detail,
        )
        .await?;
        properties.next_to_last_inspection_reports.extend(reports);
    }

    Ok(())
}

async fn open_defects_with_pictures(
    state: &AppState,
    fid: i32,
    is_detail: bool,
) -> Result<Vec<Defect>> {
    let mut defects =
        defect_repository::read_open_of_playdevice(&state.db, fid, is_detail).await?;
    for open in &mut defects {
        open.defect_pics_tids =
            defect_repository::picture_tids(&state.db, open.tid, false).await?;
        open.defect_pics_after_fixing_tids =
            defect_repository::picture_tids(&state.db, open.tid, true).await?;
    }
    Ok(defects)
}

/// Apply the renovation planning fields of the received features.
pub async fn update_renovations(
    state: &AppState,
    playdevices: &[PlaydeviceFeature],
    dry_run: bool,
) -> Result<()> {
    for playdevice in playdevices {
        repository::update_renovation(&state.db, &playdevice.properties, dry_run).await?;
    }
    Ok(())
}

/// Decode a stored play-device picture into raw bytes and a content type.
pub async fn get_picture(state: &AppState, fid: i32) -> Result<Option<(Vec<u8>, &'static str)>> {
    let stored = repository::read_picture(&state.db, fid).await?;
    Ok(stored
        .filter(|bytes| !bytes.is_empty())
        .map(|bytes| pictures::decode_stored(&bytes)))
}

/// Store an uploaded picture, normalized to raw bytes. Returns false when
/// the payload is not decodable or the device does not exist.
pub async fn put_picture(
    state: &AppState,
    fid: i32,
    payload: &str,
    dry_run: bool,
) -> Result<bool> {
    let bytes = match pictures::normalize_upload(payload) {
        Some(bytes) => bytes,
        None => return Ok(false),
    };
    if dry_run {
        return Ok(true);
    }
    let affected = repository::update_picture(&state.db, fid, &bytes, false).await?;
    Ok(affected == 1)
}
