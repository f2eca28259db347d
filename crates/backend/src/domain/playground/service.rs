use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use contracts::domain::playground::{Playground, PlaygroundFeature};

use crate::domain::defect;
use crate::domain::inspection;
use crate::domain::playdevice;
use crate::domain::playground::repository;
use crate::shared::pictures;
use crate::shared::state::AppState;

/// Placeholder option offered next to the real inspection types when the
/// client asks for assigned playgrounds.
pub const NO_INSPECTION_OPTION: &str = "Keine Inspektion";

pub async fn get_by_id(state: &AppState, fid: i32) -> Result<Option<Playground>> {
    match repository::read_header_by_id(&state.db, fid).await? {
        Some((fid, name)) => Ok(Some(assemble(state, fid, name).await?)),
        None => Ok(None),
    }
}

pub async fn get_by_name(state: &AppState, name: &str) -> Result<Option<Playground>> {
    match repository::read_header_by_name(&state.db, name).await? {
        Some((fid, name)) => Ok(Some(assemble(state, fid, name).await?)),
        None => Ok(None),
    }
}

/// Build the full aggregate the client works on offline: devices with
/// details, criteria per inspection type, the two most recent report sets
/// and the open defects.
async fn assemble(state: &AppState, fid: i32, name: String) -> Result<Playground> {
    let defect_priority_options = defect::repository::priority_options(&state.db).await?;
    let inspection_type_options = inspection::repository::type_options(&state.db).await?;

    let mut playdevices = playdevice::repository::read_of_playground(&state.db, fid).await?;
    let mut date_of_last_inspection: Option<NaiveDateTime> = None;

    for device in &mut playdevices {
        playdevice::service::enrich(state, device, &inspection_type_options).await?;
        if device.properties.date_of_service > date_of_last_inspection {
            date_of_last_inspection = device.properties.date_of_service;
        }
    }

    Ok(Playground {
        id: fid,
        name,
        playdevices,
        date_of_last_inspection,
        defect_priority_options,
        inspection_type_options,
        ..Playground::default()
    })
}

/// Playground names with the newest inspection date, either all of them or
/// only those assigned to the caller for one inspection type.
pub async fn only_names(
    state: &AppState,
    mail: &str,
    inspection_type: Option<&str>,
) -> Result<Vec<Playground>> {
    match inspection_type {
        Some(option) if option != NO_INSPECTION_OPTION => {
            let base_name = inspection::repository::base_type_name(option);
            repository::only_names_for_inspector(&state.db, mail, base_name).await
        }
        _ => repository::only_names(&state.db).await,
    }
}

pub async fn features(state: &AppState) -> Result<Vec<PlaygroundFeature>> {
    repository::features(&state.db).await
}

pub async fn feature_by_fid(state: &AppState, fid: i32) -> Result<Option<PlaygroundFeature>> {
    repository::feature_by_fid(&state.db, fid).await
}

const MAP_IMAGE_WIDTH: u32 = 800;
const MAP_IMAGE_HEIGHT: u32 = 400;
const MAP_IMAGE_HALF_SPAN_X: f64 = 10.0;
const MAP_IMAGE_HALF_SPAN_Y: f64 = 5.0;

/// Fetch a map cut-out around a device location from the configured WMS
/// and return it base64 encoded. A zero coordinate yields an empty string.
pub async fn map_image(state: &AppState, x: f64, y: f64) -> Result<String> {
    if x == 0.0 || y == 0.0 {
        return Ok(String::new());
    }

    let url = format!(
        "{}&BBOX={},{},{},{}&WIDTH={}&HEIGHT={}",
        state.config.urls.wms_url,
        x - MAP_IMAGE_HALF_SPAN_X,
        y - MAP_IMAGE_HALF_SPAN_Y,
        x + MAP_IMAGE_HALF_SPAN_X,
        y + MAP_IMAGE_HALF_SPAN_Y,
        MAP_IMAGE_WIDTH,
        MAP_IMAGE_HEIGHT,
    );

    let response = reqwest::get(&url)
        .await
        .context("Failed to request map image from WMS")?;
    let bytes = response
        .bytes()
        .await
        .context("Failed to read map image response")?;

    Ok(pictures::to_base64(&bytes))
}
