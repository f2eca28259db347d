use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::domain::playdevice::PlaydeviceFeature;
use contracts::shared::error::{ErrorMessage, UNAUTHORIZED_MESSAGE};
use contracts::shared::image::ImagePayload;
use serde::Deserialize;

use crate::domain::playdevice::service;
use crate::shared::state::AppState;
use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service as user_service;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunQuery {
    #[serde(default)]
    pub dry_run: bool,
}

/// GET /Playdevice/{fid}
pub async fn get(
    State(state): State<AppState>,
    Path(fid): Path<i32>,
) -> Result<Json<PlaydeviceFeature>, (StatusCode, &'static str)> {
    let device = service::get_playdevice(&state, fid).await.map_err(|err| {
        tracing::error!("Reading playdevice {fid} failed: {err:#}");
        (StatusCode::INTERNAL_SERVER_ERROR, "")
    })?;

    match device {
        Some(device) => Ok(Json(device)),
        None => Err((StatusCode::BAD_REQUEST, "No playdevice found for given fid.")),
    }
}

/// POST /Playdevice
///
/// Stores the renovation planning fields of the received features.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<DryRunQuery>,
    Json(playdevices): Json<Vec<PlaydeviceFeature>>,
) -> Result<Json<ErrorMessage>, (StatusCode, &'static str)> {
    let _user = user_service::get_authorized_inspector(&state, &claims)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE))?;

    match service::update_renovations(&state, &playdevices, query.dry_run).await {
        Ok(()) => Ok(Json(ErrorMessage::ok())),
        Err(err) => {
            tracing::error!("Updating playdevice renovations failed: {err:#}");
            Ok(Json(ErrorMessage::code("SPK-3")))
        }
    }
}

/// GET /Playdevice/{fid}/Picture
pub async fn get_picture(
    State(state): State<AppState>,
    Path(fid): Path<i32>,
) -> Result<Response, StatusCode> {
    let picture = service::get_picture(&state, fid).await.map_err(|err| {
        tracing::error!("Reading playdevice picture {fid} failed: {err:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match picture {
        Some((bytes, content_type)) => {
            Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// PUT /Playdevice/{fid}/Picture
pub async fn put_picture(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(fid): Path<i32>,
    Query(query): Query<DryRunQuery>,
    Json(payload): Json<ImagePayload>,
) -> Result<Json<ErrorMessage>, (StatusCode, &'static str)> {
    let _user = user_service::get_authorized_inspector(&state, &claims)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE))?;

    match service::put_picture(&state, fid, &payload.data, query.dry_run).await {
        Ok(true) => Ok(Json(ErrorMessage::ok())),
        Ok(false) => Ok(Json(ErrorMessage::code("SPK-3"))),
        Err(err) => {
            tracing::error!("Storing playdevice picture {fid} failed: {err:#}");
            Ok(Json(ErrorMessage::code("SPK-3")))
        }
    }
}

fn internal(err: anyhow::Error) -> (StatusCode, &'static str) {
    tracing::error!("Resolving inspector failed: {err:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, "")
}
