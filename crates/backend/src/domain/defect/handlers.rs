use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::domain::defect::{Defect, DefectPicture};
use contracts::shared::error::{ErrorMessage, UNAUTHORIZED_MESSAGE};
use contracts::shared::image::ImagePayload;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::defect::service;
use crate::shared::state::AppState;
use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service as user_service;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunQuery {
    #[serde(default)]
    pub dry_run: bool,
}

/// GET /Defect/{tid}
pub async fn get_by_tid(
    State(state): State<AppState>,
    Path(tid): Path<i32>,
) -> Result<Json<Defect>, (StatusCode, &'static str)> {
    let defect = service::get_defect(&state, tid).await.map_err(internal)?;
    match defect {
        Some(defect) => Ok(Json(defect)),
        None => Err((StatusCode::BAD_REQUEST, "No defect found for given tid.")),
    }
}

/// POST /Defect
///
/// Insert defects reported outside an inspection. Responds with the tids
/// that were assigned so the client can attach pictures.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<DryRunQuery>,
    Json(defects): Json<Vec<Defect>>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    let user = user_service::get_authorized_inspector(&state, &claims)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE))?;

    match service::create_defects(&state, &defects, &user, query.dry_run).await {
        Ok(tids) => Ok(Json(json!({ "errorMessage": "", "tids": tids }))),
        Err(err) => {
            tracing::error!("Inserting defects failed: {err:#}");
            Ok(Json(json!(ErrorMessage::code("SPK-3"))))
        }
    }
}

/// PUT /Defect
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<DryRunQuery>,
    Json(defects): Json<Vec<Defect>>,
) -> Result<Json<ErrorMessage>, (StatusCode, &'static str)> {
    let user = user_service::get_authorized_inspector(&state, &claims)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE))?;

    match service::update_defects(&state, &defects, &user, query.dry_run).await {
        Ok(()) => Ok(Json(ErrorMessage::ok())),
        Err(err) => {
            tracing::error!("Updating defects failed: {err:#}");
            Ok(Json(ErrorMessage::code("SPK-3")))
        }
    }
}

/// GET /Defect/Picture/{tid}
pub async fn get_picture(
    State(state): State<AppState>,
    Path(tid): Path<i32>,
) -> Result<Response, StatusCode> {
    let picture = service::get_picture(&state, tid).await.map_err(|err| {
        tracing::error!("Reading defect picture {tid} failed: {err:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match picture {
        Some((bytes, content_type)) => {
            Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// PUT /Defect/Picture/{tid}
pub async fn put_picture(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tid): Path<i32>,
    Query(query): Query<DryRunQuery>,
    Json(payload): Json<ImagePayload>,
) -> Result<Json<ErrorMessage>, (StatusCode, &'static str)> {
    let _user = user_service::get_authorized_inspector(&state, &claims)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE))?;

    match service::put_picture(&state, tid, &payload.data, query.dry_run).await {
        Ok(true) => Ok(Json(ErrorMessage::ok())),
        Ok(false) => Ok(Json(ErrorMessage::code("SPK-3"))),
        Err(err) => {
            tracing::error!("Storing defect picture {tid} failed: {err:#}");
            Ok(Json(ErrorMessage::code("SPK-3")))
        }
    }
}

/// POST /Defect/{tid}/Picture
pub async fn attach_picture(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(tid): Path<i32>,
    Query(query): Query<DryRunQuery>,
    Json(picture): Json<DefectPicture>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    let _user = user_service::get_authorized_inspector(&state, &claims)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE))?;

    match service::attach_picture(&state, tid, &picture, query.dry_run).await {
        Ok(Some(picture_tid)) => Ok(Json(json!({ "errorMessage": "", "tid": picture_tid }))),
        Ok(None) if query.dry_run => Ok(Json(json!({ "errorMessage": "", "tid": -1 }))),
        Ok(None) => Ok(Json(json!(ErrorMessage::code("SPK-3")))),
        Err(err) => {
            tracing::error!("Attaching defect picture to {tid} failed: {err:#}");
            Ok(Json(json!(ErrorMessage::code("SPK-3"))))
        }
    }
}

fn internal(err: anyhow::Error) -> (StatusCode, &'static str) {
    tracing::error!("Defect request failed: {err:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, "")
}
