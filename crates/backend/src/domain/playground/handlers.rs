use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::playground::{
    Playground, PlaygroundFeature, PlaygroundFeatureCollection,
};
use serde::Deserialize;

use crate::domain::playground::service;
use crate::shared::state::AppState;
use crate::system::auth::extractor::CurrentUser;

/// GET /Playground/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Playground>, (StatusCode, &'static str)> {
    let playground = service::get_by_id(&state, id).await.map_err(internal)?;
    match playground {
        Some(playground) => Ok(Json(playground)),
        None => Err((StatusCode::BAD_REQUEST, "No playground found for given id.")),
    }
}

#[derive(Debug, Deserialize)]
pub struct ByNameQuery {
    pub name: Option<String>,
}

/// GET /Playground/byname?name=...
pub async fn get_by_name(
    State(state): State<AppState>,
    Query(query): Query<ByNameQuery>,
) -> Result<Json<Playground>, (StatusCode, &'static str)> {
    let name = query
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "No playground name provided."))?;

    let playground = service::get_by_name(&state, name).await.map_err(internal)?;
    match playground {
        Some(playground) => Ok(Json(playground)),
        None => Err((StatusCode::BAD_REQUEST, "No playground found for given name.")),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlyNamesQuery {
    pub inspection_type: Option<String>,
}

/// GET /Playground/onlynames?inspectionType=...
pub async fn only_names(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<OnlyNamesQuery>,
) -> Result<Json<Vec<Playground>>, (StatusCode, &'static str)> {
    let names = service::only_names(&state, &claims.sub, query.inspection_type.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(names))
}

#[derive(Debug, Deserialize)]
pub struct MapImageQuery {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// GET /Playground/mapimage
///
/// Base64 encoded map cut-out around a coordinate, fetched from the WMS.
pub async fn map_image(
    State(state): State<AppState>,
    Query(query): Query<MapImageQuery>,
) -> Result<Json<String>, StatusCode> {
    match service::map_image(&state, query.x, query.y).await {
        Ok(image) => Ok(Json(image)),
        Err(err) => {
            tracing::error!("Fetching map image failed: {err:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /Collections/Playgrounds/Items
pub async fn collection_items(
    State(state): State<AppState>,
) -> Result<Json<PlaygroundFeatureCollection>, StatusCode> {
    match service::features(&state).await {
        Ok(features) => Ok(Json(PlaygroundFeatureCollection::new(features))),
        Err(err) => {
            tracing::error!("Reading playground collection failed: {err:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /Collections/Playgrounds/Items/{fid}
///
/// Always responds with a feature; failures are reported through its
/// errorMessage field, as the map client expects.
pub async fn collection_item(
    State(state): State<AppState>,
    Path(fid): Path<i32>,
) -> Json<PlaygroundFeature> {
    if fid < 0 {
        return Json(error_feature("No playground found for given fid."));
    }

    match service::feature_by_fid(&state, fid).await {
        Ok(Some(feature)) => Json(feature),
        Ok(None) => Json(error_feature("No playground found for given fid.")),
        Err(err) => {
            tracing::error!("Reading playground feature {fid} failed: {err:#}");
            Json(error_feature("Unknown critical error."))
        }
    }
}

fn error_feature(message: &str) -> PlaygroundFeature {
    PlaygroundFeature {
        error_message: message.to_string(),
        ..PlaygroundFeature::default()
    }
}

fn internal(err: anyhow::Error) -> (StatusCode, &'static str) {
    tracing::error!("Reading playground failed: {err:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, "")
}
