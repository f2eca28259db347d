use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::inspection::InspectionReportsAndDefects;
use contracts::shared::error::{ErrorMessage, UNAUTHORIZED_MESSAGE};
use serde::Deserialize;

use crate::domain::inspection::service;
use crate::domain::inspection::service::SubmissionOutcome;
use crate::shared::state::AppState;
use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service as user_service;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunQuery {
    #[serde(default)]
    pub dry_run: bool,
}

/// POST /Inspection
///
/// Stores a full inspection submission. Rejections are reported through
/// the errorMessage envelope with status 200, as the client expects.
pub async fn submit(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<DryRunQuery>,
    Json(payload): Json<InspectionReportsAndDefects>,
) -> Result<Json<ErrorMessage>, (StatusCode, &'static str)> {
    let user = user_service::get_authorized_inspector(&state, &claims)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE))?;

    match service::submit(&state, &payload, &user, query.dry_run).await {
        Ok(SubmissionOutcome::Accepted) => Ok(Json(ErrorMessage::ok())),
        Ok(outcome) => Ok(Json(ErrorMessage::code(outcome.error_code()))),
        Err(err) => {
            tracing::error!("Storing inspection submission failed: {err:#}");
            Ok(Json(ErrorMessage::code("SPK-3")))
        }
    }
}

/// GET /Inspection/Types
pub async fn types(State(state): State<AppState>) -> Result<Json<Vec<String>>, StatusCode> {
    match service::type_options(&state).await {
        Ok(options) => Ok(Json(options)),
        Err(err) => {
            tracing::error!("Reading inspection types failed: {err:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /Inspection/renovationtypes
pub async fn renovation_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, StatusCode> {
    match service::renovation_type_options(&state).await {
        Ok(options) => Ok(Json(options)),
        Err(err) => {
            tracing::error!("Reading renovation types failed: {err:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn internal(err: anyhow::Error) -> (StatusCode, &'static str) {
    tracing::error!("Resolving inspector failed: {err:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, "")
}
