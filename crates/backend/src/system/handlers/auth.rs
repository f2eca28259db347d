use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use contracts::shared::error::UNAUTHORIZED_MESSAGE;
use contracts::system::auth::{LoginRequest, LoginResponse};
use serde::Deserialize;

use crate::shared::state::AppState;
use crate::system::users::service as user_service;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginQuery {
    #[serde(default)]
    pub dry_run: bool,
}

/// POST /Account/Login
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, &'static str)> {
    if request.mail_address.trim().is_empty() || request.pass_phrase.trim().is_empty() {
        tracing::warn!("No or bad login credentials provided in a login attempt");
        return Err((StatusCode::BAD_REQUEST, "No or bad login credentials provided."));
    }

    let token = user_service::authenticate(&state, &request, query.dry_run)
        .await
        .map_err(|err| {
            tracing::error!("Login failed with internal error: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "")
        })?;

    match token {
        Some(security_token_string) => Ok(Json(LoginResponse {
            security_token_string,
        })),
        None => Err((StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)),
    }
}
