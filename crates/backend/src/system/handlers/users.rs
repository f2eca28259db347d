use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use contracts::shared::error::ErrorMessage;
use contracts::system::users::UserAccount;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::shared::state::AppState;
use crate::system::users::service as user_service;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuery {
    #[serde(default)]
    pub change_passphrase: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub email: Option<String>,
}

/// GET /Account/Users
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UserAccount>>, StatusCode> {
    let accounts = user_service::list_users(&state, query.email.as_deref())
        .await
        .map_err(|err| {
            tracing::error!("Listing accounts failed: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(accounts))
}

/// PUT /Account/Users
///
/// Responds with the updated account on success, or an error envelope with
/// status 200 when the update was rejected.
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<UpdateQuery>,
    Json(account): Json<UserAccount>,
) -> Json<Value> {
    match user_service::update_user(&state, account, query.change_passphrase).await {
        Ok(Some(updated)) => Json(json!(updated.sanitized())),
        Ok(None) => Json(json!(ErrorMessage::code("SPK-3"))),
        Err(err) => {
            tracing::error!("Updating account failed: {err:#}");
            Json(json!(ErrorMessage::code("SPK-3")))
        }
    }
}

/// DELETE /Account/Users?email=...
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Json<ErrorMessage> {
    let email = match query.email {
        Some(email) => email,
        None => {
            tracing::warn!("No mail address provided in account deletion");
            return Json(ErrorMessage::code("SPK-3"));
        }
    };

    match user_service::delete_user(&state, &email).await {
        Ok(true) => Json(ErrorMessage::ok()),
        Ok(false) => Json(ErrorMessage::code("SPK-3")),
        Err(err) => {
            tracing::error!("Deleting account failed: {err:#}");
            Json(ErrorMessage::code("SPK-3"))
        }
    }
}
