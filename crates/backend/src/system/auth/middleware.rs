use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use contracts::shared::error::UNAUTHORIZED_MESSAGE;

use crate::shared::state::AppState;

/// Middleware that requires a valid access token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = claims_from_request(&state, &req)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware that additionally requires the administrator role
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = claims_from_request(&state, &req)?;
    if !claims.is_admin() {
        return Err(StatusCode::FORBIDDEN.into_response());
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn claims_from_request(
    state: &AppState,
    req: &Request<Body>,
) -> Result<contracts::system::auth::TokenClaims, Response> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(unauthorized)?;

    super::jwt::validate_token(&state.config, token).map_err(|err| {
        tracing::warn!("Rejected access token: {err:#}");
        unauthorized()
    })
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE).into_response()
}
