use axum::Json;

/// GET /
///
/// Liveness probe for monitoring, reachable without a token.
pub async fn index() -> Json<&'static str> {
    Json("Spielplatzkontrolle service is up and running.")
}
