use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::shared::config::Config;

/// Shared application state handed to every handler through axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
}
