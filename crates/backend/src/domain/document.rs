use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use serde::Deserialize;

use crate::shared::state::AppState;

/// Kind of stored PDF document attached to a play-device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Acceptance,
    Certificate,
}

impl DocumentKind {
    /// Parse the client's type parameter, case and whitespace insensitive.
    pub fn parse(value: &str) -> Option<DocumentKind> {
        match value.trim().to_lowercase().as_str() {
            "abnahme" => Some(DocumentKind::Acceptance),
            "zertifikat" => Some(DocumentKind::Certificate),
            _ => None,
        }
    }

    fn table(&self) -> &'static str {
        match self {
            DocumentKind::Acceptance => "acceptance_documents",
            DocumentKind::Certificate => "certificate_documents",
        }
    }
}

/// The stored PDF for a play-device, if one exists.
pub async fn read_pdf(
    conn: &impl ConnectionTrait,
    playdevice_fid: i32,
    kind: DocumentKind,
) -> Result<Option<Vec<u8>>> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &format!(
                "SELECT document FROM {} WHERE fid_playdevice = $1",
                kind.table()
            ),
            [playdevice_fid.into()],
        ))
        .await
        .context("Failed to read playdevice document")?;

    match row {
        Some(row) => Ok(row.try_get("", "document")?),
        None => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// GET /Document/{fid}
///
/// The acceptance or certificate PDF of a play-device.
pub async fn get(
    State(state): State<AppState>,
    Path(fid): Path<i32>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response, (StatusCode, &'static str)> {
    let kind = query
        .kind
        .as_deref()
        .and_then(DocumentKind::parse)
        .ok_or((StatusCode::BAD_REQUEST, "No valid document type provided."))?;

    let document = read_pdf(&state.db, fid, kind).await.map_err(|err| {
        tracing::error!("Reading document for playdevice {fid} failed: {err:#}");
        (StatusCode::INTERNAL_SERVER_ERROR, "")
    })?;

    match document {
        Some(bytes) if !bytes.is_empty() => {
            Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
        }
        _ => Err((StatusCode::BAD_REQUEST, "No document found for given fid.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_lenient() {
        assert_eq!(DocumentKind::parse(" Abnahme "), Some(DocumentKind::Acceptance));
        assert_eq!(DocumentKind::parse("ZERTIFIKAT"), Some(DocumentKind::Certificate));
        assert_eq!(DocumentKind::parse("protokoll"), None);
        assert_eq!(DocumentKind::parse(""), None);
    }
}
