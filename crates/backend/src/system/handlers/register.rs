use axum::extract::{Query, State};
use axum::response::Html;
use axum::Form;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::shared::state::AppState;
use crate::system::users::service as user_service;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterQuery {
    pub uuid: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub password1: String,
    pub password2: String,
}

/// GET /Account/Register?uuid=...
///
/// Serves the small HTML form through which invited inspectors set their
/// initial password. The one-time UUID comes from the invitation link.
pub async fn form(Query(query): Query<RegisterQuery>) -> Html<String> {
    Html(form_page(query.uuid.as_deref()))
}

/// The set-password page. The uuid lands in the form's action attribute
/// re-rendered from the parsed value; the raw query text never reaches
/// the page.
fn form_page(raw_uuid: Option<&str>) -> String {
    let uuid = raw_uuid.and_then(|raw| Uuid::parse_str(raw).ok());

    let mut content = String::from("<html><body><h1>Passwort setzen</h1>");
    let uuid = match uuid {
        Some(uuid) => uuid.to_string(),
        None => {
            content.push_str(
                "<p style=\"color:red;\">Bitte geben Sie in der URL eine g&uuml;ltige UUID an, \
                 in der Form: \".../?uuid=...\".</p>",
            );
            String::new()
        }
    };
    content.push_str(&format!(
        "<form action=\"?uuid={uuid}\" method=\"post\" \
         enctype=\"application/x-www-form-urlencoded\">\
         Passwort (min 8 Zeichen):&nbsp;\
         <input type=\"password\" name=\"password1\" minlength=\"8\" required><br><br>\
         Passwort wiederholen:&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;&nbsp;\
         <input type=\"password\" name=\"password2\" minlength=\"8\" required><br><br>\
         <input type=\"submit\"></form>"
    ));
    content.push_str("</body></html>");

    content
}

/// POST /Account/Register?uuid=...
pub async fn submit(
    State(state): State<AppState>,
    Query(query): Query<RegisterQuery>,
    Form(form): Form<RegisterForm>,
) -> Html<String> {
    // make brute force costly
    tokio::time::sleep(Duration::from_secs(1)).await;

    let uuid = query.uuid.unwrap_or_default();
    if Uuid::parse_str(&uuid).is_err() {
        tracing::warn!("Password could not be set, malformed registration UUID");
        return error_page("UUID ist fehlerhaft.");
    }

    if form.password1.len() < MIN_PASSWORD_LENGTH || form.password2.len() < MIN_PASSWORD_LENGTH {
        tracing::warn!("Password could not be set, below minimum requirements");
        return error_page("Das Passwort erf&uuml;llt nicht die Mindestanforderungen.");
    }

    if form.password1 != form.password2 {
        tracing::warn!("Password could not be set, repeated password differs");
        return error_page("Die beiden eingegebenen Passw&ouml;rter sind nicht gleich.");
    }

    if query.dry_run {
        return Html(String::new());
    }

    match user_service::complete_registration(&state, &uuid, &form.password1, false).await {
        Ok(true) => {
            tracing::info!("Password of an invited account was set");
            Html(
                "<html><body><h1>Passwort gesetzt</h1><p>Vielen Dank.</p></body></html>"
                    .to_string(),
            )
        }
        Ok(false) => {
            tracing::warn!("Password could not be set, registration UUID not valid");
            generic_error_page()
        }
        Err(err) => {
            tracing::error!("Password could not be set: {err:#}");
            generic_error_page()
        }
    }
}

fn error_page(reason: &str) -> Html<String> {
    Html(format!(
        "<html><body><h1>Passwort konnte nicht gesetzt werden</h1><p>{reason}</p></body></html>"
    ))
}

fn generic_error_page() -> Html<String> {
    Html(
        "<html><body><h1>Passwort konnte nicht gesetzt werden</h1>\
         <p>Es ist ein Fehler aufgetreten.</p>\
         <p>Bitte wenden Sie sich an den Applikationsverantwortlichen.</p></body></html>"
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_embeds_a_valid_uuid() {
        let page = form_page(Some("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(page.contains("action=\"?uuid=67e55044-10b1-426f-9247-bb680e5fe0c8\""));
        assert!(!page.contains("color:red"));
    }

    #[test]
    fn form_never_reflects_unparsed_query_text() {
        let page = form_page(Some("\"><script>alert(1)</script>"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("action=\"?uuid=\""));
        assert!(page.contains("color:red"));
    }

    #[test]
    fn form_without_uuid_shows_the_hint() {
        let page = form_page(None);
        assert!(page.contains("color:red"));
        assert!(page.contains("action=\"?uuid=\""));
    }
}
