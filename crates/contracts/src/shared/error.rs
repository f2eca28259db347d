use serde::{Deserialize, Serialize};

/// Application-level error envelope.
///
/// Validation failures travel as short `SPK-n` codes inside a 200 response;
/// only authentication problems surface as HTTP error statuses. An empty
/// `error_message` means success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub error_message: String,
}

impl ErrorMessage {
    pub fn ok() -> Self {
        ErrorMessage::default()
    }

    pub fn code(code: &str) -> Self {
        ErrorMessage {
            error_message: code.to_string(),
        }
    }
}

/// Fixed text returned with every 401, mirroring the client-facing wording
/// of the legacy service.
pub const UNAUTHORIZED_MESSAGE: &str = "Sie sind entweder nicht als Kontrolleur in der \
     Spielplatzkontrolle-Datenbank erfasst oder Sie haben keine Zugriffsberechtigung.";
