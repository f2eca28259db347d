use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::system::auth::Role;

/// A service account as exchanged with the client application.
///
/// `pass_phrase` is only ever populated on the way in (login, password
/// change); responses leave it empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(default)]
    pub fid: i32,
    pub mail_address: String,
    #[serde(default)]
    pub pass_phrase: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    pub role: Role,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_attempt: Option<NaiveDateTime>,
}

impl UserAccount {
    /// Strips everything that must not leave the service.
    pub fn sanitized(mut self) -> Self {
        self.pass_phrase = String::new();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_clears_the_passphrase() {
        let user = UserAccount {
            fid: 1,
            mail_address: "a@b.ch".into(),
            pass_phrase: "secret123".into(),
            last_name: "Muster".into(),
            first_name: "Max".into(),
            role: Role::Inspector,
            active: true,
            last_login_attempt: None,
        };
        let out = serde_json::to_value(user.sanitized()).unwrap();
        assert_eq!(out["passPhrase"], "");
        assert_eq!(out["mailAddress"], "a@b.ch");
    }
}
