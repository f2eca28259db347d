use serde::{Deserialize, Serialize};

/// Role of a service account. Stored as plain text in the database and
/// carried as a claim in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Inspector,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Inspector => "inspector",
            Role::Administrator => "administrator",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "inspector" => Some(Role::Inspector),
            "administrator" => Some(Role::Administrator),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub mail_address: String,
    pub pass_phrase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub security_token_string: String,
}

/// Claims of the HMAC-signed access token. Issuer and audience are both the
/// public service URL; tokens are valid for two days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Mail address of the account, trimmed and lowercased.
    pub sub: String,
    pub given_name: String,
    pub family_name: String,
    pub role: Role,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

impl TokenClaims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_uses_wire_field_names() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"mailAddress":"a@b.ch","passPhrase":"secret123"}"#).unwrap();
        assert_eq!(req.mail_address, "a@b.ch");
        assert_eq!(req.pass_phrase, "secret123");
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(Role::parse("administrator"), Some(Role::Administrator));
        assert_eq!(Role::parse("inspector"), Some(Role::Inspector));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::Administrator.as_str(), "administrator");
    }
}
