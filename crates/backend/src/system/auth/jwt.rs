use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::{Role, TokenClaims};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::shared::config::Config;

const TOKEN_LIFETIME_DAYS: i64 = 2;

/// Issue an access token for an authenticated inspector. Issuer and
/// audience are both the public service URL.
pub fn generate_token(
    config: &Config,
    mail_address: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> Result<String> {
    let now = Utc::now();
    let exp = (now + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = TokenClaims {
        sub: mail_address.to_string(),
        given_name: first_name.to_string(),
        family_name: last_name.to_string(),
        role,
        iss: config.urls.service_url.clone(),
        aud: config.urls.service_url.clone(),
        exp,
        iat,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.auth.security_key.as_bytes()),
    )
    .context("Failed to encode JWT token")?;

    Ok(token)
}

/// Validate a token and extract its claims. Signature, expiry, issuer and
/// audience must all match.
pub fn validate_token(config: &Config, token: &str) -> Result<TokenClaims> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.urls.service_url]);
    validation.set_audience(&[&config.urls.service_url]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.auth.security_key.as_bytes()),
        &validation,
    )
    .context("Failed to decode JWT token")?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        toml::from_str(
            r#"
            [server]
            port = 3000
            [database]
            url = "postgres://localhost/test"
            [auth]
            security_key = "test-key-with-enough-entropy-for-hmac"
            salt_base64 = "dGVzdC1zYWx0"
            [urls]
            service_url = "http://localhost:3000"
            client_url = "http://localhost:4200"
            wms_url = "http://localhost:8080/wms/"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn token_round_trips() {
        let config = test_config();
        let token =
            generate_token(&config, "a@b.ch", "Max", "Muster", Role::Inspector).unwrap();
        let claims = validate_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "a@b.ch");
        assert_eq!(claims.given_name, "Max");
        assert_eq!(claims.family_name, "Muster");
        assert_eq!(claims.role, Role::Inspector);
        assert!(!claims.is_admin());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let token =
            generate_token(&config, "a@b.ch", "Max", "Muster", Role::Administrator).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(validate_token(&config, &tampered).is_err());
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let config = test_config();
        let mut other = test_config();
        other.urls.service_url = "http://evil.example".to_string();
        let token = generate_token(&other, "a@b.ch", "Max", "Muster", Role::Inspector).unwrap();
        assert!(validate_token(&config, &token).is_err());
    }
}
