use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::shared::config::Config;

const PBKDF2_ITERATIONS: u32 = 100_000;
const HASH_LENGTH: usize = 32;

/// Derive the stored form of a passphrase: PBKDF2-HMAC-SHA256 with the
/// configured salt, base64 encoded. The database keeps only this value.
pub fn hash_passphrase(config: &Config, passphrase: &str) -> Result<String> {
    let salt = general_purpose::STANDARD
        .decode(&config.auth.salt_base64)
        .context("Configured salt is not valid base64")?;

    let mut derived = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(
        passphrase.as_bytes(),
        &salt,
        PBKDF2_ITERATIONS,
        &mut derived,
    );

    Ok(general_purpose::STANDARD.encode(derived))
}

/// Compare a cleartext passphrase against a stored hash.
pub fn verify_passphrase(config: &Config, passphrase: &str, stored_hash: &str) -> Result<bool> {
    let computed = hash_passphrase(config, passphrase)?;
    Ok(computed == stored_hash)
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
            security_key = "test-key"
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
    fn hashing_is_deterministic_for_same_salt() {
        let config = test_config();
        let first = hash_passphrase(&config, "correct horse battery").unwrap();
        let second = hash_passphrase(&config, "correct horse battery").unwrap();
        assert_eq!(first, second);
        // 32 bytes of output, base64 encoded
        assert_eq!(first.len(), 44);
    }

    #[test]
    fn verify_accepts_matching_and_rejects_wrong_passphrase() {
        let config = test_config();
        let stored = hash_passphrase(&config, "secret-passphrase").unwrap();
        assert!(verify_passphrase(&config, "secret-passphrase", &stored).unwrap());
        assert!(!verify_passphrase(&config, "other-passphrase", &stored).unwrap());
    }

    #[test]
    fn different_salts_produce_different_hashes() {
        let config = test_config();
        let mut other = test_config();
        other.auth.salt_base64 = "YW5kZXJlcy1zYWx6".to_string();
        let a = hash_passphrase(&config, "same input").unwrap();
        let b = hash_passphrase(&other, "same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_salt_is_reported() {
        let mut config = test_config();
        config.auth.salt_base64 = "%%%".to_string();
        assert!(hash_passphrase(&config, "whatever").is_err());
    }
}
