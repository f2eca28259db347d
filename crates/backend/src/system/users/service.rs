use anyhow::Result;
use contracts::system::auth::{LoginRequest, Role, TokenClaims};
use contracts::system::users::UserAccount;
use std::time::Duration;

use crate::shared::state::AppState;
use crate::system::auth::{jwt, password};
use crate::system::users::repository::{self, StoredUser};

/// Minimum spacing between login attempts before a deterrent delay kicks in.
const LOGIN_THROTTLE_SECONDS: i64 = 3;
const MIN_PASSPHRASE_LENGTH: usize = 8;

pub fn normalize_mail(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Rudimentary mail address plausibility check, enough to keep garbage out
/// of the account table.
pub fn is_plausible_mail(mail: &str) -> bool {
    match mail.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// The last active administrator must stay an active administrator.
pub fn violates_last_admin_guard(
    target_is_admin: bool,
    active_admin_count: i64,
    new_role: Role,
    new_active: bool,
) -> bool {
    target_is_admin
        && active_admin_count == 1
        && (new_role != Role::Administrator || !new_active)
}

/// Verify credentials and issue an access token.
///
/// Every attempt stamps the account's last-login-attempt column. When two
/// attempts arrive within three seconds the call sleeps for three seconds,
/// making brute force runs slow regardless of outcome.
pub async fn authenticate(
    state: &AppState,
    request: &LoginRequest,
    dry_run: bool,
) -> Result<Option<String>> {
    let mail = normalize_mail(&request.mail_address);
    tracing::info!("Login attempt for {}", mail);

    let user = repository::get_by_mail(&state.db, &mail).await?;

    if !dry_run {
        repository::update_login_timestamp(&state.db, &mail).await?;
    }

    let user = match user {
        Some(user) => user,
        None => {
            tracing::warn!("Login attempt for unknown account {}", mail);
            return Ok(None);
        }
    };

    if let Some(last_attempt) = user.last_login_attempt {
        let elapsed = (user.database_time - last_attempt).num_seconds();
        if elapsed < LOGIN_THROTTLE_SECONDS {
            tokio::time::sleep(Duration::from_secs(LOGIN_THROTTLE_SECONDS as u64)).await;
        }
    }

    if !user.active {
        tracing::warn!("Login attempt for deactivated account {}", mail);
        return Ok(None);
    }

    if !password::verify_passphrase(&state.config, &request.pass_phrase, &user.pass_phrase_hash)? {
        tracing::warn!("Wrong passphrase for account {}", mail);
        return Ok(None);
    }

    let first_name = fallback_name(&user.first_name, "Vorname unbekannt");
    let last_name = fallback_name(&user.last_name, "Nachname unbekannt");
    let role = Role::parse(&user.role).unwrap_or(Role::Inspector);

    let token = jwt::generate_token(&state.config, &mail, &first_name, &last_name, role)?;
    tracing::info!("Account {} has logged in", mail);

    Ok(Some(token))
}

/// Resolve the token bearer against the account table. Handlers that write
/// data need the database identity, not just the claims.
pub async fn get_authorized_inspector(
    state: &AppState,
    claims: &TokenClaims,
) -> Result<Option<StoredUser>> {
    let mail = normalize_mail(&claims.sub);
    if mail.is_empty() {
        return Ok(None);
    }
    let user = repository::get_by_mail(&state.db, &mail).await?;
    Ok(user.filter(|u| u.active))
}

/// List accounts, with the original name fallbacks for rows missing them.
pub async fn list_users(state: &AppState, mail_filter: Option<&str>) -> Result<Vec<UserAccount>> {
    let filter = mail_filter.map(normalize_mail);
    let filter = filter.as_deref().filter(|m| !m.is_empty());

    let mut accounts = repository::list(&state.db, filter).await?;
    for account in &mut accounts {
        account.first_name = fallback_name(&account.first_name, "unbekannt");
        account.last_name = fallback_name(&account.last_name, "unbekannt");
    }
    Ok(accounts)
}

/// Update an account, optionally replacing its passphrase. Returns the
/// updated account, or None when the update was rejected.
pub async fn update_user(
    state: &AppState,
    mut account: UserAccount,
    change_passphrase: bool,
) -> Result<Option<UserAccount>> {
    let new_passphrase = std::mem::take(&mut account.pass_phrase);
    account.mail_address = normalize_mail(&account.mail_address);

    if account.mail_address.is_empty() || !is_plausible_mail(&account.mail_address) {
        tracing::warn!("Rejected account update with bad mail address");
        return Ok(None);
    }

    let existing = repository::list(&state.db, Some(&account.mail_address)).await?;
    let existing = match existing.as_slice() {
        [one] => one.clone(),
        _ => {
            tracing::warn!(
                "Account {} cannot be updated, not exactly one match",
                account.mail_address
            );
            return Ok(None);
        }
    };

    if existing.role == Role::Administrator {
        let admins = repository::count_active_admins(&state.db).await?;
        if violates_last_admin_guard(true, admins, account.role, account.active) {
            tracing::warn!(
                "Rejected update that would leave no active administrator ({})",
                account.mail_address
            );
            return Ok(None);
        }
    }

    if change_passphrase && new_passphrase.trim().len() < MIN_PASSPHRASE_LENGTH {
        tracing::warn!("Rejected passphrase change below minimum length");
        return Ok(None);
    }

    let affected = repository::update_account(&state.db, &account).await?;
    if affected != 1 {
        return Ok(None);
    }

    if change_passphrase {
        let hash = password::hash_passphrase(&state.config, new_passphrase.trim())?;
        let affected =
            repository::update_passphrase(&state.db, &account.mail_address, &hash).await?;
        if affected != 1 {
            return Ok(None);
        }
    }

    Ok(Some(account))
}

/// Deactivate an account. Returns false when rejected or nothing matched.
pub async fn delete_user(state: &AppState, mail: &str) -> Result<bool> {
    let mail = normalize_mail(mail);
    if mail.is_empty() {
        return Ok(false);
    }

    let existing = repository::list(&state.db, Some(&mail)).await?;
    let existing = match existing.as_slice() {
        [one] => one.clone(),
        _ => {
            tracing::warn!("Account {} cannot be deleted, not exactly one match", mail);
            return Ok(false);
        }
    };

    if existing.role == Role::Administrator {
        let admins = repository::count_active_admins(&state.db).await?;
        if admins == 1 {
            tracing::warn!("Rejected deletion of the last active administrator");
            return Ok(false);
        }
    }

    let affected = repository::deactivate(&state.db, &mail).await?;
    Ok(affected == 1)
}

/// Consume a one-time registration UUID and set the account's password.
pub async fn complete_registration(
    state: &AppState,
    uuid: &str,
    passphrase: &str,
    dry_run: bool,
) -> Result<bool> {
    if dry_run {
        return Ok(true);
    }
    let hash = password::hash_passphrase(&state.config, passphrase)?;
    let affected =
        repository::set_passphrase_by_registration_uuid(&state.db, uuid, &hash).await?;
    if affected > 1 {
        tracing::error!("Registration UUID matched more than one account, check the data");
    }
    Ok(affected >= 1)
}

fn fallback_name(name: &str, fallback: &str) -> String {
    if name.trim().is_empty() {
        fallback.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_normalization_trims_and_lowercases() {
        assert_eq!(normalize_mail("  Maria.Muster@Stadt.CH "), "maria.muster@stadt.ch");
        assert_eq!(normalize_mail(""), "");
    }

    #[test]
    fn mail_plausibility() {
        assert!(is_plausible_mail("a@b.ch"));
        assert!(!is_plausible_mail("a.b.ch"));
        assert!(!is_plausible_mail("@b.ch"));
        assert!(!is_plausible_mail("a@.ch"));
        assert!(!is_plausible_mail("a@localhost"));
    }

    #[test]
    fn last_admin_guard_blocks_demotion_and_deactivation() {
        assert!(violates_last_admin_guard(true, 1, Role::Inspector, true));
        assert!(violates_last_admin_guard(true, 1, Role::Administrator, false));
        assert!(!violates_last_admin_guard(true, 1, Role::Administrator, true));
        assert!(!violates_last_admin_guard(true, 2, Role::Inspector, false));
        assert!(!violates_last_admin_guard(false, 1, Role::Inspector, false));
    }
}
