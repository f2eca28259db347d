use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use contracts::system::auth::Role;
use contracts::system::users::UserAccount;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

/// Inspector row as stored in the database, including the password hash.
/// Never leaves the service layer.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub fid: i32,
    pub mail_address: String,
    pub pass_phrase_hash: String,
    pub last_name: String,
    pub first_name: String,
    pub role: String,
    pub active: bool,
    pub last_login_attempt: Option<NaiveDateTime>,
    /// Clock of the database server, read together with the row so the
    /// login throttle does not depend on the application clock.
    pub database_time: NaiveDateTime,
}

/// Look up an inspector by mail address (trimmed, lowercased in SQL).
pub async fn get_by_mail(conn: &DatabaseConnection, mail: &str) -> Result<Option<StoredUser>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT fid, last_name, first_name, mail_address, pass_phrase, role, active, \
             last_login_attempt, CURRENT_TIMESTAMP(0)::TIMESTAMP AS database_time \
             FROM inspectors WHERE trim(lower(mail_address)) = $1",
            [mail.into()],
        ))
        .await
        .context("Failed to query inspector by mail address")?;

    match result {
        Some(row) => {
            let user = StoredUser {
                fid: row.try_get("", "fid")?,
                mail_address: row.try_get("", "mail_address")?,
                pass_phrase_hash: row.try_get("", "pass_phrase")?,
                last_name: row.try_get("", "last_name")?,
                first_name: row.try_get("", "first_name")?,
                role: row.try_get("", "role")?,
                active: row.try_get("", "active")?,
                last_login_attempt: row.try_get("", "last_login_attempt")?,
                database_time: row.try_get("", "database_time")?,
            };
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Stamp the last login attempt with the database clock.
pub async fn update_login_timestamp(conn: &DatabaseConnection, mail: &str) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        "UPDATE inspectors SET last_login_attempt = CURRENT_TIMESTAMP \
         WHERE trim(lower(mail_address)) = $1",
        [mail.into()],
    ))
    .await
    .context("Failed to update login timestamp")?;

    Ok(())
}

/// List accounts, optionally filtered to one mail address. Password hashes
/// are not selected.
pub async fn list(
    conn: &DatabaseConnection,
    mail_filter: Option<&str>,
) -> Result<Vec<UserAccount>> {
    let statement = match mail_filter {
        Some(mail) => Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT fid, last_name, first_name, trim(lower(mail_address)) AS mail_address, \
             active, role FROM inspectors \
             WHERE trim(lower(mail_address)) = $1 ORDER BY first_name, last_name",
            [mail.into()],
        ),
        None => Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT fid, last_name, first_name, trim(lower(mail_address)) AS mail_address, \
             active, role FROM inspectors ORDER BY first_name, last_name"
                .to_string(),
        ),
    };

    let rows = conn
        .query_all(statement)
        .await
        .context("Failed to list inspectors")?;

    let mut accounts = Vec::new();
    for row in rows {
        let mail_address: String = row.try_get("", "mail_address")?;
        if mail_address.is_empty() {
            continue;
        }
        let role_text: String = row.try_get("", "role")?;
        let account = UserAccount {
            fid: row.try_get("", "fid")?,
            mail_address,
            pass_phrase: String::new(),
            last_name: row.try_get("", "last_name")?,
            first_name: row.try_get("", "first_name")?,
            role: Role::parse(&role_text).unwrap_or(Role::Inspector),
            active: row.try_get("", "active")?,
            last_login_attempt: None,
        };
        accounts.push(account);
    }

    Ok(accounts)
}

/// Number of active administrator accounts.
pub async fn count_active_admins(conn: &DatabaseConnection) -> Result<i64> {
    let result = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT count(*) AS admin_count FROM inspectors \
             WHERE active = true AND role = 'administrator'"
                .to_string(),
        ))
        .await
        .context("Failed to count active administrators")?;

    match result {
        Some(row) => Ok(row.try_get("", "admin_count")?),
        None => Ok(0),
    }
}

/// Update name, role and active flag of an account. Returns affected rows.
pub async fn update_account(conn: &DatabaseConnection, account: &UserAccount) -> Result<u64> {
    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE inspectors SET last_name = $1, first_name = $2, role = $3, active = $4 \
             WHERE trim(lower(mail_address)) = $5",
            [
                account.last_name.clone().into(),
                account.first_name.clone().into(),
                account.role.as_str().into(),
                account.active.into(),
                account.mail_address.clone().into(),
            ],
        ))
        .await
        .context("Failed to update inspector account")?;

    Ok(result.rows_affected())
}

/// Replace the stored password hash of an account. Returns affected rows.
pub async fn update_passphrase(
    conn: &DatabaseConnection,
    mail: &str,
    pass_phrase_hash: &str,
) -> Result<u64> {
    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE inspectors SET pass_phrase = $1 WHERE trim(lower(mail_address)) = $2",
            [pass_phrase_hash.into(), mail.into()],
        ))
        .await
        .context("Failed to update passphrase")?;

    Ok(result.rows_affected())
}

/// Accounts are never hard-deleted, only switched inactive.
pub async fn deactivate(conn: &DatabaseConnection, mail: &str) -> Result<u64> {
    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE inspectors SET active = false WHERE trim(lower(mail_address)) = $1",
            [mail.into()],
        ))
        .await
        .context("Failed to deactivate inspector")?;

    Ok(result.rows_affected())
}

/// Set the password of the account holding the given one-time registration
/// UUID and consume the UUID. Returns affected rows.
pub async fn set_passphrase_by_registration_uuid(
    conn: &DatabaseConnection,
    uuid: &str,
    pass_phrase_hash: &str,
) -> Result<u64> {
    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE inspectors SET pass_phrase = $1, registration_uuid = NULL \
             WHERE registration_uuid = $2",
            [pass_phrase_hash.into(), uuid.into()],
        ))
        .await
        .context("Failed to set passphrase by registration uuid")?;

    Ok(result.rows_affected())
}
