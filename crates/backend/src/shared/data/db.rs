use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::time::Duration;

use crate::shared::config::Config;

/// Open the PostgreSQL connection pool described by the configuration and
/// make sure the schema exists.
pub async fn connect(config: &Config) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database.url.clone());
    options
        .max_connections(10)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let conn = Database::connect(options)
        .await
        .context("Failed to connect to database")?;

    conn.ping().await.context("Database ping failed")?;

    initialize_schema(&conn)
        .await
        .context("Failed to initialize database schema")?;

    tracing::info!("Database connection established");
    Ok(conn)
}

/// Minimal schema bootstrap: create missing tables on startup. Existing
/// installations are left untouched.
async fn initialize_schema(conn: &DatabaseConnection) -> Result<()> {
    for ddl in SCHEMA {
        conn.execute(Statement::from_string(
            DatabaseBackend::Postgres,
            ddl.to_string(),
        ))
        .await
        .with_context(|| format!("Failed to run schema statement: {}", first_line(ddl)))?;
    }
    Ok(())
}

fn first_line(ddl: &str) -> &str {
    ddl.trim().lines().next().unwrap_or_default()
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS inspectors (
        fid INT PRIMARY KEY,
        last_name TEXT,
        first_name TEXT,
        mail_address TEXT NOT NULL,
        pass_phrase TEXT NOT NULL DEFAULT '',
        role TEXT NOT NULL DEFAULT 'inspector',
        active BOOLEAN NOT NULL DEFAULT true,
        last_login_attempt TIMESTAMP,
        registration_uuid TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS playgrounds (
        fid INT PRIMARY KEY,
        nummer INT,
        name TEXT,
        address TEXT,
        geom_x DOUBLE PRECISION,
        geom_y DOUBLE PRECISION,
        next_visual_inspection DATE,
        next_operational_inspection DATE,
        next_main_inspection DATE
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS playdevice_types (
        id INT PRIMARY KEY,
        short_value TEXT,
        value TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS suppliers (
        fid INT PRIMARY KEY,
        name TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS playdevices (
        fid INT PRIMARY KEY,
        fid_playground INT REFERENCES playgrounds (fid),
        comment TEXT,
        geom_x DOUBLE PRECISION,
        geom_y DOUBLE PRECISION,
        id_device_type INT REFERENCES playdevice_types (id),
        standard TEXT,
        material TEXT,
        id_supplier INT REFERENCES suppliers (fid),
        cost_estimation REAL,
        recommended_year_renovation INT,
        comment_renovation TEXT,
        picture BYTEA,
        not_to_be_checked BOOLEAN DEFAULT false,
        not_checkable BOOLEAN DEFAULT false
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS playdevice_details (
        fid INT PRIMARY KEY,
        fid_playdevice INT REFERENCES playdevices (fid),
        description TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inspection_types (
        id INT PRIMARY KEY,
        short_value TEXT,
        value TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS renovation_types (
        id INT PRIMARY KEY,
        value TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS defect_priorities (
        id INT PRIMARY KEY,
        short_value TEXT,
        value TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS responsible_bodies (
        id INT PRIMARY KEY,
        name TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inspections (
        tid INT PRIMARY KEY,
        id_inspection_type INT REFERENCES inspection_types (id),
        fid_playground INT REFERENCES playgrounds (fid),
        inspection_date DATE NOT NULL,
        fid_inspector INT REFERENCES inspectors (fid),
        target_inspection_date DATE
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inspection_reports (
        tid INT PRIMARY KEY,
        tid_inspection INT REFERENCES inspections (tid),
        fid_playdevice INT REFERENCES playdevices (fid),
        fid_playdevice_detail INT REFERENCES playdevice_details (fid),
        inspection_type TEXT NOT NULL,
        inspection_date DATE NOT NULL,
        inspector TEXT,
        inspection_text TEXT,
        inspection_done BOOLEAN,
        inspection_comment TEXT,
        maintenance_text TEXT,
        maintenance_done BOOLEAN,
        maintenance_comment TEXT,
        fall_protection_type TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS defects (
        tid INT PRIMARY KEY,
        fid_playdevice INT REFERENCES playdevices (fid),
        fid_playdevice_detail INT REFERENCES playdevice_details (fid),
        tid_inspection_report INT REFERENCES inspection_reports (tid),
        date_created DATE,
        id_priority INT,
        description TEXT,
        comment TEXT,
        date_done DATE,
        fid_resolved_by INT REFERENCES inspectors (fid),
        id_responsible_body INT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS defect_pictures (
        tid INT PRIMARY KEY,
        tid_defect INT REFERENCES defects (tid),
        picture BYTEA,
        after_fixing BOOLEAN NOT NULL DEFAULT false
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inspection_criteria (
        fid_playdevice INT REFERENCES playdevices (fid),
        fid_playdevice_detail INT REFERENCES playdevice_details (fid),
        category TEXT NOT NULL,
        realm TEXT,
        check_text TEXT,
        check_short_text TEXT,
        maintenance_text TEXT,
        inspection_type TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inspection_assignments (
        fid_playground INT REFERENCES playgrounds (fid),
        fid_inspector INT REFERENCES inspectors (fid),
        id_inspection_type INT REFERENCES inspection_types (id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS acceptance_documents (
        fid_playdevice INT REFERENCES playdevices (fid),
        document BYTEA
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS certificate_documents (
        fid_playdevice INT REFERENCES playdevices (fid),
        document BYTEA
    );
    "#,
];
