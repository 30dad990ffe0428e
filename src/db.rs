//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Notification channel fired by the phishing_attempts trigger
pub const CHANGE_CHANNEL: &str = "phishing_attempts_changed";

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create tables if not exist
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Phishing attempt reports
CREATE TABLE IF NOT EXISTS phishing_attempts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    category VARCHAR(100),
    details JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_attempts_category ON phishing_attempts(category);
CREATE INDEX IF NOT EXISTS idx_attempts_created ON phishing_attempts(created_at);

-- Change notifications feeding the watcher subscription
CREATE OR REPLACE FUNCTION notify_phishing_attempts() RETURNS trigger AS $$
BEGIN
    PERFORM pg_notify('phishing_attempts_changed', TG_OP);
    RETURN NULL;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS phishing_attempts_notify ON phishing_attempts;
CREATE TRIGGER phishing_attempts_notify
    AFTER INSERT OR UPDATE OR DELETE ON phishing_attempts
    FOR EACH STATEMENT EXECUTE FUNCTION notify_phishing_attempts();
"#;
