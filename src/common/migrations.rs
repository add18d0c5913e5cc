// src/common/migrations.rs
//! Database schema bootstrap

use sqlx::PgPool;
use tracing::info;

/// Run all database migrations
///
/// Every statement is idempotent, so this runs on each startup.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Handling migrations...");

    create_user_tables(pool).await?;

    info!("✅ Database migration completed successfully!");
    Ok(())
}

async fn create_user_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    // google_id is the provider-assigned identity and never changes
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS google_users (
            google_id TEXT PRIMARY KEY,
            email TEXT NOT NULL DEFAULT '',
            verified_email BOOLEAN NOT NULL DEFAULT FALSE,
            name TEXT NOT NULL DEFAULT '',
            picture TEXT NOT NULL DEFAULT '',
            locale TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_google_users_email ON google_users(email)")
        .execute(pool)
        .await?;

    Ok(())
}
