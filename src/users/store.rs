//! Credential store: persistence for federated users

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use super::models::FederatedUser;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user {0} already exists")]
    Conflict(String),

    #[error("user {0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence operations consumed by the login flow.
///
/// A missing user is `Ok(None)` from `find_by_provider_id`, never an error.
/// Concurrent first logins for the same provider id may both reach `create`;
/// the loser gets `StoreError::Conflict`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_provider_id(&self, id: &str) -> Result<Option<FederatedUser>, StoreError>;
    async fn create(&self, user: &FederatedUser) -> Result<(), StoreError>;
    async fn update(&self, user: &FederatedUser) -> Result<(), StoreError>;
}

/// A unique violation on insert means another login created the row first.
pub(crate) fn insert_error(e: sqlx::Error, google_id: &str) -> StoreError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(google_id.to_string())
        }
        other => StoreError::Database(other),
    }
}

/// Postgres-backed store over the `google_users` table
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_provider_id(&self, id: &str) -> Result<Option<FederatedUser>, StoreError> {
        let user = sqlx::query_as::<_, FederatedUser>(
            r#"
            SELECT google_id, email, verified_email, name, picture, locale
            FROM google_users
            WHERE google_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: &FederatedUser) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO google_users (google_id, email, verified_email, name, picture, locale)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&user.google_id)
        .bind(&user.email)
        .bind(user.verified_email)
        .bind(&user.name)
        .bind(&user.picture)
        .bind(&user.locale)
        .execute(&self.pool)
        .await;

        result.map_err(|e| insert_error(e, &user.google_id))?;

        debug!(google_id = %user.google_id, "Inserted google user");
        Ok(())
    }

    async fn update(&self, user: &FederatedUser) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE google_users
            SET email = $2,
                verified_email = $3,
                name = $4,
                picture = $5,
                locale = $6,
                updated_at = NOW()
            WHERE google_id = $1
            "#,
        )
        .bind(&user.google_id)
        .bind(&user.email)
        .bind(user.verified_email)
        .bind(&user.name)
        .bind(&user.picture)
        .bind(&user.locale)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(user.google_id.clone()));
        }

        debug!(google_id = %user.google_id, "Updated google user");
        Ok(())
    }
}
