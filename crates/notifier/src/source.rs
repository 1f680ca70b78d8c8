//! Recipient source: where the list of users to broadcast to comes from.

use async_trait::async_trait;
use sqlx::PgPool;

use broadcast_common::error::RepositoryError;
use broadcast_common::types::User;

/// Read-only access to the current set of registered users.
#[async_trait]
pub trait RecipientSource: Send + Sync {
    /// List every registered user. Fails as a whole; there is no partial listing.
    async fn list_recipients(&self) -> Result<Vec<User>, RepositoryError>;
}

/// Recipient source backed by the PostgreSQL `users` table.
#[derive(Clone)]
pub struct PgRecipientSource {
    pool: PgPool,
}

impl PgRecipientSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientSource for PgRecipientSource {
    async fn list_recipients(&self) -> Result<Vec<User>, RepositoryError> {
        let users: Vec<User> = sqlx::query_as(
            r#"
            SELECT id, email, phone_number, date_of_birth, password_hash, created_at
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = users.len(), "Loaded recipients");
        Ok(users)
    }
}
