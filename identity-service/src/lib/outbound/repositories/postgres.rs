use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::credential::errors::CredentialStoreError;
use crate::domain::credential::models::Identity;
use crate::domain::credential::models::StoredCredential;
use crate::domain::credential::models::Username;
use crate::domain::credential::ports::CredentialStore;

/// Credential store backed by the `credentials` table.
///
/// Uniqueness is enforced by the primary key on `username`.
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Identity>, CredentialStoreError> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            r#"
            SELECT username, password_hash, created_at
            FROM credentials
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CredentialStoreError::Backend(e.to_string()))?;

        match row {
            Some((username, password_hash, created_at)) => Ok(Some(Identity {
                username: Username::new(username)
                    .map_err(|e| CredentialStoreError::Backend(e.to_string()))?,
                credential: StoredCredential::new(password_hash),
                created_at,
            })),
            None => Ok(None),
        }
    }

    async fn insert(&self, identity: Identity) -> Result<(), CredentialStoreError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (username, password_hash, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(identity.username.as_str())
        .bind(identity.credential.expose())
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return CredentialStoreError::DuplicateUsername(
                        identity.username.to_string(),
                    );
                }
            }
            CredentialStoreError::Backend(e.to_string())
        })?;

        Ok(())
    }
}
