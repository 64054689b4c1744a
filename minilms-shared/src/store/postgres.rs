/// PostgreSQL-backed credential store
///
/// Delegates to the row operations in [`crate::models::user`]. Registration
/// atomicity comes from the `UNIQUE` constraint on `users.username`: the
/// insert either commits or fails, and a constraint violation is translated
/// into [`StoreError::AlreadyExists`]. Any other database failure is
/// reported as [`StoreError::Unavailable`] so callers can tell a conflict
/// from an outage.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::user::{NewUser, UserRecord, UserSummary};
use crate::store::{CredentialStore, StoreError};

/// Credential store over a PostgreSQL pool
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Wraps an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn register(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        UserRecord::create(&self.pool, user)
            .await
            .map_err(map_register_error)
    }

    async fn lookup(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        UserRecord::find_by_username(&self.pool, username)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<UserSummary>, StoreError> {
        UserRecord::list(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

/// Maps an insert failure to the store taxonomy
///
/// Only a unique-constraint violation on the username becomes
/// `AlreadyExists`; everything else stays an availability error.
fn map_register_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::AlreadyExists;
        }
    }

    StoreError::Unavailable(err.to_string())
}
