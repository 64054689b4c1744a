/// Credential store contract
///
/// The auth core treats durable credential storage as an injected
/// capability: a mapping from username to stored credential record that
/// enforces username uniqueness. [`postgres`] provides the production
/// implementation; [`memory`] backs tests and ad-hoc runs.
///
/// # Contract
///
/// - `register` is atomic: either the record is durably created or nothing
///   changes, and two concurrent registrations of one username yield exactly
///   one success and one `AlreadyExists`.
/// - `lookup` returns the full record including the password hash; it never
///   leaves the auth core.
/// - `list` returns id/username/role summaries only; no hash crosses that
///   boundary.
/// - A backend failure that is not a uniqueness violation surfaces as
///   [`StoreError::Unavailable`], never as `AlreadyExists`.

use async_trait::async_trait;

use crate::models::user::{NewUser, UserRecord, UserSummary};

pub mod memory;
pub mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Error type for credential store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this username already exists
    #[error("user already exists")]
    AlreadyExists,

    /// The backing store failed for a reason other than uniqueness
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Durable username → credential record mapping
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates a new user record
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyExists`] if the username is taken
    /// - [`StoreError::Unavailable`] on any other backend failure
    async fn register(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Returns the record for `username`, if one exists
    async fn lookup(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Returns all users ordered by id, password hashes stripped
    async fn list(&self) -> Result<Vec<UserSummary>, StoreError>;
}
