/// In-memory credential store
///
/// A mutex-guarded map used by the test suites and by environments without a
/// database. The uniqueness check and the insert happen under a single lock
/// guard, so concurrent registration of the same username yields exactly one
/// success, matching the observable contract of the Postgres implementation.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::user::{NewUser, UserRecord, UserSummary};
use crate::store::{CredentialStore, StoreError};

/// Credential store backed by a process-local map
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, UserRecord>,
    next_id: i64,
}

impl MemoryCredentialStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn register(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.lock().expect("user map lock poisoned");

        if inner.users.contains_key(&user.username) {
            return Err(StoreError::AlreadyExists);
        }

        inner.next_id += 1;
        let record = UserRecord {
            id: inner.next_id,
            username: user.username.clone(),
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        inner.users.insert(user.username, record.clone());

        Ok(record)
    }

    async fn lookup(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.lock().expect("user map lock poisoned");
        Ok(inner.users.get(username).cloned())
    }

    async fn list(&self) -> Result<Vec<UserSummary>, StoreError> {
        let inner = self.inner.lock().expect("user map lock poisoned");
        let mut users: Vec<UserSummary> = inner
            .users
            .values()
            .map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
                role: u.role.clone(),
            })
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}
