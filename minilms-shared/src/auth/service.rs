/// Authentication use-case orchestration
///
/// `AuthService` wires the credential store, the session manager, the
/// login-attempt tracker, and the audit sink into the four user-facing
/// operations: register, login, logout, and session checks. Every
/// collaborator is injected at construction; the service owns no global
/// state of its own.
///
/// # Ordering
///
/// The steps inside each operation are security-relevant and fixed:
///
/// - `register`: CSRF is validated before anything else, so an
///   unauthenticated caller cannot use the endpoint as a field-validation
///   oracle. Then field presence, then hashing, then the store write.
/// - `login`: field presence, then CSRF, then the lockout check (a locked
///   username never reaches credential lookup, so lockout cannot leak
///   whether a password was correct), then lookup, then verification.
///   Unknown-username and wrong-password failures produce the identical
///   error.
///
/// Password hashing and verification are deliberately slow and run on the
/// blocking thread pool via `tokio::task::spawn_blocking`; no lock is held
/// across either.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::audit::{format_line, AuditEvent, AuditSink};
use crate::auth::lockout::LoginAttemptTracker;
use crate::auth::password::{self, HashingParams, PasswordError};
use crate::auth::session::SessionManager;
use crate::models::user::NewUser;
use crate::store::{CredentialStore, StoreError};

/// A single failed validation check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error type for authentication operations
///
/// Every variant maps to a stable, non-leaking response; in particular
/// [`AuthError::InvalidCredentials`] covers both unknown usernames and wrong
/// passwords and must stay indistinguishable between the two.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Required fields missing or empty
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// Registration conflict: the username is taken
    #[error("user already exists")]
    AlreadyExists,

    /// Unknown username or wrong password, intentionally indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing or wrong CSRF token
    #[error("CSRF token missing or invalid")]
    CsrfMismatch,

    /// Temporary lockout after too many failures
    #[error("Too many failed attempts, retry in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// No authenticated session for an identity-requiring operation
    #[error("Not logged in")]
    Unauthorized,

    /// The credential store failed for a reason other than a conflict
    #[error(transparent)]
    Store(StoreError),

    /// Password hashing or verification failed internally
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// A background task died
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Flattens `validator` output into the error taxonomy
    fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        AuthError::Validation(details)
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => AuthError::AlreadyExists,
            other => AuthError::Store(other),
        }
    }
}

/// Registration request payload
///
/// Fields are optional at the schema level so a missing field reaches the
/// service as `None` and is rejected by validation at the contract-mandated
/// point, not by the deserializer.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(required(message = "username is required"), length(min = 1, message = "username is required"))]
    pub username: Option<String>,

    #[validate(required(message = "password is required"), length(min = 1, message = "password is required"))]
    pub password: Option<String>,

    #[validate(required(message = "role is required"), length(min = 1, message = "role is required"))]
    pub role: Option<String>,

    /// CSRF token echoed back from the issue endpoint; checked separately
    /// from field validation
    pub csrf_token: Option<String>,
}

impl RegisterPayload {
    /// Validates presence and unwraps the required fields
    fn into_fields(self) -> Result<(String, String, String), AuthError> {
        self.validate().map_err(AuthError::from_validation)?;
        match (self.username, self.password, self.role) {
            (Some(u), Some(p), Some(r)) => Ok((u, p, r)),
            _ => Err(AuthError::Internal(
                "payload passed validation with missing fields".to_string(),
            )),
        }
    }
}

/// Login request payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(required(message = "username is required"), length(min = 1, message = "username is required"))]
    pub username: Option<String>,

    #[validate(required(message = "password is required"), length(min = 1, message = "password is required"))]
    pub password: Option<String>,

    /// CSRF token echoed back from the issue endpoint
    pub csrf_token: Option<String>,
}

impl LoginPayload {
    fn into_fields(self) -> Result<(String, String), AuthError> {
        self.validate().map_err(AuthError::from_validation)?;
        match (self.username, self.password) {
            (Some(u), Some(p)) => Ok((u, p)),
            _ => Err(AuthError::Internal(
                "payload passed validation with missing fields".to_string(),
            )),
        }
    }
}

/// Orchestrates registration, login, logout, and session checks
///
/// Cloning is cheap; all clones share the injected collaborators.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    sessions: SessionManager,
    attempts: LoginAttemptTracker,
    audit: Arc<dyn AuditSink>,
    hashing: HashingParams,
}

impl AuthService {
    /// Creates a service over the injected collaborators
    pub fn new(
        store: Arc<dyn CredentialStore>,
        sessions: SessionManager,
        attempts: LoginAttemptTracker,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            sessions,
            attempts,
            audit,
            hashing: HashingParams::default(),
        }
    }

    /// Overrides the Argon2 work factor (tests use cheap parameters)
    pub fn with_hashing_params(mut self, hashing: HashingParams) -> Self {
        self.hashing = hashing;
        self
    }

    /// Registers a new account
    ///
    /// CSRF is checked first, then field presence, then the password is
    /// hashed off the async executor, then the store write happens. On
    /// conflict nothing is written and no audit event is emitted.
    ///
    /// # Errors
    ///
    /// - [`AuthError::CsrfMismatch`] without a valid session + token pair
    /// - [`AuthError::Validation`] when username/password/role are missing
    /// - [`AuthError::AlreadyExists`] when the username is taken
    /// - [`AuthError::Store`] when the store is unreachable
    pub async fn register(
        &self,
        payload: RegisterPayload,
        session_id: Option<&str>,
    ) -> Result<(), AuthError> {
        if !self.csrf_ok(session_id, payload.csrf_token.as_deref()) {
            self.emit(AuditEvent::CsrfFailure);
            return Err(AuthError::CsrfMismatch);
        }

        let (username, password, role) = payload.into_fields()?;

        let params = self.hashing;
        let password_hash =
            tokio::task::spawn_blocking(move || password::hash_password_with(&password, params))
                .await
                .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))??;

        self.store
            .register(NewUser {
                username: username.clone(),
                password_hash,
                role,
            })
            .await?;

        tracing::info!(username = %username, "Registered new user");
        self.emit(AuditEvent::RegisterSuccess { username });
        Ok(())
    }

    /// Authenticates a user and binds the session to their identity
    ///
    /// Returns the username on success.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] when username/password are missing
    /// - [`AuthError::CsrfMismatch`] without a valid session + token pair
    /// - [`AuthError::RateLimited`] while the username is locked out; no
    ///   credential lookup happens in that case
    /// - [`AuthError::InvalidCredentials`] for unknown usernames and wrong
    ///   passwords alike
    pub async fn login(
        &self,
        payload: LoginPayload,
        session_id: Option<&str>,
    ) -> Result<String, AuthError> {
        let csrf_token = payload.csrf_token.clone();
        let (username, password) = payload.into_fields()?;

        if !self.csrf_ok(session_id, csrf_token.as_deref()) {
            self.emit(AuditEvent::CsrfFailure);
            return Err(AuthError::CsrfMismatch);
        }

        let now = Utc::now();
        if let Some(remaining) = self.attempts.remaining_lockout(&username, now) {
            self.emit(AuditEvent::LoginBlocked {
                username: username.clone(),
            });
            return Err(AuthError::RateLimited {
                retry_after_secs: remaining.num_seconds().max(1) as u64,
            });
        }

        let record = match self.store.lookup(&username).await? {
            Some(record) => record,
            None => return Err(self.login_failure(username, now)),
        };

        let stored_hash = record.password_hash.clone();
        let valid =
            tokio::task::spawn_blocking(move || password::verify_password(&password, &stored_hash))
                .await
                .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))??;

        if !valid {
            return Err(self.login_failure(username, now));
        }

        self.attempts.record_success(&username);
        if let Some(sid) = session_id {
            self.sessions.bind_identity(sid, &username);
        }

        tracing::info!(username = %username, "Login succeeded");
        self.emit(AuditEvent::LoginSuccess {
            username: username.clone(),
        });
        Ok(username)
    }

    /// Destroys the session, returning the username that was logged out
    ///
    /// Idempotent: a missing or unauthenticated session simply returns
    /// `None` and emits nothing.
    pub fn logout(&self, session_id: Option<&str>) -> Option<String> {
        let username = session_id.and_then(|sid| self.sessions.current_identity(sid));
        if let Some(sid) = session_id {
            self.sessions.destroy(sid);
        }
        if let Some(ref username) = username {
            tracing::info!(username = %username, "Logged out");
            self.emit(AuditEvent::Logout {
                username: username.clone(),
            });
        }
        username
    }

    /// Returns the logged-in username for a session
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] when there is no session or it carries no
    /// identity
    pub fn check_session(&self, session_id: Option<&str>) -> Result<String, AuthError> {
        session_id
            .and_then(|sid| self.sessions.current_identity(sid))
            .ok_or(AuthError::Unauthorized)
    }

    /// Returns the session's CSRF token, creating the session if needed
    ///
    /// # Returns
    ///
    /// Tuple of (session_id, csrf_token); the id is new when no live
    /// session was supplied
    pub fn issue_csrf(&self, session_id: Option<&str>) -> (String, String) {
        self.sessions.issue_csrf(session_id)
    }

    fn csrf_ok(&self, session_id: Option<&str>, submitted: Option<&str>) -> bool {
        match (session_id, submitted) {
            (Some(sid), Some(token)) => self.sessions.validate_csrf(sid, token),
            _ => false,
        }
    }

    /// Records a failed credential check and produces the generic error
    ///
    /// Shared by the unknown-username and wrong-password paths so both
    /// count identically and return the identical response.
    fn login_failure(&self, username: String, now: chrono::DateTime<Utc>) -> AuthError {
        self.attempts.record_failure(&username, now);
        tracing::info!(username = %username, "Login failed");
        self.emit(AuditEvent::LoginFailed { username });
        AuthError::InvalidCredentials
    }

    fn emit(&self, event: AuditEvent) {
        self.audit.append(&format_line(Utc::now(), &event));
    }
}
