/// Common test utilities for integration tests
///
/// Builds the full router over in-memory capabilities (credential store,
/// sessions, lockout tracker, audit sink), so the HTTP surface can be
/// exercised end-to-end without a database. Argon2 runs with cheap test
/// parameters to keep the suite fast.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use minilms_api::app::{build_router, AppState};
use minilms_api::config::Config;
use minilms_shared::auth::audit::MemoryAuditSink;
use minilms_shared::auth::lockout::{LockoutPolicy, LoginAttemptTracker};
use minilms_shared::auth::password::HashingParams;
use minilms_shared::auth::service::AuthService;
use minilms_shared::auth::session::SessionManager;
use minilms_shared::store::MemoryCredentialStore;
use serde_json::Value;
use tower::Service as _;

/// Test context containing the app and its in-memory collaborators
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryCredentialStore>,
    pub audit: Arc<MemoryAuditSink>,
}

/// A decoded response: status, Set-Cookie value (if any), JSON body
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub retry_after: Option<String>,
    pub body: Value,
}

impl TestContext {
    /// Creates a context with the default lockout policy
    pub fn new() -> Self {
        Self::with_policy(LockoutPolicy::default())
    }

    /// Creates a context with a custom lockout policy
    pub fn with_policy(policy: LockoutPolicy) -> Self {
        let store = Arc::new(MemoryCredentialStore::new());
        let audit = Arc::new(MemoryAuditSink::new());

        let auth = AuthService::new(
            store.clone(),
            SessionManager::new(),
            LoginAttemptTracker::new(policy),
            audit.clone(),
        )
        .with_hashing_params(HashingParams::fast_insecure());

        let state = AppState::new(auth, store.clone(), Config::default());
        let app = build_router(state);

        TestContext { app, store, audit }
    }

    /// Sends a request and decodes the response
    ///
    /// `cookie` is the raw session id; the helper turns it into the session
    /// cookie header.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        session_id: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(sid) = session_id {
            builder = builder.header(header::COOKIE, format!("minilms_session={}", sid));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            set_cookie,
            retry_after,
            body,
        }
    }

    /// Fetches a fresh session + CSRF token pair via `GET /register`
    ///
    /// # Returns
    ///
    /// Tuple of (session_id, csrf_token)
    pub async fn issue_csrf(&self) -> (String, String) {
        let response = self.request("GET", "/register", None, None).await;
        assert_eq!(response.status, StatusCode::OK);

        let set_cookie = response.set_cookie.expect("csrf issue must set the cookie");
        let session_id = parse_session_cookie(&set_cookie);
        let csrf_token = response.body["csrf_token"]
            .as_str()
            .expect("csrf_token in body")
            .to_string();

        (session_id, csrf_token)
    }

    /// Registers a user through the API, asserting success
    pub async fn register_user(&self, session_id: &str, csrf: &str, username: &str, password: &str) {
        let response = self
            .request(
                "POST",
                "/register",
                Some(session_id),
                Some(serde_json::json!({
                    "username": username,
                    "password": password,
                    "role": "student",
                    "csrf_token": csrf,
                })),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "registration failed: {}",
            response.body
        );
    }
}

/// Extracts the session id out of a `Set-Cookie` header value
pub fn parse_session_cookie(set_cookie: &str) -> String {
    let pair = set_cookie.split(';').next().expect("cookie pair");
    let (name, value) = pair.split_once('=').expect("name=value");
    assert_eq!(name, "minilms_session");
    value.to_string()
}
