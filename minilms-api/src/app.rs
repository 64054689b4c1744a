/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use minilms_api::{app::AppState, config::Config};
/// use minilms_shared::auth::audit::MemoryAuditSink;
/// use minilms_shared::auth::lockout::LoginAttemptTracker;
/// use minilms_shared::auth::service::AuthService;
/// use minilms_shared::auth::session::SessionManager;
/// use minilms_shared::store::MemoryCredentialStore;
///
/// let store = Arc::new(MemoryCredentialStore::new());
/// let auth = AuthService::new(
///     store.clone(),
///     SessionManager::new(),
///     LoginAttemptTracker::default(),
///     Arc::new(MemoryAuditSink::new()),
/// );
/// let state = AppState::new(auth, store, Config::default());
/// let app = minilms_api::app::build_router(state);
/// ```

use crate::middleware::security::SecurityHeadersLayer;
use axum::{
    routing::{get, post},
    Router,
};
use minilms_shared::auth::service::AuthService;
use minilms_shared::store::CredentialStore;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every field
/// is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Authentication orchestrator (owns sessions, lockout, audit)
    pub auth: AuthService,

    /// Credential store, used directly only by the listing and profile reads
    pub store: Arc<dyn CredentialStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(auth: AuthService, store: Arc<dyn CredentialStore>, config: Config) -> Self {
        Self {
            auth,
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health        # Health check
/// ├── GET  /register      # CSRF issue (+ session cookie)
/// ├── POST /register      # Create account
/// ├── GET  /login         # CSRF issue (+ session cookie)
/// ├── POST /login         # Verify credentials, bind session
/// ├── POST /logout        # Destroy session
/// ├── GET  /profile       # Session-gated profile view
/// └── GET  /users         # User listing (no password hashes)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (permissive in development, locked down in production)
/// 3. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let cors = if state.config.api.production {
        // Same-origin deployment: no cross-origin access
        CorsLayer::new()
    } else {
        CorsLayer::permissive()
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/register",
            get(routes::auth::csrf_issue).post(routes::auth::register),
        )
        .route(
            "/login",
            get(routes::auth::csrf_issue).post(routes::auth::login),
        )
        .route("/logout", post(routes::auth::logout))
        .route("/profile", get(routes::profile::profile))
        .route("/users", get(routes::users::list_users))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
