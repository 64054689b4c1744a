//! # Mini-LMS API Server
//!
//! HTTP server for the Mini-LMS authentication service:
//! registration, login with lockout protection, CSRF-bound sessions, and a
//! session-gated profile view.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/minilms cargo run -p minilms-api
//! ```

use std::sync::Arc;

use minilms_api::app::{build_router, AppState};
use minilms_api::config::Config;
use minilms_shared::auth::audit::FileAuditSink;
use minilms_shared::auth::lockout::{LockoutPolicy, LoginAttemptTracker};
use minilms_shared::auth::service::AuthService;
use minilms_shared::auth::session::SessionManager;
use minilms_shared::db::{migrations, pool};
use minilms_shared::store::PgCredentialStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minilms_api=info,minilms_shared=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Mini-LMS API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    // Database pool + schema
    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    migrations::run_migrations(&db).await?;

    // Wire the auth core: every collaborator is a capability handed to the
    // service, nothing global
    let store = Arc::new(PgCredentialStore::new(db));
    let audit = Arc::new(FileAuditSink::open(&config.auth.audit_log_path)?);
    let attempts = LoginAttemptTracker::new(LockoutPolicy {
        max_attempts: config.auth.max_attempts,
        block_duration: chrono::Duration::seconds(config.auth.block_seconds as i64),
    });
    let auth = AuthService::new(store.clone(), SessionManager::new(), attempts, audit);

    let bind_address = config.bind_address();
    let state = AppState::new(auth, store, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, exiting...");
        })
        .await?;

    Ok(())
}
