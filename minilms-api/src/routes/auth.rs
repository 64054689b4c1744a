/// Authentication endpoints
///
/// # Endpoints
///
/// - `GET /register`, `GET /login` - Issue a CSRF token (and a session
///   cookie, if the caller has none yet)
/// - `POST /register` - Create an account
/// - `POST /login` - Verify credentials and bind the session
/// - `POST /logout` - Destroy the session
///
/// The handlers are thin: they parse the session cookie, hand the typed
/// payload to `AuthService`, and map the outcome. All ordering rules and
/// security checks live in the core.

use crate::{app::AppState, cookie, error::ApiResult};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use minilms_shared::auth::service::{LoginPayload, RegisterPayload};
use serde::{Deserialize, Serialize};

/// Simple message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// CSRF issue response
#[derive(Debug, Serialize, Deserialize)]
pub struct CsrfResponse {
    pub csrf_token: String,
}

/// CSRF issue handler
///
/// Serves `GET /register` and `GET /login`: returns the CSRF token bound to
/// the caller's session, creating the session first when the cookie is
/// missing or stale. Re-issuing for a live session returns the same token.
///
/// # Endpoint
///
/// ```text
/// GET /register
/// GET /login
/// ```
///
/// Response:
/// ```json
/// { "csrf_token": "4f1c..." }
/// ```
pub async fn csrf_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let session_id = cookie::session_id(&headers);
    let (session_id, csrf_token) = state.auth.issue_csrf(session_id.as_deref());

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie::set_session_cookie(&session_id))]),
        Json(CsrfResponse { csrf_token }),
    ))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "s3cret",
///   "role": "student",
///   "csrf_token": "4f1c..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields or username taken
/// - `403 Forbidden`: CSRF token missing or wrong
/// - `503 Service Unavailable`: credential store unreachable
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterPayload>,
) -> ApiResult<impl IntoResponse> {
    let session_id = cookie::session_id(&headers);
    state.auth.register(payload, session_id.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "user registered successfully".to_string(),
        }),
    ))
}

/// Login endpoint
///
/// On success the caller's session is bound to the username; subsequent
/// requests with the same cookie are authenticated.
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "s3cret",
///   "csrf_token": "4f1c..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing fields
/// - `401 Unauthorized`: invalid credentials (unknown username and wrong
///   password are indistinguishable)
/// - `403 Forbidden`: CSRF token missing or wrong
/// - `429 Too Many Requests`: username locked out; `Retry-After` carries the
///   remaining window in seconds
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginPayload>,
) -> ApiResult<Json<MessageResponse>> {
    let session_id = cookie::session_id(&headers);
    state.auth.login(payload, session_id.as_deref()).await?;

    Ok(Json(MessageResponse {
        message: "Login successful".to_string(),
    }))
}

/// Logout endpoint
///
/// Destroys the session and clears the cookie. Idempotent: logging out
/// without a session is still a 200.
///
/// # Endpoint
///
/// ```text
/// POST /logout
/// ```
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let session_id = cookie::session_id(&headers);
    state.auth.logout(session_id.as_deref());

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie::clear_session_cookie())]),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}
