/// Profile endpoint
///
/// A session-gated read: any request without a logged-in session is a 401
/// before anything else is looked at.
///
/// # Endpoint
///
/// ```text
/// GET /profile
/// ```
///
/// Response:
/// ```json
/// { "username": "alice", "role": "student" }
/// ```

use crate::{app::AppState, cookie, error::{ApiError, ApiResult}};
use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

/// Profile response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub role: String,
}

/// Profile handler
///
/// # Errors
///
/// - `401 Unauthorized`: no logged-in session
/// - `503 Service Unavailable`: credential store unreachable
pub async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ProfileResponse>> {
    let session_id = cookie::session_id(&headers);
    let username = state.auth.check_session(session_id.as_deref())?;

    // The account backing a live session should always resolve; treat a
    // vanished record the same as a missing session
    let record = state
        .store
        .lookup(&username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))?;

    Ok(Json(ProfileResponse {
        username: record.username,
        role: record.role,
    }))
}
