/// User listing endpoint
///
/// Returns every registered user as `{id, username, role}` ordered by id.
/// Password hashes never cross the store boundary for listings.
///
/// # Endpoint
///
/// ```text
/// GET /users
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use minilms_shared::models::user::UserSummary;

/// User listing handler
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = state.store.list().await?;
    Ok(Json(users))
}
