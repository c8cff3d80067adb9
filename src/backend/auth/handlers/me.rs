/**
 * Get Current User Handler
 *
 * `GET /api/me` returns the profile stored for the bearer token's subject.
 * The auth middleware has already verified the token and refreshed the
 * profile from its claims.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::UserView;

/// Get current user handler
///
/// # Errors
///
/// * `401 Unauthorized` - Missing or invalid token (from the middleware)
/// * `404 Not Found` - The user row vanished after authentication
///
/// # Example Response
///
/// ```json
/// {
///   "id": "123e4567-e89b-12d3-a456-426614174000",
///   "email": "user@example.com",
///   "name": "Ada",
///   "picture_url": null
/// }
/// ```
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<UserView>, BackendError> {
    let user = get_user_by_id(&state.db, user.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("user"))?;

    Ok(Json(user.into()))
}
