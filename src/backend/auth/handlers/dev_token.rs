/**
 * Development Sign-In Handler
 *
 * `POST /api/auth/dev-token` signs a token with the shared secret so the
 * app can be used without an OAuth client. The route answers 404 unless
 * `auth.dev_login` is enabled.
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::{DevTokenRequest, DevTokenResponse};
use crate::backend::auth::verifier::{AuthError, DEV_TOKEN_TTL_SECS};
use crate::backend::error::BackendError;
use crate::backend::middleware::ApiJson;
use crate::backend::server::state::AppState;
use crate::shared::SharedError;

/// Issue a development token
///
/// # Errors
///
/// * `400 Bad Request` - Blank or malformed email
/// * `403 Forbidden` - No shared secret is configured
/// * `404 Not Found` - Development login is disabled
pub async fn dev_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DevTokenRequest>,
) -> Result<Json<DevTokenResponse>, BackendError> {
    if !state.config.auth.dev_login {
        return Err(BackendError::handler(StatusCode::NOT_FOUND, "Not found"));
    }

    let email = request.email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(SharedError::validation("email", "Invalid email address").into());
    };
    if local.is_empty() || domain.is_empty() {
        return Err(SharedError::validation("email", "Invalid email address").into());
    }

    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| local.to_string());
    let subject = format!("dev:{}", email);

    let token = state
        .verifier
        .issue_dev_token(&subject, Some(email.clone()), Some(name))
        .map_err(|e| match e {
            AuthError::DevTokensDisabled => {
                BackendError::handler(StatusCode::FORBIDDEN, "Development tokens are disabled")
            }
            other => other.into(),
        })?;

    tracing::info!("Issued development token for {}", email);

    Ok(Json(DevTokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: DEV_TOKEN_TTL_SECS,
    }))
}
