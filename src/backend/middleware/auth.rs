/**
 * Authentication Middleware
 *
 * This module protects the API routes. It reads the bearer token from the
 * Authorization header, verifies it with the configured `TokenVerifier` and
 * makes sure the caller has a row in `users` before handing the request on.
 *
 * Handlers receive the caller through the `AuthUser` extractor.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::users::{upsert_user, NewUser};
use crate::backend::auth::verifier::AuthError;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Caller identity attached to request extensions
#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    /// Token subject at the identity provider
    pub subject: String,
    pub email: Option<String>,
}

/// Authentication middleware
///
/// 1. Extracts the token from `Authorization: Bearer <token>`
/// 2. Verifies signature, expiry, issuer and audience
/// 3. Creates or refreshes the user row for the token subject
/// 4. Attaches `AuthenticatedUser` to the request extensions
///
/// Missing or invalid tokens get 401; an unreachable key set gets 503.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let token = bearer_token(request.headers())?;

    let claims = app_state.verifier.verify(token).await.map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        e
    })?;

    let user = upsert_user(&app_state.db, &NewUser::from(&claims)).await?;
    tracing::debug!("Authenticated {} as user {}", claims.sub, user.id);

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        subject: user.subject,
        email: user.email,
    });

    Ok(next.run(request).await)
}

/// Extract the token part of a bearer Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Axum extractor for the authenticated caller
///
/// Only valid on routes behind `auth_middleware`; elsewhere it rejects with
/// 401.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::Auth(AuthError::MissingToken)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request as HttpRequest, StatusCode};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers("bearer  abc")).unwrap(), "abc");
    }

    #[test]
    fn test_bearer_token_rejects_bad_headers() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingToken)));
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(bearer_token(&headers("Bearer")), Err(AuthError::MalformedHeader)));
        assert!(matches!(bearer_token(&headers("Bearer   ")), Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_extractor_reads_extensions() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            subject: "sub-1".to_string(),
            email: None,
        };
        let mut request = HttpRequest::builder().uri("/").body(()).unwrap();
        request.extensions_mut().insert(user.clone());
        let (mut parts, _) = request.into_parts();

        let AuthUser(extracted) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_extractor_without_middleware_is_unauthorized() {
        let (mut parts, _) = HttpRequest::builder().uri("/").body(()).unwrap().into_parts();
        let rejection = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(rejection.status_code(), StatusCode::UNAUTHORIZED);
    }
}
