/**
 * Authentication Handler Types
 *
 * Request and response bodies of the development sign-in endpoint.
 */

use serde::{Deserialize, Serialize};

/// Development sign-in request
///
/// The token subject is derived from the email, so signing in twice with
/// the same address reaches the same account.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DevTokenRequest {
    pub email: String,
    /// Display name; defaults to the part of the email before `@`
    #[serde(default)]
    pub name: Option<String>,
}

/// Signed development token
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DevTokenResponse {
    /// HS256 bearer token for the `Authorization` header
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}
