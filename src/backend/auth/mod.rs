//! Authentication Module
//!
//! Bearer token verification and the user accounts behind it. There are no
//! passwords: users sign in with an OAuth provider (or, in development, a
//! token signed with a shared secret) and are created on first sight of
//! their token subject.
//!
//! # Architecture
//!
//! - **`verifier`** - Token verification against a JWKS or a shared secret
//! - **`users`** - User model and database operations
//! - **`handlers`** - HTTP handlers for account endpoints
//!
//! # Authentication Flow
//!
//! 1. The browser obtains an ID token from the provider (or `/api/auth/dev-token`)
//! 2. Each API request carries it as `Authorization: Bearer <token>`
//! 3. The middleware verifies it and upserts the user by subject
//! 4. Handlers read the caller through `AuthUser`

/// HTTP handlers for authentication endpoints
pub mod handlers;

/// User data model and database operations
pub mod users;

/// Bearer token verification
pub mod verifier;

pub use handlers::{dev_token, get_me, public_config};
pub use users::{NewUser, User};
pub use verifier::{AuthError, Claims, TokenVerifier};
