//! Middleware Module
//!
//! HTTP middleware that runs before the API handlers.
//!
//! - **`auth`** - Bearer token verification for the protected API routes
//! - **`extract`** - `Json` and `Path` extractors that reject with JSON errors

pub mod auth;
pub mod extract;

pub use auth::{auth_middleware, bearer_token, AuthUser, AuthenticatedUser};
pub use extract::{ApiJson, ApiPath};
