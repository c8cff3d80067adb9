//! Authentication Handlers
//!
//! - **`me`** - Current user (GET /api/me)
//! - **`config`** - Public client settings (GET /api/config)
//! - **`dev_token`** - Development sign-in (POST /api/auth/dev-token)
//! - **`types`** - Request/response bodies

pub mod config;
pub mod dev_token;
pub mod me;
pub mod types;

pub use config::public_config;
pub use dev_token::dev_token;
pub use me::get_me;
