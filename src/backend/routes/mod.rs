//! Routes Module
//!
//! HTTP route configuration.
//!
//! - **`router`** - Assembles every route group, static files and tracing
//! - **`api_routes`** - `/api` endpoints
//! - **`actuator_routes`** - `/actuator` endpoints

pub mod actuator_routes;
pub mod api_routes;
pub mod router;

pub use router::create_router;
