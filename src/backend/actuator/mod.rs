//! Actuator Module
//!
//! Health and build information under `/actuator`.

pub mod handlers;

pub use handlers::{health, info};
