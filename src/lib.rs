//! ijara - student housing marketplace backend.
//!
//! Students and renters sign up with a verified phone number, renters
//! publish listings, students browse, filter, review and save them.
//! Everything is served over a JSON REST API with bearer tokens.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod storage;
pub mod web;

pub use auth::{hash_password, verify_password, Identity, TokenService};
pub use config::Config;
pub use db::Database;
pub use error::{IjaraError, Result};
pub use storage::ImageStorage;
