//! Middleware for the HTTP API.

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{token_auth, AnyAuth, RenterAuth, StaffAuth, StudentAuth};
pub use cors::create_cors_layer;
pub use rate_limit::{login_rate_limit, RateLimitState};
