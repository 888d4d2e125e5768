//! HTTP API for ijara.
//!
//! Routes are grouped by audience: `/auth` for onboarding and tokens,
//! `/mobile/student` for the student app, `/renter` and `/staff`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use openapi::ApiDoc;
pub use router::create_router;
pub use server::WebServer;
