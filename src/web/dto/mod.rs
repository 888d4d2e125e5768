//! Data Transfer Objects for the HTTP API.

mod form;
pub mod request;
pub mod response;
mod validation;

pub use form::{FormData, UploadedFile};
pub use request::*;
pub use response::*;
pub use validation::{normalize_phone, ValidatedJson};
