//! Request extraction with validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// Malformed JSON is a 400; field rule violations are a 422 with
/// per-field details.
///
/// ```ignore
/// async fn add_review(
///     StudentAuth { user_id, .. }: StudentAuth,
///     ValidatedJson(req): ValidatedJson<ReviewRequest>,
/// ) -> Result<Json<ApiResponse<ReviewResponse>>, ApiError> {
///     // req.rate is within 1..=5 here
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Normalize a phone number: strip spaces, dashes and parentheses.
///
/// The result must be an optional leading '+' followed by 7 to 15 digits.
pub fn normalize_phone(raw: &str) -> Result<String, ApiError> {
    let phone: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    if digits.len() < 7 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::bad_request("Invalid phone number"));
    }
    Ok(phone)
}
