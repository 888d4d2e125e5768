//! Bearer token authentication.
//!
//! [`token_auth`] puts the shared [`TokenService`] into request extensions;
//! the extractors below read the `Authorization: Bearer` header and verify
//! the token for the identity class they stand for.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::{Identity, IdentityClass, TokenService, TokenType};
use crate::web::error::ApiError;

async fn bearer_token<S>(parts: &mut Parts, state: &S) -> Result<String, ApiError>
where
    S: Send + Sync,
{
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::unauthorized("Missing authorization"))?;
    Ok(bearer.token().to_string())
}

fn token_service(parts: &Parts) -> Result<Arc<TokenService>, ApiError> {
    parts
        .extensions
        .get::<Arc<TokenService>>()
        .cloned()
        .ok_or_else(|| ApiError::internal("Token service not configured"))
}

/// Verify the bearer access token, optionally for a specific class.
async fn authenticate<S>(
    parts: &mut Parts,
    state: &S,
    class: Option<IdentityClass>,
) -> Result<Identity, ApiError>
where
    S: Send + Sync,
{
    let token = bearer_token(parts, state).await?;
    let tokens = token_service(parts)?;

    let result = match class {
        Some(class) => tokens.verify(&token, TokenType::Access, class),
        None => tokens.verify_any(&token, TokenType::Access),
    };

    result.map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        ApiError::from(e)
    })
}

/// Authenticated student.
#[derive(Debug, Clone, Copy)]
pub struct StudentAuth {
    /// Student ID.
    pub user_id: i64,
    /// Student's jins (gender) ID.
    pub jins_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for StudentAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state, Some(IdentityClass::Student)).await? {
            Identity::Student { user_id, jins_id } => Ok(Self { user_id, jins_id }),
            _ => Err(ApiError::forbidden("Student access required")),
        }
    }
}

/// Authenticated renter.
#[derive(Debug, Clone, Copy)]
pub struct RenterAuth {
    /// Renter ID.
    pub renter_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for RenterAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state, Some(IdentityClass::Renter)).await? {
            Identity::Renter { renter_id } => Ok(Self { renter_id }),
            _ => Err(ApiError::forbidden("Renter access required")),
        }
    }
}

/// Authenticated staff member.
#[derive(Debug, Clone, Copy)]
pub struct StaffAuth {
    /// Staff ID.
    pub stuff_id: i64,
    /// Staff role ID.
    pub role_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for StaffAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state, Some(IdentityClass::Staff)).await? {
            Identity::Staff { stuff_id, role_id } => Ok(Self { stuff_id, role_id }),
            _ => Err(ApiError::forbidden("Staff access required")),
        }
    }
}

/// Any authenticated identity.
#[derive(Debug, Clone, Copy)]
pub struct AnyAuth(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AnyAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, None).await.map(AnyAuth)
    }
}

/// Middleware function to inject the token service into request extensions.
pub async fn token_auth(
    tokens: Arc<TokenService>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(tokens);
    next.run(request).await
}
