//! Renter handlers. The owner of every listing touched here is the caller.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::{RentDetails, RentRepository, RentUpdate};
use crate::web::dto::{
    ApiResponse, FormData, ImageUploadedResponse, RentRequest, RentUpdateRequest,
    SuccessResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::mobile::store_rent_image;
use crate::web::handlers::AppState;
use crate::web::middleware::RenterAuth;

/// GET /renter/rent - Listings owned by the caller.
#[utoipa::path(
    get,
    path = "/renter/rent",
    tag = "renter",
    responses(
        (status = 200, description = "Own listings", body = Vec<RentDetails>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a renter")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_own_rents(
    State(state): State<Arc<AppState>>,
    auth: RenterAuth,
) -> Result<Json<ApiResponse<Vec<RentDetails>>>, ApiError> {
    let rents = RentRepository::new(state.db.pool())
        .list_by_renter(auth.renter_id)
        .await?;
    Ok(Json(ApiResponse::new(rents)))
}

/// POST /renter/rent - Create a listing.
#[utoipa::path(
    post,
    path = "/renter/rent",
    tag = "renter",
    request_body = RentRequest,
    responses(
        (status = 200, description = "Listing created", body = SuccessResponse),
        (status = 400, description = "Unknown reference"),
        (status = 422, description = "Validation failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_rent(
    State(state): State<Arc<AppState>>,
    auth: RenterAuth,
    ValidatedJson(req): ValidatedJson<RentRequest>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let id = RentRepository::new(state.db.pool())
        .create(&req.into_new_rent(auth.renter_id))
        .await?;

    tracing::info!(rent_id = id, renter_id = auth.renter_id, "Listing created");

    Ok(Json(ApiResponse::new(SuccessResponse::created(id))))
}

/// PUT /renter/rent/{id} - Update an own listing.
#[utoipa::path(
    put,
    path = "/renter/rent/{id}",
    tag = "renter",
    params(
        ("id" = i64, Path, description = "Rent ID")
    ),
    request_body = RentUpdateRequest,
    responses(
        (status = 200, description = "Updated listing with joined data", body = RentDetails),
        (status = 404, description = "No such listing owned by the caller")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_rent(
    State(state): State<Arc<AppState>>,
    auth: RenterAuth,
    Path(rent_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RentUpdateRequest>,
) -> Result<Json<ApiResponse<RentDetails>>, ApiError> {
    let update = RentUpdate::from(req);
    let repo = RentRepository::new(state.db.pool());

    repo.update_owned(rent_id, auth.renter_id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Rent not found"))?;

    let rent = repo
        .get_details(rent_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Rent not found"))?;

    tracing::info!(rent_id, renter_id = auth.renter_id, "Listing updated");

    Ok(Json(ApiResponse::new(rent)))
}

/// POST /renter/rent/{id}/image - Attach a photo to an own listing.
///
/// Multipart field: image (file).
#[utoipa::path(
    post,
    path = "/renter/rent/{id}/image",
    tag = "renter",
    params(
        ("id" = i64, Path, description = "Rent ID")
    ),
    responses(
        (status = 200, description = "Image stored", body = ImageUploadedResponse),
        (status = 400, description = "Bad image"),
        (status = 404, description = "No such listing owned by the caller")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_rent_image(
    State(state): State<Arc<AppState>>,
    auth: RenterAuth,
    Path(rent_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImageUploadedResponse>>, ApiError> {
    let owned = RentRepository::new(state.db.pool())
        .get_by_id(rent_id)
        .await?
        .is_some_and(|rent| rent.renter_id == auth.renter_id);
    if !owned {
        return Err(ApiError::not_found("Rent not found"));
    }

    let mut form = FormData::read(multipart, "image").await?;
    let uploaded = store_rent_image(&state, rent_id, &mut form).await?;
    Ok(Json(ApiResponse::new(uploaded)))
}
