//! Student mobile app handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::db::{
    ImageRepository, NewImage, NewRate, RateRepository, RentDetails, RentRepository,
    ReviewDetails, WishlistRepository,
};
use crate::storage::content_type;
use crate::web::dto::{
    ApiResponse, FormData, ImageQuery, ImageUploadedResponse, RentFilterQuery, RentRequest,
    ReviewQuery, ReviewRequest, ReviewResponse, SuccessResponse, ValidatedJson, WishlistRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AnyAuth, StudentAuth};
use crate::IjaraError;

/// Window for the home screen feed.
const NEWS_DAYS: u32 = 3;

/// GET /mobile/student/rent - All listings.
#[utoipa::path(
    get,
    path = "/mobile/student/rent",
    tag = "mobile",
    responses(
        (status = 200, description = "Listings with category and jins", body = Vec<RentDetails>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a student")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_rents(
    State(state): State<Arc<AppState>>,
    _auth: StudentAuth,
) -> Result<Json<ApiResponse<Vec<RentDetails>>>, ApiError> {
    let rents = RentRepository::new(state.db.pool()).list_details().await?;
    Ok(Json(ApiResponse::new(rents)))
}

/// GET /mobile/student/rent/filter - Filtered listings.
#[utoipa::path(
    get,
    path = "/mobile/student/rent/filter",
    tag = "mobile",
    params(RentFilterQuery),
    responses(
        (status = 200, description = "Matching listings", body = Vec<RentDetails>),
        (status = 400, description = "Bad parameters"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn filter_rents(
    State(state): State<Arc<AppState>>,
    _auth: StudentAuth,
    Query(query): Query<RentFilterQuery>,
) -> Result<Json<ApiResponse<Vec<RentDetails>>>, ApiError> {
    let filter = query.into_filter().map_err(ApiError::bad_request)?;
    let rents = RentRepository::new(state.db.pool()).filter(&filter).await?;
    Ok(Json(ApiResponse::new(rents)))
}

/// POST /mobile/student/add-rent - Submit a listing for a renter.
///
/// Identical payloads create separate listings.
#[utoipa::path(
    post,
    path = "/mobile/student/add-rent",
    tag = "mobile",
    request_body = RentRequest,
    responses(
        (status = 200, description = "Listing created", body = SuccessResponse),
        (status = 400, description = "Missing renter_id or unknown reference"),
        (status = 422, description = "Validation failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_rent(
    State(state): State<Arc<AppState>>,
    auth: StudentAuth,
    ValidatedJson(req): ValidatedJson<RentRequest>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let renter_id = req
        .renter_id
        .ok_or_else(|| ApiError::bad_request("renter_id is required"))?;

    let id = RentRepository::new(state.db.pool())
        .create(&req.into_new_rent(renter_id))
        .await?;

    tracing::info!(rent_id = id, user_id = auth.user_id, "Listing added by student");

    Ok(Json(ApiResponse::new(SuccessResponse::created(id))))
}

/// GET /mobile/student/home/filters-news - Recent listings for the student's jins.
#[utoipa::path(
    get,
    path = "/mobile/student/home/filters-news",
    tag = "mobile",
    responses(
        (status = 200, description = "Listings from the last three days", body = Vec<RentDetails>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn filters_news(
    State(state): State<Arc<AppState>>,
    auth: StudentAuth,
) -> Result<Json<ApiResponse<Vec<RentDetails>>>, ApiError> {
    let rents = RentRepository::new(state.db.pool())
        .recent_for_jins(auth.jins_id, NEWS_DAYS)
        .await?;
    Ok(Json(ApiResponse::new(rents)))
}

/// Store an uploaded listing photo and record it.
pub(crate) async fn store_rent_image(
    state: &AppState,
    rent_id: i64,
    form: &mut FormData,
) -> Result<ImageUploadedResponse, ApiError> {
    let file = form
        .take_file()
        .ok_or_else(|| ApiError::bad_request("No image provided"))?;

    let stored = state.storage.save(&file.content, &file.filename).await?;

    let image = ImageRepository::new(state.db.pool())
        .create(&NewImage {
            rent_id: Some(rent_id),
            url: stored.url.clone(),
            hashcode: stored.hashcode,
        })
        .await;

    match image {
        Ok(image) => Ok(ImageUploadedResponse {
            success: true,
            hashcode: image.hashcode,
        }),
        Err(e) => {
            if let Err(del) = state.storage.delete(&stored.url).await {
                tracing::warn!("Failed to remove orphaned image {}: {}", stored.url, del);
            }
            Err(e.into())
        }
    }
}

/// POST /mobile/student/add-image-rent - Attach a photo to a listing.
///
/// Multipart fields: rent_id, image (file).
#[utoipa::path(
    post,
    path = "/mobile/student/add-image-rent",
    tag = "mobile",
    responses(
        (status = 200, description = "Image stored", body = ImageUploadedResponse),
        (status = 400, description = "Unknown rent or bad image")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_image_rent(
    State(state): State<Arc<AppState>>,
    _auth: StudentAuth,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImageUploadedResponse>>, ApiError> {
    let mut form = FormData::read(multipart, "image").await?;
    let rent_id: i64 = form.parse("rent_id")?;

    if !RentRepository::new(state.db.pool()).exists(rent_id).await? {
        return Err(ApiError::bad_request("Unknown rent"));
    }

    let uploaded = store_rent_image(&state, rent_id, &mut form).await?;
    Ok(Json(ApiResponse::new(uploaded)))
}

/// GET /mobile/student/image - Image bytes by hashcode.
///
/// Any authenticated identity may fetch images.
#[utoipa::path(
    get,
    path = "/mobile/student/image",
    tag = "mobile",
    params(ImageQuery),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Image not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    _auth: AnyAuth,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ApiError> {
    let image = ImageRepository::new(state.db.pool())
        .get_by_hashcode(&query.hashcode)
        .await?
        .ok_or_else(|| ApiError::bad_request("Image not found"))?;

    let content = match state.storage.load(&image.url).await {
        Ok(content) => content,
        Err(IjaraError::NotFound(_)) => {
            tracing::warn!("Image {} has no stored file", image.hashcode);
            return Err(ApiError::bad_request("Image not found"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(([(header::CONTENT_TYPE, content_type(&image.url))], content).into_response())
}

/// POST /mobile/student/add-review - Rate a listing.
#[utoipa::path(
    post,
    path = "/mobile/student/add-review",
    tag = "mobile",
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Unknown rent"),
        (status = 422, description = "Rate outside 1..=5")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_review(
    State(state): State<Arc<AppState>>,
    auth: StudentAuth,
    ValidatedJson(req): ValidatedJson<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewResponse>>, ApiError> {
    let rate = RateRepository::new(state.db.pool())
        .create(&NewRate {
            user_id: auth.user_id,
            rent_id: req.rent_id,
            rate: req.rate,
            comment: req.comment,
        })
        .await?;

    Ok(Json(ApiResponse::new(ReviewResponse { review_data: rate })))
}

/// GET /mobile/student/get_rents/get-review - Reviews of a listing.
#[utoipa::path(
    get,
    path = "/mobile/student/get_rents/get-review",
    tag = "mobile",
    params(ReviewQuery),
    responses(
        (status = 200, description = "Reviews with student names", body = Vec<ReviewDetails>),
        (status = 400, description = "Missing rent_id")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_reviews(
    State(state): State<Arc<AppState>>,
    _auth: StudentAuth,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewDetails>>>, ApiError> {
    let reviews = RateRepository::new(state.db.pool())
        .list_for_rent(query.rent_id)
        .await?;
    Ok(Json(ApiResponse::new(reviews)))
}

/// GET /mobile/student/wishlist - The student's saved listings.
#[utoipa::path(
    get,
    path = "/mobile/student/wishlist",
    tag = "mobile",
    responses(
        (status = 200, description = "Saved listings", body = Vec<RentDetails>)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_wishlist(
    State(state): State<Arc<AppState>>,
    auth: StudentAuth,
) -> Result<Json<ApiResponse<Vec<RentDetails>>>, ApiError> {
    let rents = RentRepository::new(state.db.pool())
        .list_wishlisted(auth.user_id)
        .await?;
    Ok(Json(ApiResponse::new(rents)))
}

/// POST /mobile/student/wishlist - Save a listing.
#[utoipa::path(
    post,
    path = "/mobile/student/wishlist",
    tag = "mobile",
    request_body = WishlistRequest,
    responses(
        (status = 200, description = "Saved", body = SuccessResponse),
        (status = 404, description = "Unknown rent"),
        (status = 409, description = "Already saved")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_wishlist(
    State(state): State<Arc<AppState>>,
    auth: StudentAuth,
    ValidatedJson(req): ValidatedJson<WishlistRequest>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    if !RentRepository::new(state.db.pool())
        .exists(req.rent_id)
        .await?
    {
        return Err(ApiError::not_found("Rent not found"));
    }

    WishlistRepository::new(state.db.pool())
        .add(auth.user_id, req.rent_id)
        .await?;

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// DELETE /mobile/student/wishlist/{rent_id} - Forget a saved listing.
#[utoipa::path(
    delete,
    path = "/mobile/student/wishlist/{rent_id}",
    tag = "mobile",
    params(
        ("rent_id" = i64, Path, description = "Rent ID")
    ),
    responses(
        (status = 200, description = "Removed", body = SuccessResponse),
        (status = 404, description = "Not in the wishlist")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_wishlist(
    State(state): State<Arc<AppState>>,
    auth: StudentAuth,
    Path(rent_id): Path<i64>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let removed = WishlistRepository::new(state.db.pool())
        .remove(auth.user_id, rent_id)
        .await?;

    if !removed {
        return Err(ApiError::not_found("Rent is not in the wishlist"));
    }

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}
