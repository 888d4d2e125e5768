//! Reference data lookups used by the registration and listing forms.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::db::{Category, District, Faculty, Jins, ReferenceRepository, Region, University};
use crate::web::dto::{ApiResponse, DistrictQuery, FacultyQuery};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /auth/get_university/ - List universities.
#[utoipa::path(
    get,
    path = "/auth/get_university/",
    tag = "reference",
    responses(
        (status = 200, description = "Universities", body = Vec<University>)
    )
)]
pub async fn get_university(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<University>>>, ApiError> {
    let universities = ReferenceRepository::new(state.db.pool())
        .universities()
        .await?;
    Ok(Json(ApiResponse::new(universities)))
}

/// GET /auth/get_faculty/ - List faculties of a university.
#[utoipa::path(
    get,
    path = "/auth/get_faculty/",
    tag = "reference",
    params(FacultyQuery),
    responses(
        (status = 200, description = "Faculties", body = Vec<Faculty>),
        (status = 400, description = "Missing university_id")
    )
)]
pub async fn get_faculty(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FacultyQuery>,
) -> Result<Json<ApiResponse<Vec<Faculty>>>, ApiError> {
    let faculties = ReferenceRepository::new(state.db.pool())
        .faculties(query.university_id)
        .await?;
    Ok(Json(ApiResponse::new(faculties)))
}

/// GET /auth/get_region/ - List regions.
#[utoipa::path(
    get,
    path = "/auth/get_region/",
    tag = "reference",
    responses(
        (status = 200, description = "Regions", body = Vec<Region>)
    )
)]
pub async fn get_region(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Region>>>, ApiError> {
    let regions = ReferenceRepository::new(state.db.pool()).regions().await?;
    Ok(Json(ApiResponse::new(regions)))
}

/// GET /auth/get_district/ - List districts of a region.
#[utoipa::path(
    get,
    path = "/auth/get_district/",
    tag = "reference",
    params(DistrictQuery),
    responses(
        (status = 200, description = "Districts", body = Vec<District>),
        (status = 400, description = "Missing region_id")
    )
)]
pub async fn get_district(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DistrictQuery>,
) -> Result<Json<ApiResponse<Vec<District>>>, ApiError> {
    let districts = ReferenceRepository::new(state.db.pool())
        .districts(query.region_id)
        .await?;
    Ok(Json(ApiResponse::new(districts)))
}

/// GET /auth/get_category/ - List listing categories.
#[utoipa::path(
    get,
    path = "/auth/get_category/",
    tag = "reference",
    responses(
        (status = 200, description = "Categories", body = Vec<Category>)
    )
)]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = ReferenceRepository::new(state.db.pool()).categories().await?;
    Ok(Json(ApiResponse::new(categories)))
}

/// GET /auth/get_jins/ - List jins (gender) values.
#[utoipa::path(
    get,
    path = "/auth/get_jins/",
    tag = "reference",
    responses(
        (status = 200, description = "Jins values", body = Vec<Jins>)
    )
)]
pub async fn get_jins(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Jins>>>, ApiError> {
    let jins = ReferenceRepository::new(state.db.pool()).jins().await?;
    Ok(Json(ApiResponse::new(jins)))
}
