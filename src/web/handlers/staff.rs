//! Staff moderation listings.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::db::{Renter, RenterRepository, Student, StudentRepository};
use crate::web::dto::{PaginatedResponse, PaginationQuery};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::StaffAuth;

/// GET /staff/renters - Paginated renters.
#[utoipa::path(
    get,
    path = "/staff/renters",
    tag = "staff",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Renters page", body = Vec<Renter>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not staff")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_renters(
    State(state): State<Arc<AppState>>,
    _auth: StaffAuth,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<Renter>>, ApiError> {
    let repo = RenterRepository::new(state.db.pool());
    let limit = pagination.limit();

    let renters = repo
        .list(i64::from(limit), pagination.offset())
        .await?;
    let total = repo.count().await?;

    Ok(Json(PaginatedResponse::new(
        renters,
        pagination.page.max(1),
        limit,
        total.max(0) as u64,
    )))
}

/// GET /staff/students - Paginated students.
#[utoipa::path(
    get,
    path = "/staff/students",
    tag = "staff",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Students page", body = Vec<Student>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not staff")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    _auth: StaffAuth,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<Student>>, ApiError> {
    let repo = StudentRepository::new(state.db.pool());
    let limit = pagination.limit();

    let students = repo
        .list(i64::from(limit), pagination.offset())
        .await?;
    let total = repo.count().await?;

    Ok(Json(PaginatedResponse::new(
        students,
        pagination.page.max(1),
        limit,
        total.max(0) as u64,
    )))
}
