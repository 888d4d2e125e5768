//! Response DTOs for the HTTP API.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{Rate, Renter, Staff, Student};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Response data.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Create a new paginated response.
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
            },
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
}

// ============================================================================
// Auth
// ============================================================================

/// Pending phone verification.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationStartedResponse {
    /// ID to pass to the SMS step and to registration.
    pub verification_id: Uuid,
    /// Seconds until the code expires.
    pub expires_in: u64,
}

/// Confirmed phone verification.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifiedResponse {
    pub verification_id: Uuid,
    pub verified: bool,
}

/// Newly registered account.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredResponse {
    pub id: i64,
}

/// Summary of the authenticated identity.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// "student", "renter" or "staff".
    pub class: String,
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jins_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<Student> for MeResponse {
    fn from(s: Student) -> Self {
        Self {
            class: "student".to_string(),
            id: s.id,
            firstname: s.firstname,
            lastname: s.lastname,
            phone: s.phone,
            jins_id: Some(s.jins_id),
            role_id: None,
            email: None,
            image: s.image,
        }
    }
}

impl From<Renter> for MeResponse {
    fn from(r: Renter) -> Self {
        Self {
            class: "renter".to_string(),
            id: r.id,
            firstname: r.firstname,
            lastname: r.lastname,
            phone: r.phone,
            jins_id: None,
            role_id: None,
            email: None,
            image: r.image,
        }
    }
}

impl From<Staff> for MeResponse {
    fn from(s: Staff) -> Self {
        Self {
            class: "staff".to_string(),
            id: s.id,
            firstname: s.firstname,
            lastname: s.lastname,
            phone: s.phone,
            jins_id: None,
            role_id: Some(s.role_id),
            email: Some(s.email),
            image: None,
        }
    }
}

// ============================================================================
// Listings
// ============================================================================

/// Result of a create or toggle action.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            id: None,
        }
    }

    pub fn created(id: i64) -> Self {
        Self {
            success: true,
            id: Some(id),
        }
    }
}

/// Stored image reference.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImageUploadedResponse {
    pub success: bool,
    /// Key for `GET /mobile/student/image`.
    pub hashcode: String,
}

/// Stored review.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub review_data: Rate,
}
