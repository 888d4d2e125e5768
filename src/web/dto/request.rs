//! Request DTOs for the HTTP API.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::db::{NewRent, RentFilter, RentUpdate, StudentUpdate};

// ============================================================================
// Auth
// ============================================================================

/// Phone verification start request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PhoneRequest {
    /// Phone number in international format, e.g. "+998901234567".
    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: String,
}

/// SMS code confirmation request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SmsCodeRequest {
    /// ID returned by the phone step.
    pub verification_id: Uuid,
    /// Code received by SMS.
    #[validate(length(min = 1, max = 16, message = "Code must be 1-16 characters"))]
    pub code: String,
}

/// Student or renter login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Phone number.
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    /// Password.
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Staff login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StaffLoginRequest {
    /// Email address.
    #[validate(length(min = 3, max = 254))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Token refresh request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    /// Refresh token.
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Student profile update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct SetProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub firstname: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub lastname: Option<String>,
    pub university_id: Option<i64>,
    pub faculty_id: Option<i64>,
    /// Course year.
    #[validate(range(min = 1, max = 7, message = "Grade must be between 1 and 7"))]
    pub grade: Option<i64>,
    pub district_id: Option<i64>,
    /// Hide the student from roommate search.
    pub invisible: Option<bool>,
}

impl SetProfileRequest {
    pub fn into_update(self) -> StudentUpdate {
        StudentUpdate {
            firstname: self.firstname,
            lastname: self.lastname,
            university_id: self.university_id,
            faculty_id: self.faculty_id,
            grade: self.grade,
            district_id: self.district_id,
            invisible: self.invisible,
        }
    }
}

// ============================================================================
// Listings
// ============================================================================

/// Listing fields.
///
/// `renter_id` is required when a student submits a listing on a renter's
/// behalf and ignored on the renter endpoints, where the owner comes from
/// the token.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RentRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category_id: i64,
    #[serde(default)]
    pub contract: bool,
    #[serde(default)]
    pub broker: bool,
    #[validate(range(min = 1, max = 50))]
    pub room_count: i64,
    #[validate(range(min = 0.0))]
    pub total_price: f64,
    pub student_jins_id: i64,
    #[validate(range(min = 1, max = 50))]
    pub student_count: i64,
    pub renter_id: Option<i64>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    #[serde(default)]
    pub wifi: bool,
    #[serde(default)]
    pub conditioner: bool,
    #[serde(default)]
    pub washing_machine: bool,
    #[serde(default)]
    pub tv: bool,
    #[serde(default)]
    pub refrigerator: bool,
    #[serde(default)]
    pub furniture: bool,
    #[validate(length(max = 1000))]
    pub other_convenience: Option<String>,
}

impl RentRequest {
    /// Build the insert payload owned by `renter_id`.
    pub fn into_new_rent(self, renter_id: i64) -> NewRent {
        NewRent {
            name: self.name,
            description: self.description,
            category_id: self.category_id,
            contract: self.contract,
            broker: self.broker,
            room_count: self.room_count,
            total_price: self.total_price,
            student_jins_id: self.student_jins_id,
            student_count: self.student_count,
            renter_id,
            location: self.location,
            longitude: self.longitude,
            latitude: self.latitude,
            wifi: self.wifi,
            conditioner: self.conditioner,
            washing_machine: self.washing_machine,
            tv: self.tv,
            refrigerator: self.refrigerator,
            furniture: self.furniture,
            other_convenience: self.other_convenience,
        }
    }
}

/// Partial listing update.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RentUpdateRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub contract: Option<bool>,
    pub broker: Option<bool>,
    #[validate(range(min = 1, max = 50))]
    pub room_count: Option<i64>,
    #[validate(range(min = 0.0))]
    pub total_price: Option<f64>,
    pub student_jins_id: Option<i64>,
    #[validate(range(min = 1, max = 50))]
    pub student_count: Option<i64>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub wifi: Option<bool>,
    pub conditioner: Option<bool>,
    pub washing_machine: Option<bool>,
    pub tv: Option<bool>,
    pub refrigerator: Option<bool>,
    pub furniture: Option<bool>,
    #[validate(length(max = 1000))]
    pub other_convenience: Option<String>,
}

impl From<RentUpdateRequest> for RentUpdate {
    fn from(req: RentUpdateRequest) -> Self {
        RentUpdate {
            name: req.name,
            description: req.description,
            category_id: req.category_id,
            contract: req.contract,
            broker: req.broker,
            room_count: req.room_count,
            total_price: req.total_price,
            student_jins_id: req.student_jins_id,
            student_count: req.student_count,
            location: req.location,
            longitude: req.longitude,
            latitude: req.latitude,
            wifi: req.wifi,
            conditioner: req.conditioner,
            washing_machine: req.washing_machine,
            tv: req.tv,
            refrigerator: req.refrigerator,
            furniture: req.furniture,
            other_convenience: req.other_convenience,
        }
    }
}

/// Review submission.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    pub rent_id: i64,
    /// Star rating.
    #[validate(range(min = 1, max = 5, message = "Rate must be between 1 and 5"))]
    pub rate: i64,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Wishlist addition.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct WishlistRequest {
    pub rent_id: i64,
}

// ============================================================================
// Query parameters
// ============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FacultyQuery {
    pub university_id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DistrictQuery {
    pub region_id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageQuery {
    pub hashcode: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewQuery {
    pub rent_id: i64,
}

/// Listing filter. Every parameter is optional.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RentFilterQuery {
    pub category_id: Option<i64>,
    pub student_jins_id: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub room_count: Option<i64>,
    pub contract: Option<bool>,
    pub broker: Option<bool>,
}

impl RentFilterQuery {
    /// Check the price range and convert into a repository filter.
    pub fn into_filter(self) -> Result<RentFilter, &'static str> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err("min_price must not exceed max_price");
            }
        }
        if self.min_price.is_some_and(|p| p < 0.0) || self.max_price.is_some_and(|p| p < 0.0) {
            return Err("Prices must not be negative");
        }

        Ok(RentFilter {
            category_id: self.category_id,
            student_jins_id: self.student_jins_id,
            min_price: self.min_price,
            max_price: self.max_price,
            room_count: self.room_count,
            contract: self.contract,
            broker: self.broker,
        })
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationQuery {
    /// Maximum items per page.
    pub const MAX_PER_PAGE: u32 = 100;

    /// Items per page, clamped to 1..=MAX_PER_PAGE.
    pub fn limit(&self) -> u32 {
        self.per_page.clamp(1, Self::MAX_PER_PAGE)
    }

    /// Row offset for the current page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1).saturating_mul(i64::from(self.limit()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let query = PaginationQuery {
            page: 0,
            per_page: 1000,
        };
        assert_eq!(query.limit(), 100);
        assert_eq!(query.offset(), 0);

        let query = PaginationQuery {
            page: 3,
            per_page: 10,
        };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_pagination_offset_past_u32() {
        let query = PaginationQuery {
            page: 50_000_000,
            per_page: 100,
        };
        assert_eq!(query.offset(), 4_999_999_900);

        let query = PaginationQuery {
            page: u32::MAX,
            per_page: u32::MAX,
        };
        assert_eq!(query.offset(), i64::from(u32::MAX - 1) * 100);
    }

    #[test]
    fn test_filter_price_range() {
        let query = RentFilterQuery {
            min_price: Some(500.0),
            max_price: Some(100.0),
            ..Default::default()
        };
        assert!(query.into_filter().is_err());

        let query = RentFilterQuery {
            min_price: Some(100.0),
            max_price: Some(500.0),
            room_count: Some(2),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.room_count, Some(2));
    }

    #[test]
    fn test_review_rate_range() {
        let review: ReviewRequest =
            serde_json::from_str(r#"{"rent_id": 1, "rate": 6, "comment": "ok"}"#).unwrap();
        assert!(review.validate().is_err());

        let review: ReviewRequest = serde_json::from_str(r#"{"rent_id": 1, "rate": 5}"#).unwrap();
        assert!(review.validate().is_ok());
    }

    #[test]
    fn test_rent_request_defaults() {
        let req: RentRequest = serde_json::from_str(
            r#"{"name": "Flat", "category_id": 1, "room_count": 2,
                "total_price": 300.0, "student_jins_id": 1, "student_count": 2}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.renter_id.is_none());

        let rent = req.into_new_rent(9);
        assert_eq!(rent.renter_id, 9);
        assert!(!rent.wifi);
    }
}
