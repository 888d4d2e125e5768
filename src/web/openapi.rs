//! OpenAPI document for the HTTP API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::TokenPair;
use crate::db::{
    Category, District, Faculty, Image, Jins, Rate, Region, Rent, RentDetails, Renter,
    ReviewDetails, Student, University,
};
use crate::web::dto::{
    ImageUploadedResponse, LoginRequest, MeResponse, PaginationMeta, PhoneRequest,
    RefreshRequest, RegisteredResponse, RentRequest, RentUpdateRequest, ReviewRequest,
    ReviewResponse, SetProfileRequest, SmsCodeRequest, StaffLoginRequest, SuccessResponse,
    VerificationStartedResponse, VerifiedResponse, WishlistRequest,
};
use crate::web::error::{ErrorBody, ErrorCode, ErrorDetail};
use crate::web::handlers::{auth, mobile, reference, renter, staff};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ijara",
        description = "Student housing marketplace API"
    ),
    paths(
        auth::phone_number,
        auth::phone_number_sms,
        auth::register_student,
        auth::register_renter,
        auth::login_student,
        auth::login_renter,
        auth::login_staff,
        auth::refresh,
        auth::me,
        auth::set_profile,
        reference::get_university,
        reference::get_faculty,
        reference::get_region,
        reference::get_district,
        reference::get_category,
        reference::get_jins,
        mobile::list_rents,
        mobile::filter_rents,
        mobile::add_rent,
        mobile::filters_news,
        mobile::add_image_rent,
        mobile::get_image,
        mobile::add_review,
        mobile::get_reviews,
        mobile::get_wishlist,
        mobile::add_wishlist,
        mobile::remove_wishlist,
        renter::list_own_rents,
        renter::create_rent,
        renter::update_rent,
        renter::add_rent_image,
        staff::list_renters,
        staff::list_students,
    ),
    components(schemas(
        TokenPair,
        Category, District, Faculty, Image, Jins, Rate, Region, Rent, RentDetails, Renter,
        ReviewDetails, Student, University,
        PhoneRequest, SmsCodeRequest, LoginRequest, StaffLoginRequest, RefreshRequest,
        SetProfileRequest, RentRequest, RentUpdateRequest, ReviewRequest, WishlistRequest,
        VerificationStartedResponse, VerifiedResponse, RegisteredResponse, MeResponse,
        SuccessResponse, ImageUploadedResponse, ReviewResponse, PaginationMeta,
        ErrorBody, ErrorDetail, ErrorCode,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Phone verification, registration and tokens"),
        (name = "reference", description = "Lookup lists"),
        (name = "mobile", description = "Student app"),
        (name = "renter", description = "Listing management for renters"),
        (name = "staff", description = "Moderation"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
