//! Router configuration for the HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{auth, mobile, reference, renter, staff, AppState};
use super::middleware::{create_cors_layer, login_rate_limit, token_auth, RateLimitState};
use super::openapi::ApiDoc;

/// Room for multipart boundaries and text fields on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let login_routes = Router::new()
        .route("/login/Student", post(auth::login_student))
        .route("/login/Renter", post(auth::login_renter))
        .route("/login/Staff", post(auth::login_staff))
        .route_layer(middleware::from_fn(move |req, next| {
            let state = rate_limit.clone();
            login_rate_limit(state, req, next)
        }));

    let auth_routes = Router::new()
        .route("/phone_number", post(auth::phone_number))
        .route("/phone_number/sms", post(auth::phone_number_sms))
        .route("/register/student/step_1", post(auth::register_student))
        .route("/register/renter", post(auth::register_renter))
        .route("/refresh", post(auth::refresh))
        .route("/set-profile", put(auth::set_profile))
        .route("/me", get(auth::me))
        .route("/get_university/", get(reference::get_university))
        .route("/get_faculty/", get(reference::get_faculty))
        .route("/get_region/", get(reference::get_region))
        .route("/get_district/", get(reference::get_district))
        .route("/get_category/", get(reference::get_category))
        .route("/get_jins/", get(reference::get_jins))
        .merge(login_routes);

    let mobile_routes = Router::new()
        .route("/rent", get(mobile::list_rents))
        .route("/rent/filter", get(mobile::filter_rents))
        .route("/add-rent", post(mobile::add_rent))
        .route("/home/filters-news", get(mobile::filters_news))
        .route("/add-image-rent", post(mobile::add_image_rent))
        .route("/image", get(mobile::get_image))
        .route("/add-review", post(mobile::add_review))
        .route("/get_rents/get-review", get(mobile::get_reviews))
        .route(
            "/wishlist",
            get(mobile::get_wishlist).post(mobile::add_wishlist),
        )
        .route("/wishlist/:rent_id", delete(mobile::remove_wishlist));

    let renter_routes = Router::new()
        .route(
            "/rent",
            get(renter::list_own_rents).post(renter::create_rent),
        )
        .route("/rent/:id", put(renter::update_rent))
        .route("/rent/:id/image", post(renter::add_rent_image));

    let staff_routes = Router::new()
        .route("/renters", get(staff::list_renters))
        .route("/students", get(staff::list_students));

    let body_limit = app_state.storage.max_size() + FORM_OVERHEAD_BYTES;
    let tokens = app_state.tokens.clone();

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/mobile/student", mobile_routes)
        .nest("/renter", renter_routes)
        .nest("/staff", staff_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(move |req, next| {
                    let tokens = tokens.clone();
                    token_auth(tokens, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Swagger UI at `/swagger-ui`, document at `/api-docs/openapi.json`.
pub fn create_swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
