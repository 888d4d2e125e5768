//! Authentication handlers: phone verification, registration, login,
//! token refresh and the student profile.

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::verification::verification_message;
use crate::auth::{check_password_input, hash_password, verify_password, Identity, TokenPair};
use crate::db::{
    ImageRepository, NewImage, NewRenter, NewStudent, RenterRepository, StaffRepository, Student,
    StudentRepository,
};
use crate::storage::StoredImage;
use crate::web::dto::{
    normalize_phone, ApiResponse, FormData, LoginRequest, MeResponse, PhoneRequest,
    RefreshRequest, RegisteredResponse, SetProfileRequest, SmsCodeRequest, StaffLoginRequest,
    UploadedFile, ValidatedJson, VerificationStartedResponse, VerifiedResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AnyAuth, StudentAuth};
use crate::IjaraError;

const INVALID_LOGIN: &str = "Invalid phone or password";
const INVALID_STAFF_LOGIN: &str = "Invalid email or password";

/// Check the password pair and input bounds. Returns the password.
fn checked_password(form: &FormData, first: &str, second: &str) -> Result<String, ApiError> {
    let password = form.password(first)?;
    if password != form.password(second)? {
        return Err(IjaraError::ValidationMismatch("passwords".to_string()).into());
    }
    check_password_input(password).map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(password.to_string())
}

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to process password")
    })
}

/// Consume the verification for `phone` when verification is required.
fn consume_verification(state: &AppState, form: &FormData, phone: &str) -> Result<(), ApiError> {
    if !state.require_phone_verification {
        return Ok(());
    }
    let id: Uuid = form
        .required("verification_id")
        .map_err(|_| ApiError::bad_request("Phone verification is required"))?
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid verification_id"))?;
    state.verifications.consume(&id, phone)?;
    Ok(())
}

async fn save_upload(
    state: &AppState,
    file: Option<UploadedFile>,
) -> Result<Option<StoredImage>, ApiError> {
    match file {
        Some(file) => Ok(Some(state.storage.save(&file.content, &file.filename).await?)),
        None => Ok(None),
    }
}

async fn discard_upload(state: &AppState, image: Option<StoredImage>) {
    if let Some(image) = image {
        if let Err(e) = state.storage.delete(&image.url).await {
            tracing::warn!("Failed to remove orphaned image {}: {}", image.url, e);
        }
    }
}

/// Record a profile photo once its owner exists.
async fn record_profile_image(state: &AppState, image: Option<StoredImage>) -> Result<(), ApiError> {
    if let Some(image) = image {
        ImageRepository::new(state.db.pool())
            .create(&NewImage {
                rent_id: None,
                url: image.url,
                hashcode: image.hashcode,
            })
            .await?;
    }
    Ok(())
}

/// Load the account behind an identity. None when it has been removed.
async fn load_account(state: &AppState, identity: &Identity) -> Result<Option<MeResponse>, ApiError> {
    let pool = state.db.pool();
    let me = match *identity {
        Identity::Student { user_id, .. } => StudentRepository::new(pool)
            .get_by_id(user_id)
            .await?
            .map(MeResponse::from),
        Identity::Renter { renter_id } => RenterRepository::new(pool)
            .get_by_id(renter_id)
            .await?
            .map(MeResponse::from),
        Identity::Staff { stuff_id, .. } => StaffRepository::new(pool)
            .get_by_id(stuff_id)
            .await?
            .map(MeResponse::from),
    };
    Ok(me)
}

/// POST /auth/phone_number - Start phone verification.
#[utoipa::path(
    post,
    path = "/auth/phone_number",
    tag = "auth",
    request_body = PhoneRequest,
    responses(
        (status = 200, description = "Code sent", body = VerificationStartedResponse),
        (status = 400, description = "Invalid or already registered phone")
    )
)]
pub async fn phone_number(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<PhoneRequest>,
) -> Result<Json<ApiResponse<VerificationStartedResponse>>, ApiError> {
    let phone = normalize_phone(&req.phone)?;

    let pool = state.db.pool();
    if StudentRepository::new(pool).phone_exists(&phone).await?
        || RenterRepository::new(pool).phone_exists(&phone).await?
    {
        return Err(ApiError::bad_request("Phone number is already registered"));
    }

    let started = state.verifications.start(&phone);
    state
        .sms
        .send(&phone, &verification_message(started.code()))
        .await?;

    Ok(Json(ApiResponse::new(VerificationStartedResponse {
        verification_id: started.verification_id,
        expires_in: started.expires_in,
    })))
}

/// POST /auth/phone_number/sms - Confirm the SMS code.
#[utoipa::path(
    post,
    path = "/auth/phone_number/sms",
    tag = "auth",
    request_body = SmsCodeRequest,
    responses(
        (status = 200, description = "Phone verified", body = VerifiedResponse),
        (status = 400, description = "Wrong, expired or unknown code")
    )
)]
pub async fn phone_number_sms(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SmsCodeRequest>,
) -> Result<Json<ApiResponse<VerifiedResponse>>, ApiError> {
    state
        .verifications
        .confirm(&req.verification_id, req.code.trim())?;

    Ok(Json(ApiResponse::new(VerifiedResponse {
        verification_id: req.verification_id,
        verified: true,
    })))
}

/// POST /auth/register/student/step_1 - Register a student.
///
/// Multipart fields: firstname, lastname, phone, jins_id, password1,
/// password2, invisible (optional), verification_id, image (optional file).
#[utoipa::path(
    post,
    path = "/auth/register/student/step_1",
    tag = "auth",
    responses(
        (status = 200, description = "Student registered", body = RegisteredResponse),
        (status = 400, description = "Invalid form, password mismatch or unverified phone"),
        (status = 409, description = "Phone already registered")
    )
)]
pub async fn register_student(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<RegisteredResponse>>, ApiError> {
    let mut form = FormData::read(multipart, "image").await?;

    let firstname = form.required("firstname")?.to_string();
    let lastname = form.required("lastname")?.to_string();
    let phone = normalize_phone(form.required("phone")?)?;
    let jins_id: i64 = form.parse("jins_id")?;
    let invisible = form.flag("invisible")?;
    let password = checked_password(&form, "password1", "password2")?;

    consume_verification(&state, &form, &phone)?;
    let password_hash = hash(&password)?;
    let image = save_upload(&state, form.take_file()).await?;

    let new_student = NewStudent {
        firstname,
        lastname,
        phone,
        jins_id,
        password: password_hash,
        image: image.as_ref().map(|i| i.hashcode.clone()),
        invisible,
    };

    let student = match StudentRepository::new(state.db.pool()).create(&new_student).await {
        Ok(student) => student,
        Err(e) => {
            discard_upload(&state, image).await;
            return Err(e.into());
        }
    };
    record_profile_image(&state, image).await?;

    tracing::info!(user_id = student.id, "Student registered");

    Ok(Json(ApiResponse::new(RegisteredResponse { id: student.id })))
}

/// POST /auth/register/renter - Register a renter.
///
/// Multipart fields: first_name, last_name, phone, password_1, password_2,
/// verification_id, image (optional file).
#[utoipa::path(
    post,
    path = "/auth/register/renter",
    tag = "auth",
    responses(
        (status = 200, description = "Renter registered", body = RegisteredResponse),
        (status = 400, description = "Invalid form, password mismatch or unverified phone"),
        (status = 409, description = "Phone already registered")
    )
)]
pub async fn register_renter(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<RegisteredResponse>>, ApiError> {
    let mut form = FormData::read(multipart, "image").await?;

    let firstname = form.required("first_name")?.to_string();
    let lastname = form.required("last_name")?.to_string();
    let phone = normalize_phone(form.required("phone")?)?;
    let password = checked_password(&form, "password_1", "password_2")?;

    consume_verification(&state, &form, &phone)?;
    let password_hash = hash(&password)?;
    let image = save_upload(&state, form.take_file()).await?;

    let new_renter = NewRenter {
        firstname,
        lastname,
        phone,
        password: password_hash,
        image: image.as_ref().map(|i| i.hashcode.clone()),
    };

    let renter = match RenterRepository::new(state.db.pool()).create(&new_renter).await {
        Ok(renter) => renter,
        Err(e) => {
            discard_upload(&state, image).await;
            return Err(e.into());
        }
    };
    record_profile_image(&state, image).await?;

    tracing::info!(renter_id = renter.id, "Renter registered");

    Ok(Json(ApiResponse::new(RegisteredResponse { id: renter.id })))
}

/// POST /auth/login/Student - Student login.
#[utoipa::path(
    post,
    path = "/auth/login/Student",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Invalid phone or password"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login_student(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let phone = normalize_phone(&req.phone).unwrap_or(req.phone);

    let student = StudentRepository::new(state.db.pool())
        .get_by_phone(&phone)
        .await?
        .ok_or_else(|| IjaraError::Auth(INVALID_LOGIN.to_string()))?;

    verify_password(&req.password, &student.password)
        .map_err(|_| IjaraError::Auth(INVALID_LOGIN.to_string()))?;

    let pair = state.tokens.issue_pair(&Identity::Student {
        user_id: student.id,
        jins_id: student.jins_id,
    })?;

    tracing::info!(user_id = student.id, "Student logged in");

    Ok(Json(ApiResponse::new(pair)))
}

/// POST /auth/login/Renter - Renter login.
#[utoipa::path(
    post,
    path = "/auth/login/Renter",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Invalid phone or password"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login_renter(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let phone = normalize_phone(&req.phone).unwrap_or(req.phone);

    let renter = RenterRepository::new(state.db.pool())
        .get_by_phone(&phone)
        .await?
        .ok_or_else(|| IjaraError::Auth(INVALID_LOGIN.to_string()))?;

    verify_password(&req.password, &renter.password)
        .map_err(|_| IjaraError::Auth(INVALID_LOGIN.to_string()))?;

    let pair = state.tokens.issue_pair(&Identity::Renter {
        renter_id: renter.id,
    })?;

    tracing::info!(renter_id = renter.id, "Renter logged in");

    Ok(Json(ApiResponse::new(pair)))
}

/// POST /auth/login/Staff - Staff login by email.
#[utoipa::path(
    post,
    path = "/auth/login/Staff",
    tag = "auth",
    request_body = StaffLoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Invalid email or password"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login_staff(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<StaffLoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let repo = StaffRepository::new(state.db.pool());
    let staff = repo
        .get_by_email(req.email.trim())
        .await?
        .ok_or_else(|| IjaraError::Auth(INVALID_STAFF_LOGIN.to_string()))?;

    verify_password(&req.password, &staff.password)
        .map_err(|_| IjaraError::Auth(INVALID_STAFF_LOGIN.to_string()))?;

    let pair = state.tokens.issue_pair(&Identity::Staff {
        stuff_id: staff.id,
        role_id: staff.role_id,
    })?;

    if let Err(e) = repo.update_last_login(staff.id).await {
        tracing::warn!("Failed to update last login for staff {}: {}", staff.id, e);
    }

    tracing::info!(stuff_id = staff.id, "Staff logged in");

    Ok(Json(ApiResponse::new(pair)))
}

/// POST /auth/refresh - Exchange a refresh token for a new pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Invalid, expired or non-refresh token")
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let (identity, pair) = state.tokens.refresh(&req.refresh_token)?;

    if load_account(&state, &identity).await?.is_none() {
        return Err(ApiError::unauthorized("Account no longer exists"));
    }

    Ok(Json(ApiResponse::new(pair)))
}

/// GET /auth/me - Summary of the caller.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Authenticated identity", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    AnyAuth(identity): AnyAuth,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let me = load_account(&state, &identity)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    Ok(Json(ApiResponse::new(me)))
}

/// PUT /auth/set-profile - Update the student's profile.
#[utoipa::path(
    put,
    path = "/auth/set-profile",
    tag = "auth",
    request_body = SetProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = Student),
        (status = 400, description = "No fields or unknown reference"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a student")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_profile(
    State(state): State<Arc<AppState>>,
    auth: StudentAuth,
    ValidatedJson(req): ValidatedJson<SetProfileRequest>,
) -> Result<Json<ApiResponse<Student>>, ApiError> {
    let update = req.into_update();
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let student = StudentRepository::new(state.db.pool())
        .update(auth.user_id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Student not found"))?;

    Ok(Json(ApiResponse::new(student)))
}
