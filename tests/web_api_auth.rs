//! Web API Authentication Tests
//!
//! Phone verification, registration, login, refresh and token scoping.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use serde_json::{json, Value};

use common::{bearer, spawn_app, spawn_app_with, TestApp, PASSWORD};
use ijara::auth::{Claims, Identity, TokenType};

const STUDENT_PHONE: &str = "+998901234567";
const RENTER_PHONE: &str = "+998911112233";

// ============================================================================
// Phone verification
// ============================================================================

#[tokio::test]
async fn test_phone_verification_flow() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/phone_number")
        .json(&json!({ "phone": STUDENT_PHONE }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["data"]["verification_id"].is_string());
    assert_eq!(body["data"]["expires_in"], 300);
    assert_eq!(app.sms.count(), 1);

    let code = app.sms.last_code(STUDENT_PHONE).unwrap();
    assert_eq!(code.len(), 4);

    let response = app
        .server
        .post("/auth/phone_number/sms")
        .json(&json!({
            "verification_id": body["data"]["verification_id"],
            "code": code
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["verified"], true);
}

#[tokio::test]
async fn test_wrong_sms_code_rejected() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/phone_number")
        .json(&json!({ "phone": STUDENT_PHONE }))
        .await;
    let verification_id = response.json::<Value>()["data"]["verification_id"].clone();
    let code = app.sms.last_code(STUDENT_PHONE).unwrap();
    let wrong = if code == "0000" { "1111" } else { "0000" };

    let response = app
        .server
        .post("/auth/phone_number/sms")
        .json(&json!({ "verification_id": verification_id, "code": wrong }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_verification_id_rejected() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/phone_number/sms")
        .json(&json!({
            "verification_id": "4f1c2b7e-3f1a-4c55-9a7e-0d6b1f1e2a3b",
            "code": "1234"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_phone_rejected() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/phone_number")
        .json(&json!({ "phone": "+99890abcdefg" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.sms.count(), 0);
}

#[tokio::test]
async fn test_registered_phone_rejected_for_any_class() {
    let app = spawn_app().await;
    app.register_renter(RENTER_PHONE).await;

    // A renter's phone cannot start a new student signup either
    let response = app
        .server
        .post("/auth/phone_number")
        .json(&json!({ "phone": RENTER_PHONE }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_student_and_login() {
    let app = spawn_app().await;
    let id = app.register_student(STUDENT_PHONE).await;
    assert!(id > 0);

    let pair = app
        .login(
            "Student",
            json!({ "phone": STUDENT_PHONE, "password": PASSWORD }),
        )
        .await;
    assert!(pair["access_token"].is_string());
    assert!(pair["refresh_token"].is_string());
    assert_eq!(pair["token_type"], "bearer");
    assert_eq!(pair["expires_in"], 1800);
}

#[tokio::test]
async fn test_register_requires_verification() {
    let app = spawn_app().await;

    let form = MultipartForm::new()
        .add_text("firstname", "Aziz")
        .add_text("lastname", "Karimov")
        .add_text("phone", STUDENT_PHONE)
        .add_text("jins_id", "1")
        .add_text("password1", PASSWORD)
        .add_text("password2", PASSWORD);

    let response = app
        .server
        .post("/auth/register/student/step_1")
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verification_is_single_use() {
    let app = spawn_app().await;
    let verification_id = app.verify_phone(STUDENT_PHONE).await;

    app.server
        .post("/auth/register/student/step_1")
        .multipart(TestApp::student_form(STUDENT_PHONE, &verification_id))
        .await
        .assert_status_ok();

    // Same verification for another attempt
    let response = app
        .server
        .post("/auth/register/student/step_1")
        .multipart(TestApp::student_form(STUDENT_PHONE, &verification_id))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verification_bound_to_phone() {
    let app = spawn_app().await;
    let verification_id = app.verify_phone(STUDENT_PHONE).await;

    let response = app
        .server
        .post("/auth/register/student/step_1")
        .multipart(TestApp::student_form("+998935550000", &verification_id))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_mismatch() {
    let app = spawn_app().await;
    let verification_id = app.verify_phone(STUDENT_PHONE).await;

    let form = MultipartForm::new()
        .add_text("firstname", "Aziz")
        .add_text("lastname", "Karimov")
        .add_text("phone", STUDENT_PHONE)
        .add_text("jins_id", "1")
        .add_text("password1", PASSWORD)
        .add_text("password2", "Different1")
        .add_text("verification_id", verification_id);

    let response = app
        .server
        .post("/auth/register/student/step_1")
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("passwords"));
}

#[tokio::test]
async fn test_blank_name_rejected() {
    let app = spawn_app().await;
    let verification_id = app.verify_phone(RENTER_PHONE).await;

    let form = MultipartForm::new()
        .add_text("first_name", "   ")
        .add_text("last_name", "Toshev")
        .add_text("phone", RENTER_PHONE)
        .add_text("password_1", PASSWORD)
        .add_text("password_2", PASSWORD)
        .add_text("verification_id", verification_id);

    let response = app
        .server
        .post("/auth/register/renter")
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "first_name is required");
}

#[tokio::test]
async fn test_duplicate_phone_conflict() {
    let app = spawn_app_with(|config| config.registration.require_phone_verification = false).await;

    app.server
        .post("/auth/register/student/step_1")
        .multipart(TestApp::student_form(STUDENT_PHONE, ""))
        .await
        .assert_status_ok();

    let response = app
        .server
        .post("/auth/register/student/step_1")
        .multipart(TestApp::student_form(STUDENT_PHONE, ""))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_unknown_jins_rejected() {
    let app = spawn_app_with(|config| config.registration.require_phone_verification = false).await;

    let form = MultipartForm::new()
        .add_text("firstname", "Aziz")
        .add_text("lastname", "Karimov")
        .add_text("phone", STUDENT_PHONE)
        .add_text("jins_id", "99")
        .add_text("password1", PASSWORD)
        .add_text("password2", PASSWORD);

    let response = app
        .server
        .post("/auth/register/student/step_1")
        .multipart(form)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_wrong_password() {
    let app = spawn_app().await;
    app.register_student(STUDENT_PHONE).await;

    let response = app
        .server
        .post("/auth/login/Student")
        .json(&json!({ "phone": STUDENT_PHONE, "password": "WrongPass1" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body.get("data").is_none());
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], "Invalid phone or password");
}

#[tokio::test]
async fn test_login_unknown_phone() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/auth/login/Renter")
        .json(&json!({ "phone": RENTER_PHONE, "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_student_cannot_login_as_renter() {
    let app = spawn_app().await;
    app.register_student(STUDENT_PHONE).await;

    let response = app
        .server
        .post("/auth/login/Renter")
        .json(&json!({ "phone": STUDENT_PHONE, "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_login_by_email() {
    let app = spawn_app().await;
    let token = app.staff_token("admin@ijara.uz").await;

    let response = app
        .server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["class"], "staff");
    assert_eq!(body["data"]["email"], "admin@ijara.uz");
    assert_eq!(body["data"]["role_id"], 1);

    let response = app
        .server
        .post("/auth/login/Staff")
        .json(&json!({ "email": "admin@ijara.uz", "password": "WrongPass1" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_rate_limit() {
    let app = spawn_app_with(|config| config.auth.login_rate_limit = 2).await;

    for _ in 0..2 {
        app.server
            .post("/auth/login/Student")
            .add_header("X-Forwarded-For", "203.0.113.9")
            .json(&json!({ "phone": STUDENT_PHONE, "password": PASSWORD }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = app
        .server
        .post("/auth/login/Student")
        .add_header("X-Forwarded-For", "203.0.113.9")
        .json(&json!({ "phone": STUDENT_PHONE, "password": PASSWORD }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>()["error"]["code"], "TOO_MANY_REQUESTS");

    // Another client is unaffected
    app.server
        .post("/auth/login/Student")
        .add_header("X-Forwarded-For", "198.51.100.4")
        .json(&json!({ "phone": STUDENT_PHONE, "password": PASSWORD }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Tokens
// ============================================================================

#[tokio::test]
async fn test_refresh_issues_new_pair() {
    let app = spawn_app().await;
    app.register_student(STUDENT_PHONE).await;
    let pair = app
        .login(
            "Student",
            json!({ "phone": STUDENT_PHONE, "password": PASSWORD }),
        )
        .await;

    let response = app
        .server
        .post("/auth/refresh")
        .json(&json!({ "refresh_token": pair["refresh_token"] }))
        .await;
    response.assert_status_ok();
    let new_pair = response.json::<Value>()["data"].clone();
    let access = new_pair["access_token"].as_str().unwrap();

    let response = app
        .server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer(access))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["class"], "student");
    assert_eq!(body["data"]["phone"], STUDENT_PHONE);
}

#[tokio::test]
async fn test_access_token_rejected_by_refresh() {
    let app = spawn_app().await;
    let access = app.student_token(STUDENT_PHONE).await;

    let response = app
        .server
        .post("/auth/refresh")
        .json(&json!({ "refresh_token": access }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_rejected_as_bearer() {
    let app = spawn_app().await;
    app.register_student(STUDENT_PHONE).await;
    let pair = app
        .login(
            "Student",
            json!({ "phone": STUDENT_PHONE, "password": PASSWORD }),
        )
        .await;

    let response = app
        .server
        .get("/mobile/student/rent")
        .add_header(AUTHORIZATION, bearer(pair["refresh_token"].as_str().unwrap()))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = spawn_app().await;
    let identity = Identity::Student {
        user_id: 1,
        jins_id: 1,
    };
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims::new(&identity, TokenType::Access, now - 7200, now - 3600);
    let token = app.tokens.sign(&claims).unwrap();

    let response = app
        .server
        .get("/mobile/student/rent")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("expired"));
}

#[tokio::test]
async fn test_missing_and_garbage_tokens() {
    let app = spawn_app().await;

    app.server
        .get("/auth/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/auth/me")
        .add_header(AUTHORIZATION, "Bearer invalid-token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_student_token_forbidden_elsewhere() {
    let app = spawn_app().await;
    let token = app.student_token(STUDENT_PHONE).await;

    app.server
        .get("/renter/rent")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .get("/staff/students")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_set_profile() {
    let app = spawn_app().await;
    let token = app.student_token(STUDENT_PHONE).await;

    let response = app
        .server
        .put("/auth/set-profile")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "firstname": "Bobur", "grade": 3, "invisible": true }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["firstname"], "Bobur");
    assert_eq!(body["data"]["lastname"], "Karimov");
    assert_eq!(body["data"]["grade"], 3);
    assert_eq!(body["data"]["invisible"], true);
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn test_set_profile_empty_update() {
    let app = spawn_app().await;
    let token = app.student_token(STUDENT_PHONE).await;

    let response = app
        .server
        .put("/auth/set-profile")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_profile_grade_out_of_range() {
    let app = spawn_app().await;
    let token = app.student_token(STUDENT_PHONE).await;

    let response = app
        .server
        .put("/auth/set-profile")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "grade": 12 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["error"]["details"]["grade"].is_array());
}

// ============================================================================
// Reference data
// ============================================================================

#[tokio::test]
async fn test_reference_lists() {
    let app = spawn_app().await;

    let response = app.server.get("/auth/get_jins/").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"].as_array().unwrap().len(), 2);

    let response = app.server.get("/auth/get_category/").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"].as_array().unwrap().len(), 4);

    let response = app.server.get("/auth/get_university/").await;
    response.assert_status_ok();
    assert!(response.json::<Value>()["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_faculty_requires_university_id() {
    let app = spawn_app().await;

    app.server
        .get("/auth/get_faculty/")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .get("/auth/get_faculty/")
        .add_query_param("university_id", 1)
        .await
        .assert_status_ok();
}
