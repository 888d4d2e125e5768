//! Shared helpers for the HTTP API tests.
//!
//! Each test gets its own in-memory database, a temporary image directory
//! and an SMS recorder that captures verification codes.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use ijara::auth::{SmsSender, TokenService};
use ijara::db::{NewRenter, NewStaff, RenterRepository, StaffRepository};
use ijara::web::middleware::RateLimitState;
use ijara::web::router::create_router;
use ijara::web::AppState;
use ijara::{hash_password, Config, Database};

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";
pub const PASSWORD: &str = "Secret123";

/// Fake image upload. Only the extension is checked.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

/// Records outgoing SMS instead of sending them.
#[derive(Default)]
pub struct MemorySmsSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemorySmsSender {
    /// Last code sent to `phone`.
    pub fn last_code(&self, phone: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter()
            .rev()
            .find(|(to, _)| to == phone)
            .and_then(|(_, text)| text.rsplit(' ').next().map(str::to_string))
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsSender for MemorySmsSender {
    async fn send(&self, phone: &str, text: &str) -> ijara::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), text.to_string()));
        Ok(())
    }
}

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub sms: Arc<MemorySmsSender>,
    pub tokens: Arc<TokenService>,
    _storage: TempDir,
}

/// Test configuration with phone verification on and a generous login limit.
pub fn test_config(storage: &TempDir) -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = JWT_SECRET.to_string();
    config.auth.login_rate_limit = 1000;
    config.files.storage_path = storage.path().to_string_lossy().into_owned();
    config.files.max_upload_size_mb = 1;
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let storage = tempfile::tempdir().expect("Failed to create storage dir");
    let mut config = test_config(&storage);
    configure(&mut config);

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let sms = Arc::new(MemorySmsSender::default());

    let app_state = AppState::new(db.clone(), &config, sms.clone()).expect("Failed to build state");
    let tokens = app_state.tokens.clone();
    let rate_limit = Arc::new(RateLimitState::new(config.auth.login_rate_limit));

    let router = create_router(Arc::new(app_state), rate_limit, &config.server.cors_origins);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        sms,
        tokens,
        _storage: storage,
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

impl TestApp {
    /// Run both verification steps for `phone`. Returns the verification id.
    pub async fn verify_phone(&self, phone: &str) -> String {
        let response = self
            .server
            .post("/auth/phone_number")
            .json(&json!({ "phone": phone }))
            .await;
        response.assert_status_ok();
        let verification_id = response.json::<Value>()["data"]["verification_id"]
            .as_str()
            .unwrap()
            .to_string();

        let code = self.sms.last_code(phone).expect("No code sent");
        self.server
            .post("/auth/phone_number/sms")
            .json(&json!({ "verification_id": verification_id, "code": code }))
            .await
            .assert_status_ok();

        verification_id
    }

    /// Multipart student registration form.
    pub fn student_form(phone: &str, verification_id: &str) -> MultipartForm {
        MultipartForm::new()
            .add_text("firstname", "Aziz")
            .add_text("lastname", "Karimov")
            .add_text("phone", phone)
            .add_text("jins_id", "1")
            .add_text("password1", PASSWORD)
            .add_text("password2", PASSWORD)
            .add_text("verification_id", verification_id)
    }

    /// Verify the phone and register a student. Returns the student ID.
    pub async fn register_student(&self, phone: &str) -> i64 {
        let verification_id = self.verify_phone(phone).await;
        let response = self
            .server
            .post("/auth/register/student/step_1")
            .multipart(Self::student_form(phone, &verification_id))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"]["id"].as_i64().unwrap()
    }

    /// Verify the phone and register a renter with a profile photo.
    pub async fn register_renter(&self, phone: &str) -> i64 {
        let verification_id = self.verify_phone(phone).await;
        let form = MultipartForm::new()
            .add_text("first_name", "Dilshod")
            .add_text("last_name", "Toshev")
            .add_text("phone", phone)
            .add_text("password_1", PASSWORD)
            .add_text("password_2", PASSWORD)
            .add_text("verification_id", verification_id)
            .add_part(
                "image",
                Part::bytes(PNG_BYTES.to_vec())
                    .file_name("me.png")
                    .mime_type("image/png"),
            );
        let response = self
            .server
            .post("/auth/register/renter")
            .multipart(form)
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"]["id"].as_i64().unwrap()
    }

    /// Log in and return the `data` object of the token pair.
    pub async fn login(&self, class: &str, body: Value) -> Value {
        let response = self
            .server
            .post(&format!("/auth/login/{}", class))
            .json(&body)
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"].clone()
    }

    /// Register and log in a student. Returns the access token.
    pub async fn student_token(&self, phone: &str) -> String {
        self.register_student(phone).await;
        let pair = self
            .login("Student", json!({ "phone": phone, "password": PASSWORD }))
            .await;
        pair["access_token"].as_str().unwrap().to_string()
    }

    /// Register and log in a renter. Returns (renter ID, access token).
    pub async fn renter_token(&self, phone: &str) -> (i64, String) {
        let id = self.register_renter(phone).await;
        let pair = self
            .login("Renter", json!({ "phone": phone, "password": PASSWORD }))
            .await;
        (id, pair["access_token"].as_str().unwrap().to_string())
    }

    /// Insert a renter directly, bypassing verification.
    pub async fn seed_renter(&self, phone: &str) -> i64 {
        RenterRepository::new(self.db.pool())
            .create(&NewRenter {
                firstname: "Seed".to_string(),
                lastname: "Renter".to_string(),
                phone: phone.to_string(),
                password: hash_password(PASSWORD).unwrap(),
                image: None,
            })
            .await
            .unwrap()
            .id
    }

    /// Insert a staff member and log in. Returns the access token.
    pub async fn staff_token(&self, email: &str) -> String {
        StaffRepository::new(self.db.pool())
            .create(&NewStaff {
                firstname: "Staff".to_string(),
                lastname: "Member".to_string(),
                phone: "+998700000001".to_string(),
                email: email.to_string(),
                password: hash_password(PASSWORD).unwrap(),
                role_id: 1,
            })
            .await
            .unwrap();
        let pair = self
            .login("Staff", json!({ "email": email, "password": PASSWORD }))
            .await;
        pair["access_token"].as_str().unwrap().to_string()
    }

    /// Create a listing as a student on behalf of `renter_id`. Returns its ID.
    pub async fn add_rent(&self, student_token: &str, renter_id: i64) -> i64 {
        let response = self
            .server
            .post("/mobile/student/add-rent")
            .add_header(AUTHORIZATION, bearer(student_token))
            .json(&rent_payload(renter_id))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"]["id"].as_i64().unwrap()
    }
}

/// A valid listing payload.
pub fn rent_payload(renter_id: i64) -> Value {
    json!({
        "name": "Two rooms near TATU",
        "description": "Quiet flat, 10 minutes to campus",
        "category_id": 1,
        "contract": true,
        "broker": false,
        "room_count": 2,
        "total_price": 350.0,
        "student_jins_id": 1,
        "student_count": 2,
        "renter_id": renter_id,
        "location": "Yunusobod",
        "wifi": true,
        "refrigerator": true
    })
}
