//! Phone number verification.
//!
//! A verification flow is started for a phone number, which stores a random
//! numeric code under a fresh `verification_id` and hands the code to an
//! [`SmsSender`]. The client confirms the code, and registration later
//! consumes the confirmed entry. Entries expire after a configurable TTL and
//! are dropped after too many wrong guesses.

use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{RegistrationConfig, SmsConfig};
use crate::{IjaraError, Result};

/// Verification flow errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// No entry for this id (never started, consumed or swept).
    #[error("unknown verification id")]
    NotFound,

    /// The entry exists but its TTL has elapsed.
    #[error("verification code has expired")]
    Expired,

    /// Wrong code; the entry survives with fewer attempts left.
    #[error("verification code is incorrect ({remaining} attempts left)")]
    CodeMismatch {
        /// Attempts left before the entry is discarded.
        remaining: u32,
    },

    /// Wrong code and the attempt budget is used up.
    #[error("too many incorrect attempts")]
    TooManyAttempts,

    /// The code has not been confirmed yet.
    #[error("phone number has not been verified")]
    NotVerified,

    /// The entry was started for a different phone number.
    #[error("verification does not belong to this phone number")]
    PhoneMismatch,
}

impl From<VerificationError> for IjaraError {
    fn from(e: VerificationError) -> Self {
        IjaraError::Validation(e.to_string())
    }
}

#[derive(Debug, Clone)]
struct PendingVerification {
    phone: String,
    code: String,
    expires_at: Instant,
    attempts: u32,
    verified: bool,
}

impl PendingVerification {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Handle returned when a verification flow starts.
#[derive(Debug, Clone, Serialize)]
pub struct StartedVerification {
    /// Correlation id for the confirm and register steps.
    pub verification_id: Uuid,
    /// Seconds until the code expires.
    pub expires_in: u64,
    #[serde(skip)]
    code: String,
}

impl StartedVerification {
    /// The generated code, to be delivered out of band.
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Keyed, expiring store of pending phone verifications.
#[derive(Debug)]
pub struct PhoneVerificationStore {
    entries: RwLock<HashMap<Uuid, PendingVerification>>,
    ttl: Duration,
    max_attempts: u32,
    code_length: usize,
}

impl PhoneVerificationStore {
    /// Create a store from registration settings.
    pub fn new(config: &RegistrationConfig) -> Self {
        Self::with_settings(
            Duration::from_secs(config.code_ttl_secs),
            config.max_attempts,
            config.code_length,
        )
    }

    /// Create a store with explicit settings.
    pub fn with_settings(ttl: Duration, max_attempts: u32, code_length: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_attempts: max_attempts.max(1),
            code_length: code_length.clamp(1, 9),
        }
    }

    /// Start a flow for `phone` and return its id and code.
    pub fn start(&self, phone: &str) -> StartedVerification {
        let id = Uuid::new_v4();
        let code = generate_code(self.code_length);
        let entry = PendingVerification {
            phone: phone.to_string(),
            code: code.clone(),
            expires_at: Instant::now() + self.ttl,
            attempts: 0,
            verified: false,
        };

        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, entry);
        debug!(verification_id = %id, "Phone verification started");

        StartedVerification {
            verification_id: id,
            expires_in: self.ttl.as_secs(),
            code,
        }
    }

    /// Check a code against a pending entry and mark it verified.
    pub fn confirm(&self, id: &Uuid, code: &str) -> std::result::Result<(), VerificationError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get_mut(id).ok_or(VerificationError::NotFound)?;

        if entry.is_expired(Instant::now()) {
            entries.remove(id);
            return Err(VerificationError::Expired);
        }

        if entry.code != code.trim() {
            entry.attempts += 1;
            if entry.attempts >= self.max_attempts {
                entries.remove(id);
                warn!(verification_id = %id, "Phone verification dropped after too many attempts");
                return Err(VerificationError::TooManyAttempts);
            }
            return Err(VerificationError::CodeMismatch {
                remaining: self.max_attempts - entry.attempts,
            });
        }

        entry.verified = true;
        Ok(())
    }

    /// Take a verified entry for `phone`. The entry is removed on success.
    pub fn consume(&self, id: &Uuid, phone: &str) -> std::result::Result<(), VerificationError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(id).ok_or(VerificationError::NotFound)?;

        if entry.is_expired(Instant::now()) {
            entries.remove(id);
            return Err(VerificationError::Expired);
        }
        if entry.phone != phone {
            return Err(VerificationError::PhoneMismatch);
        }
        if !entry.verified {
            return Err(VerificationError::NotVerified);
        }

        entries.remove(id);
        Ok(())
    }

    /// Drop expired entries. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Generate a random numeric code with `length` digits.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Delivers verification codes to handsets.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send `text` to `phone`.
    async fn send(&self, phone: &str, text: &str) -> Result<()>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone: &str, text: &str) -> Result<()> {
        info!(phone = %phone, "SMS: {}", text);
        Ok(())
    }
}

#[derive(Serialize)]
struct GatewayMessage<'a> {
    phone: &'a str,
    text: &'a str,
    from: &'a str,
}

/// Posts messages as JSON to an HTTP SMS gateway.
#[derive(Debug, Clone)]
pub struct HttpSmsSender {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
    sender: String,
}

impl HttpSmsSender {
    /// Create a sender for the configured gateway.
    pub fn new(config: &SmsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IjaraError::Sms(e.to_string()))?;

        Ok(Self {
            client,
            gateway_url: config.gateway_url.clone(),
            api_key: config.api_key.clone(),
            sender: config.sender.clone(),
        })
    }
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, phone: &str, text: &str) -> Result<()> {
        let mut request = self.client.post(&self.gateway_url).json(&GatewayMessage {
            phone,
            text,
            from: &self.sender,
        });
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IjaraError::Sms(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IjaraError::Sms(format!(
                "gateway returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Build the sender selected by configuration.
pub fn sms_sender_from_config(config: &SmsConfig) -> Result<Arc<dyn SmsSender>> {
    match config.provider.as_str() {
        "log" => Ok(Arc::new(LogSmsSender)),
        "http" => Ok(Arc::new(HttpSmsSender::new(config)?)),
        other => Err(IjaraError::Config(format!("unknown sms provider: {other}"))),
    }
}

/// Text of the verification message.
pub fn verification_message(code: &str) -> String {
    format!("Your ijara verification code: {code}")
}
