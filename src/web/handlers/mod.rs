//! API handlers.

pub mod auth;
pub mod mobile;
pub mod reference;
pub mod renter;
pub mod staff;

use std::sync::Arc;

use crate::auth::{PhoneVerificationStore, SmsSender, TokenService};
use crate::config::Config;
use crate::db::Database;
use crate::storage::ImageStorage;
use crate::Result;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database pool.
    pub db: Database,
    /// Token issuer and verifier.
    pub tokens: Arc<TokenService>,
    /// Pending phone verifications.
    pub verifications: Arc<PhoneVerificationStore>,
    /// Outbound SMS for verification codes.
    pub sms: Arc<dyn SmsSender>,
    /// Uploaded image store.
    pub storage: ImageStorage,
    /// Registration requires a verified phone.
    pub require_phone_verification: bool,
}

impl AppState {
    /// Build the state from configuration.
    pub fn new(db: Database, config: &Config, sms: Arc<dyn SmsSender>) -> Result<Self> {
        let tokens = TokenService::new(
            &config.auth.jwt_secret,
            config.auth.access_token_expiry_secs,
            config.auth.refresh_token_expiry_secs,
        );
        let max_size = (config.files.max_upload_size_mb * 1024 * 1024) as usize;
        let storage = ImageStorage::new(&config.files.storage_path, max_size)?;

        Ok(Self {
            db,
            tokens: Arc::new(tokens),
            verifications: Arc::new(PhoneVerificationStore::new(&config.registration)),
            sms,
            storage,
            require_phone_verification: config.registration.require_phone_verification,
        })
    }
}
