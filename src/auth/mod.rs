//! Authentication module for ijara.
//!
//! This module provides password hashing, token issuance and verification,
//! and the phone verification flow used during registration.

mod password;
pub mod token;
pub mod verification;

pub use password::{
    check_password_input, hash_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
};
pub use token::{
    Claims, Identity, IdentityClass, TokenError, TokenPair, TokenService, TokenType,
};
pub use verification::{
    sms_sender_from_config, HttpSmsSender, LogSmsSender, PhoneVerificationStore, SmsSender,
    StartedVerification, VerificationError,
};
