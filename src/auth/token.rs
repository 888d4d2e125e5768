//! Signed access/refresh tokens.
//!
//! Tokens are stateless HS256 JWTs. Each carries the claims of exactly one
//! identity class (`user_id`/`jins_id` for students, `renter_id` for
//! renters, `stuff_id`/`role_id` for staff) plus a `token_type` tag and a
//! random `jti`. Verification is role-scoped: the caller names the class it
//! expects and a token without that class's subject claim is refused.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::IjaraError;

/// Token verification errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// `exp` is in the past.
    #[error("token has expired")]
    Expired,

    /// Signature, structure or claim set is wrong.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// An access token was used where a refresh token is required, or the
    /// other way round.
    #[error("expected a {expected} token")]
    WrongType {
        /// The type the caller asked for.
        expected: TokenType,
    },

    /// The subject claim for the required identity class is absent.
    #[error("token does not carry a {0} claim")]
    MissingClaim(&'static str),

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for IjaraError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => IjaraError::ExpiredCredential,
            TokenError::Invalid(_) | TokenError::WrongType { .. } => {
                IjaraError::InvalidCredential(e.to_string())
            }
            TokenError::MissingClaim(_) => IjaraError::Unauthorized(e.to_string()),
            TokenError::Signing(msg) => IjaraError::Internal(msg),
        }
    }
}

/// Token type tag carried in the `token_type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived bearer credential.
    Access,
    /// Longer-lived credential exchanged for a new pair.
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// The disjoint principal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityClass {
    /// Student account (phone login).
    Student,
    /// Property renter account (phone login).
    Renter,
    /// Staff account (email login).
    Staff,
}

impl IdentityClass {
    /// Name of the subject claim that identifies this class.
    pub fn subject_claim(&self) -> &'static str {
        match self {
            IdentityClass::Student => "user_id",
            IdentityClass::Renter => "renter_id",
            IdentityClass::Staff => "stuff_id",
        }
    }

    /// Lowercase name used in responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityClass::Student => "student",
            IdentityClass::Renter => "renter",
            IdentityClass::Staff => "staff",
        }
    }
}

/// A verified principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// A student and their gender reference.
    Student {
        /// Student ID.
        user_id: i64,
        /// Jins (gender) ID, used to filter listings.
        jins_id: i64,
    },
    /// A renter.
    Renter {
        /// Renter ID.
        renter_id: i64,
    },
    /// A staff member and their role.
    Staff {
        /// Staff ID.
        stuff_id: i64,
        /// Staff role ID.
        role_id: i64,
    },
}

impl Identity {
    /// The class this identity belongs to.
    pub fn class(&self) -> IdentityClass {
        match self {
            Identity::Student { .. } => IdentityClass::Student,
            Identity::Renter { .. } => IdentityClass::Renter,
            Identity::Staff { .. } => IdentityClass::Staff,
        }
    }

    /// The subject ID, whatever the class.
    pub fn subject_id(&self) -> i64 {
        match *self {
            Identity::Student { user_id, .. } => user_id,
            Identity::Renter { renter_id } => renter_id,
            Identity::Staff { stuff_id, .. } => stuff_id,
        }
    }
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Access or refresh.
    pub token_type: TokenType,
    /// Expiration timestamp (seconds since epoch).
    pub exp: u64,
    /// Issued-at timestamp.
    pub iat: u64,
    /// Unique token identifier.
    pub jti: String,
    /// Student ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Student gender reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jins_id: Option<i64>,
    /// Renter ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renter_id: Option<i64>,
    /// Staff ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stuff_id: Option<i64>,
    /// Staff role ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<i64>,
}

impl Claims {
    /// Build claims for an identity.
    pub fn new(identity: &Identity, token_type: TokenType, iat: u64, exp: u64) -> Self {
        let mut claims = Self {
            token_type,
            exp,
            iat,
            jti: generate_jti(),
            user_id: None,
            jins_id: None,
            renter_id: None,
            stuff_id: None,
            role_id: None,
        };
        match *identity {
            Identity::Student { user_id, jins_id } => {
                claims.user_id = Some(user_id);
                claims.jins_id = Some(jins_id);
            }
            Identity::Renter { renter_id } => {
                claims.renter_id = Some(renter_id);
            }
            Identity::Staff { stuff_id, role_id } => {
                claims.stuff_id = Some(stuff_id);
                claims.role_id = Some(role_id);
            }
        }
        claims
    }

    /// Extract the identity of the given class.
    ///
    /// Fails with `MissingClaim` when the class's subject claim is absent
    /// or zero.
    pub fn identity_as(&self, class: IdentityClass) -> Result<Identity, TokenError> {
        let subject = match class {
            IdentityClass::Student => self.user_id,
            IdentityClass::Renter => self.renter_id,
            IdentityClass::Staff => self.stuff_id,
        }
        .filter(|id| *id > 0)
        .ok_or(TokenError::MissingClaim(class.subject_claim()))?;

        match class {
            IdentityClass::Student => Ok(Identity::Student {
                user_id: subject,
                jins_id: self
                    .jins_id
                    .ok_or_else(|| TokenError::Invalid("student token without jins_id".into()))?,
            }),
            IdentityClass::Renter => Ok(Identity::Renter { renter_id: subject }),
            IdentityClass::Staff => Ok(Identity::Staff {
                stuff_id: subject,
                role_id: self
                    .role_id
                    .ok_or_else(|| TokenError::Invalid("staff token without role_id".into()))?,
            }),
        }
    }

    /// Extract whichever identity the claims carry.
    pub fn identity(&self) -> Result<Identity, TokenError> {
        [
            IdentityClass::Student,
            IdentityClass::Renter,
            IdentityClass::Staff,
        ]
        .into_iter()
        .find_map(|class| match self.identity_as(class) {
            Err(TokenError::MissingClaim(_)) => None,
            other => Some(other),
        })
        .unwrap_or_else(|| Err(TokenError::Invalid("no subject claim".into())))
    }
}

/// Issued token pair.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TokenPair {
    /// Access token (JWT).
    pub access_token: String,
    /// Refresh token (JWT).
    pub refresh_token: String,
    /// Always "bearer".
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Generate a random 128-bit token identifier, URL-safe encoded.
pub fn generate_jti() -> String {
    let bytes: [u8; 16] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Issues and verifies tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenService {
    /// Create a token service.
    pub fn new(secret: &str, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Access token lifetime in seconds.
    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs
    }

    /// Issue an access/refresh pair for an identity.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let now = now_secs();
        let access = Claims::new(
            identity,
            TokenType::Access,
            now,
            now + self.access_ttl_secs,
        );
        let refresh = Claims::new(
            identity,
            TokenType::Refresh,
            now,
            now + self.refresh_ttl_secs,
        );

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            token_type: "bearer".to_string(),
            expires_in: self.access_ttl_secs,
        })
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Decode and check signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    /// Verify a token of the given type and extract the identity of `class`.
    pub fn verify(
        &self,
        token: &str,
        token_type: TokenType,
        class: IdentityClass,
    ) -> Result<Identity, TokenError> {
        let claims = self.decode_typed(token, token_type)?;
        claims.identity_as(class)
    }

    /// Verify a token of the given type, accepting any identity class.
    pub fn verify_any(&self, token: &str, token_type: TokenType) -> Result<Identity, TokenError> {
        let claims = self.decode_typed(token, token_type)?;
        claims.identity()
    }

    /// Exchange a refresh token for a fresh pair carrying the same identity.
    pub fn refresh(&self, refresh_token: &str) -> Result<(Identity, TokenPair), TokenError> {
        let identity = self.verify_any(refresh_token, TokenType::Refresh)?;
        let pair = self.issue_pair(&identity)?;
        Ok((identity, pair))
    }

    fn decode_typed(&self, token: &str, token_type: TokenType) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.token_type != token_type {
            return Err(TokenError::WrongType {
                expected: token_type,
            });
        }
        Ok(claims)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDENT: Identity = Identity::Student {
        user_id: 7,
        jins_id: 1,
    };
    const RENTER: Identity = Identity::Renter { renter_id: 3 };
    const STAFF: Identity = Identity::Staff {
        stuff_id: 2,
        role_id: 1,
    };

    fn service() -> TokenService {
        TokenService::new("test-secret", 1800, 7 * 24 * 3600)
    }

    #[test]
    fn test_issue_and_verify_student() {
        let svc = service();
        let pair = svc.issue_pair(&STUDENT).unwrap();

        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 1800);
        assert_ne!(pair.access_token, pair.refresh_token);

        let identity = svc
            .verify(&pair.access_token, TokenType::Access, IdentityClass::Student)
            .unwrap();
        assert_eq!(identity, STUDENT);
    }

    #[test]
    fn test_claims_shape() {
        let svc = service();
        let pair = svc.issue_pair(&STAFF).unwrap();
        let access = svc.decode(&pair.access_token).unwrap();
        let refresh = svc.decode(&pair.refresh_token).unwrap();

        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(access.stuff_id, Some(2));
        assert_eq!(access.role_id, Some(1));
        assert!(access.user_id.is_none());
        assert_eq!(access.exp - access.iat, 1800);
        assert!(refresh.exp > access.exp);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn test_jti_is_128_bits_url_safe() {
        let jti = generate_jti();
        // 16 bytes -> 22 base64 characters without padding
        assert_eq!(jti.len(), 22);
        assert!(jti
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(generate_jti(), generate_jti());
    }

    #[test]
    fn test_role_scoped_rejection() {
        let svc = service();
        let student = svc.issue_pair(&STUDENT).unwrap();
        let renter = svc.issue_pair(&RENTER).unwrap();

        let err = svc
            .verify(&student.access_token, TokenType::Access, IdentityClass::Renter)
            .unwrap_err();
        assert_eq!(err, TokenError::MissingClaim("renter_id"));

        let err = svc
            .verify(&student.access_token, TokenType::Access, IdentityClass::Staff)
            .unwrap_err();
        assert_eq!(err, TokenError::MissingClaim("stuff_id"));

        let err = svc
            .verify(&renter.access_token, TokenType::Access, IdentityClass::Student)
            .unwrap_err();
        assert_eq!(err, TokenError::MissingClaim("user_id"));
        assert!(matches!(IjaraError::from(err), IjaraError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = service();
        let now = now_secs();
        let claims = Claims::new(&STUDENT, TokenType::Access, now - 7200, now - 3600);
        let token = svc.sign(&claims).unwrap();

        let err = svc
            .verify(&token, TokenType::Access, IdentityClass::Student)
            .unwrap_err();
        assert_eq!(err, TokenError::Expired);
        assert!(matches!(
            IjaraError::from(err),
            IjaraError::ExpiredCredential
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let pair = TokenService::new("secret1", 60, 120)
            .issue_pair(&STUDENT)
            .unwrap();
        let err = TokenService::new("secret2", 60, 120)
            .verify(&pair.access_token, TokenType::Access, IdentityClass::Student)
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        let err = service()
            .verify_any("not.a.jwt", TokenType::Access)
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn test_token_type_enforced() {
        let svc = service();
        let pair = svc.issue_pair(&RENTER).unwrap();

        let err = svc
            .verify(&pair.refresh_token, TokenType::Access, IdentityClass::Renter)
            .unwrap_err();
        assert_eq!(
            err,
            TokenError::WrongType {
                expected: TokenType::Access
            }
        );

        assert!(svc.refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_refresh_keeps_identity() {
        let svc = service();
        let pair = svc.issue_pair(&STAFF).unwrap();
        let (identity, new_pair) = svc.refresh(&pair.refresh_token).unwrap();

        assert_eq!(identity, STAFF);
        let verified = svc
            .verify(&new_pair.access_token, TokenType::Access, IdentityClass::Staff)
            .unwrap();
        assert_eq!(verified, STAFF);
    }

    #[test]
    fn test_verify_any_picks_class() {
        let svc = service();
        for identity in [STUDENT, RENTER, STAFF] {
            let pair = svc.issue_pair(&identity).unwrap();
            let verified = svc.verify_any(&pair.access_token, TokenType::Access).unwrap();
            assert_eq!(verified, identity);
            assert_eq!(verified.class(), identity.class());
        }
    }

    #[test]
    fn test_zero_subject_is_missing() {
        let now = now_secs();
        let claims = Claims::new(
            &Identity::Student {
                user_id: 0,
                jins_id: 1,
            },
            TokenType::Access,
            now,
            now + 60,
        );
        assert_eq!(
            claims.identity_as(IdentityClass::Student),
            Err(TokenError::MissingClaim("user_id"))
        );
    }
}
