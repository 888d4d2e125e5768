//! Error types for ijara.

use thiserror::Error;

/// Common error type for ijara.
#[derive(Error, Debug)]
pub enum IjaraError {
    /// Database error.
    ///
    /// Errors from sqlx that are not mapped to a more specific variant
    /// end up here.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error (image storage, log files, config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (bad phone/password pair).
    #[error("authentication error: {0}")]
    Auth(String),

    /// The presented credential is past its expiry.
    #[error("credential has expired")]
    ExpiredCredential,

    /// The presented credential has a bad signature or structure.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The credential is valid but lacks the claim required here.
    #[error("not allowed: {0}")]
    Unauthorized(String),

    /// Two values that must agree do not (e.g. password confirmation).
    #[error("{0} do not match")]
    ValidationMismatch(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// More than one row matched where a unique row was expected.
    ///
    /// Not raised by the current repositories: every single-row lookup
    /// goes through a UNIQUE column.
    #[error("multiple {0} found")]
    MultipleResultsAmbiguous(String),

    /// Unique constraint violation.
    #[error("{0} already exists")]
    Conflict(String),

    /// SMS delivery error.
    #[error("SMS error: {0}")]
    Sms(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IjaraError {
    /// Translate a sqlx error, recognising constraint violations.
    ///
    /// `what` names the entity the statement was operating on and is used
    /// in the resulting message.
    pub fn from_sqlx(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return IjaraError::Conflict(what.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return IjaraError::Validation(format!("{what} references a missing record"));
            }
            if db_err.is_check_violation() {
                return IjaraError::Validation(format!("{what} is out of range"));
            }
        }
        IjaraError::Database(e.to_string())
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for IjaraError {
    fn from(e: sqlx::Error) -> Self {
        IjaraError::Database(e.to_string())
    }
}

/// Result type alias for ijara operations.
pub type Result<T> = std::result::Result<T, IjaraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = IjaraError::Auth("invalid password".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid password");
    }

    #[test]
    fn test_mismatch_error_display() {
        let err = IjaraError::ValidationMismatch("passwords".to_string());
        assert_eq!(err.to_string(), "passwords do not match");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = IjaraError::NotFound("rent".to_string());
        assert_eq!(err.to_string(), "rent not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = IjaraError::Conflict("phone".to_string());
        assert_eq!(err.to_string(), "phone already exists");
    }

    #[test]
    fn test_credential_errors_display() {
        assert_eq!(
            IjaraError::ExpiredCredential.to_string(),
            "credential has expired"
        );
        assert_eq!(
            IjaraError::Unauthorized("user_id claim missing".to_string()).to_string(),
            "not allowed: user_id claim missing"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: IjaraError = io_err.into();
        assert!(matches!(err, IjaraError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_sqlx_plain_error() {
        let err = IjaraError::from_sqlx(sqlx::Error::RowNotFound, "rent");
        assert!(matches!(err, IjaraError::Database(_)));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(IjaraError::Auth("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
