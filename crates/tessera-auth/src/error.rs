use thiserror::Error;

/// Failures of token issuance and verification.
///
/// None of these messages are meant for the network caller; the authorization
/// gate folds every verification failure into a single unauthenticated answer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token duration must be positive")]
    InvalidDuration,
    #[error("token is malformed")]
    InvalidToken,
    #[error("token failed its integrity check")]
    TamperedToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("failed to encode token payload: {0}")]
    Encoding(String),
    #[error("invalid signing key: expected {expected} bytes, got {actual}")]
    InvalidKey { expected: usize, actual: usize },
}
