//! Token issuance and verification.
//!
//! [`TokenMaker`] is the only authority that creates or accepts credentials. The
//! authorization gate and the handlers hold it as `Arc<dyn TokenMaker>`, so the
//! signing scheme can change without touching them.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tessera_config::{TokenConfig, TokenScheme};

use crate::codec::{self, SigningKey};
use crate::error::TokenError;
use crate::jwt::JwtMaker;
use crate::payload::{Role, TokenPayload};

pub trait TokenMaker: Send + Sync {
    /// Issues a token for `subject` valid for `duration` from now.
    ///
    /// Returns the payload alongside the token so callers can report
    /// `expires_at` without decoding what they just produced.
    fn create_token(
        &self,
        subject: &str,
        role: Role,
        duration: Duration,
    ) -> Result<(String, TokenPayload), TokenError>;

    /// Verifies `token` as of `now`.
    fn verify_token_at(&self, token: &str, now: DateTime<Utc>)
    -> Result<TokenPayload, TokenError>;

    fn verify_token(&self, token: &str) -> Result<TokenPayload, TokenError> {
        self.verify_token_at(token, Utc::now())
    }
}

/// Token maker backed by the AES-256-GCM [`codec`].
#[derive(Debug, Clone)]
pub struct SymmetricTokenMaker {
    key: SigningKey,
}

impl SymmetricTokenMaker {
    pub fn new<B>(key: B) -> Result<Self, TokenError>
    where
        B: AsRef<[u8]>,
    {
        Ok(Self {
            key: SigningKey::from_bytes(key)?,
        })
    }
}

impl TokenMaker for SymmetricTokenMaker {
    fn create_token(
        &self,
        subject: &str,
        role: Role,
        duration: Duration,
    ) -> Result<(String, TokenPayload), TokenError> {
        let payload = TokenPayload::new(subject, role, duration)?;
        let token = codec::encode(&payload, &self.key)?;
        tracing::debug!(token_id = %payload.id(), role = %payload.role(), "Issued token");
        Ok((token, payload))
    }

    fn verify_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPayload, TokenError> {
        let payload = codec::decode(token, &self.key)?;
        payload.check_valid_at(now)?;
        Ok(payload)
    }
}

/// Builds the token maker selected by `config.scheme`.
///
/// Fails when the configured key does not have the required length, which the
/// caller treats as a fatal startup error.
pub fn token_maker_from_config(config: &TokenConfig) -> Result<Arc<dyn TokenMaker>, TokenError> {
    let maker: Arc<dyn TokenMaker> = match config.scheme {
        TokenScheme::Aead => Arc::new(SymmetricTokenMaker::new(&config.signing_key)?),
        TokenScheme::Jwt => Arc::new(JwtMaker::new(&config.signing_key)?),
    };
    Ok(maker)
}
