//! HS256 JWT token maker.
//!
//! An alternative to the AEAD codec for deployments that need tokens other
//! services can inspect. Claims are signed, not encrypted. JWT timestamps have
//! one-second resolution, so issuance time is truncated to whole seconds and
//! the expiry boundary is checked by the maker rather than by `jsonwebtoken`.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::SigningKey;
use crate::error::TokenError;
use crate::maker::TokenMaker;
use crate::payload::{Role, TokenPayload};

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    jti: Uuid,
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
}

impl From<&TokenPayload> for JwtClaims {
    fn from(payload: &TokenPayload) -> Self {
        Self {
            jti: payload.id(),
            sub: payload.subject().to_string(),
            role: payload.role(),
            iat: payload.issued_at().timestamp(),
            exp: payload.expires_at().timestamp(),
        }
    }
}

impl TryFrom<JwtClaims> for TokenPayload {
    type Error = TokenError;

    fn try_from(claims: JwtClaims) -> Result<Self, Self::Error> {
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::InvalidToken)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::InvalidToken)?;
        TokenPayload::from_parts(claims.jti, claims.sub, claims.role, issued_at, expires_at)
    }
}

pub struct JwtMaker {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtMaker {
    /// The secret must be exactly [`KEY_LENGTH`](crate::codec::KEY_LENGTH) bytes,
    /// the same requirement the AEAD maker has.
    pub fn new<B>(secret: B) -> Result<Self, TokenError>
    where
        B: AsRef<[u8]>,
    {
        let key = SigningKey::from_bytes(secret)?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
        })
    }
}

impl std::fmt::Debug for JwtMaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtMaker")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl TokenMaker for JwtMaker {
    fn create_token(
        &self,
        subject: &str,
        role: Role,
        duration: Duration,
    ) -> Result<(String, TokenPayload), TokenError> {
        let now = Utc::now().trunc_subsecs(0);
        let payload = TokenPayload::issue_at(subject, role, duration, now)?;
        let claims = JwtClaims::from(&payload);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        tracing::debug!(token_id = %payload.id(), role = %payload.role(), "Issued token");

        Ok((token, payload))
    }

    fn verify_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPayload, TokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::TamperedToken,
                _ => TokenError::InvalidToken,
            },
        )?;

        let payload = TokenPayload::try_from(data.claims)?;
        payload.check_valid_at(now)?;
        Ok(payload)
    }
}
