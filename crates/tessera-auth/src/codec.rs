//! Symmetric token codec.
//!
//! A token is the JSON payload sealed with AES-256-GCM under the service key:
//!
//! ```text
//! v1.local.<base64url(nonce[12] || ciphertext || tag[16])>
//! ```
//!
//! The version prefix is bound as associated data, so a token cannot be replayed
//! under a different header. Every call draws a fresh random nonce, which makes
//! two encodings of the same payload differ. Decoding authenticates and decrypts
//! but never looks at expiry; that is the token maker's concern.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::TokenError;
use crate::payload::TokenPayload;

pub const KEY_LENGTH: usize = 32;
pub const NONCE_LENGTH: usize = 12;
pub const TAG_LENGTH: usize = 16;
pub const TOKEN_PREFIX: &str = "v1.local.";

/// The service's symmetric secret. Zeroed on drop, never printed.
#[derive(Clone)]
pub struct SigningKey(Zeroizing<[u8; KEY_LENGTH]>);

impl SigningKey {
    pub fn from_bytes<B>(bytes: B) -> Result<Self, TokenError>
    where
        B: AsRef<[u8]>,
    {
        let slice = bytes.as_ref();
        if slice.len() != KEY_LENGTH {
            return Err(TokenError::InvalidKey {
                expected: KEY_LENGTH,
                actual: slice.len(),
            });
        }
        let mut array = [0u8; KEY_LENGTH];
        array.copy_from_slice(slice);
        Ok(Self(Zeroizing::new(array)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.0.as_slice()))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("bytes", &"***redacted***")
            .finish()
    }
}

pub fn encode(payload: &TokenPayload, key: &SigningKey) -> Result<String, TokenError> {
    let plaintext =
        serde_json::to_vec(payload).map_err(|e| TokenError::Encoding(e.to_string()))?;
    seal(&plaintext, key)
}

fn seal(plaintext: &[u8], key: &SigningKey) -> Result<String, TokenError> {
    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);

    let mut sealed = key
        .cipher()
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: TOKEN_PREFIX.as_bytes(),
            },
        )
        .map_err(|_| TokenError::Encoding("encryption failure".to_string()))?;

    let mut body = Vec::with_capacity(NONCE_LENGTH + sealed.len());
    body.extend_from_slice(&nonce_bytes);
    body.append(&mut sealed);

    Ok(format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(body)))
}

pub fn decode(token: &str, key: &SigningKey) -> Result<TokenPayload, TokenError> {
    let encoded = token
        .strip_prefix(TOKEN_PREFIX)
        .ok_or(TokenError::InvalidToken)?;
    let body = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| TokenError::InvalidToken)?;

    if body.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(TokenError::InvalidToken);
    }
    let (nonce_bytes, sealed) = body.split_at(NONCE_LENGTH);

    let plaintext = key
        .cipher()
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: sealed,
                aad: TOKEN_PREFIX.as_bytes(),
            },
        )
        .map_err(|_| TokenError::TamperedToken)?;

    serde_json::from_slice::<TokenPayload>(&plaintext)
        .map_err(|_| TokenError::InvalidToken)?
        .ensure_well_formed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Role;
    use chrono::Duration;

    fn test_key(fill: u8) -> SigningKey {
        SigningKey::from_bytes([fill; KEY_LENGTH]).unwrap()
    }

    fn test_payload() -> TokenPayload {
        TokenPayload::new("a@x.com", Role::Standard, Duration::minutes(15)).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let key = test_key(7);
        for role in Role::ALL {
            let payload =
                TokenPayload::new("someone@example.com", role, Duration::hours(2)).unwrap();
            let token = encode(&payload, &key).unwrap();
            assert!(token.starts_with(TOKEN_PREFIX));
            assert_eq!(decode(&token, &key).unwrap(), payload);
        }
    }

    #[test]
    fn test_fresh_nonce_per_encoding() {
        let key = test_key(7);
        let payload = test_payload();
        let a = encode(&payload, &key).unwrap();
        let b = encode(&payload, &key).unwrap();
        assert_ne!(a, b);
        assert_eq!(decode(&a, &key).unwrap(), decode(&b, &key).unwrap());
    }

    #[test]
    fn test_payload_is_not_readable() {
        let key = test_key(7);
        let token = encode(&test_payload(), &key).unwrap();
        let body = URL_SAFE_NO_PAD
            .decode(token.strip_prefix(TOKEN_PREFIX).unwrap())
            .unwrap();
        let as_text = String::from_utf8_lossy(&body);
        assert!(!as_text.contains("a@x.com"));
        assert!(!as_text.contains("standard"));
    }

    #[test]
    fn test_flipping_any_byte_is_rejected() {
        let key = test_key(7);
        let token = encode(&test_payload(), &key).unwrap();
        let bytes = token.as_bytes();

        for i in 0..bytes.len() {
            let mut tampered = bytes.to_vec();
            tampered[i] ^= 0x01;
            let Ok(tampered) = String::from_utf8(tampered) else {
                continue;
            };
            let result = decode(&tampered, &key);
            assert!(
                matches!(
                    result,
                    Err(TokenError::InvalidToken) | Err(TokenError::TamperedToken)
                ),
                "byte {i} flip was accepted: {result:?}"
            );
        }
    }

    #[test]
    fn test_cross_key_isolation() {
        let token = encode(&test_payload(), &test_key(1)).unwrap();
        assert_eq!(
            decode(&token, &test_key(2)).unwrap_err(),
            TokenError::TamperedToken
        );
    }

    #[test]
    fn test_malformed_tokens_are_invalid() {
        let key = test_key(7);
        for token in [
            "",
            "not-a-token",
            "v1.local.",
            "v1.local.!!!!",
            "v1.local.AAAA",
            "v2.local.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        ] {
            assert_eq!(decode(token, &key).unwrap_err(), TokenError::InvalidToken);
        }
    }

    #[test]
    fn test_authentic_but_inverted_lifetime_is_invalid() {
        let key = test_key(7);
        let plaintext = serde_json::json!({
            "id": uuid::Uuid::new_v4(),
            "subject": "a@x.com",
            "role": "admin",
            "issued_at": "2030-01-01T00:00:00Z",
            "expires_at": "2020-01-01T00:00:00Z",
        });
        let token = seal(&serde_json::to_vec(&plaintext).unwrap(), &key).unwrap();

        assert_eq!(decode(&token, &key).unwrap_err(), TokenError::InvalidToken);
    }

    #[test]
    fn test_decode_ignores_expiry() {
        let key = test_key(7);
        let issued = chrono::Utc::now() - Duration::hours(3);
        let payload =
            TokenPayload::issue_at("a@x.com", Role::Admin, Duration::minutes(1), issued).unwrap();
        let token = encode(&payload, &key).unwrap();
        assert_eq!(decode(&token, &key).unwrap(), payload);
    }

    #[test]
    fn test_key_length_enforced() {
        assert_eq!(
            SigningKey::from_bytes(b"too-short").unwrap_err(),
            TokenError::InvalidKey {
                expected: KEY_LENGTH,
                actual: 9
            }
        );
        assert!(SigningKey::from_bytes([0u8; 33]).is_err());
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let debug = format!("{:?}", test_key(0x41));
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("65"));
    }
}
