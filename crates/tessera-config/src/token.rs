use std::env;
use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TOKEN_DURATION_MINUTES: i64 = 15;

/// Which token maker the service issues and verifies tokens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenScheme {
    /// AES-256-GCM sealed payloads.
    #[default]
    Aead,
    /// HS256 JSON Web Tokens.
    Jwt,
}

impl FromStr for TokenScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aead" | "paseto" | "local" => Ok(TokenScheme::Aead),
            "jwt" | "hs256" => Ok(TokenScheme::Jwt),
            other => Err(format!("unknown token scheme '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct TokenConfig {
    pub signing_key: Vec<u8>,
    pub token_duration: Duration,
    pub scheme: TokenScheme,
}

impl TokenConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing_key = lookup("TOKEN_SYMMETRIC_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing("TOKEN_SYMMETRIC_KEY"))?
            .into_bytes();

        let token_duration = match lookup("TOKEN_DURATION_MINUTES") {
            Some(raw) => {
                let minutes: i64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "TOKEN_DURATION_MINUTES",
                    reason: format!("'{raw}' is not a whole number of minutes"),
                })?;
                if minutes <= 0 {
                    return Err(ConfigError::Invalid {
                        var: "TOKEN_DURATION_MINUTES",
                        reason: "must be positive".to_string(),
                    });
                }
                Duration::try_minutes(minutes).ok_or_else(|| ConfigError::Invalid {
                    var: "TOKEN_DURATION_MINUTES",
                    reason: format!("{minutes} minutes is out of range"),
                })?
            }
            None => Duration::minutes(DEFAULT_TOKEN_DURATION_MINUTES),
        };

        let scheme = match lookup("TOKEN_SCHEME") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: "TOKEN_SCHEME",
                reason,
            })?,
            None => TokenScheme::default(),
        };

        Ok(Self {
            signing_key,
            token_duration,
            scheme,
        })
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"***redacted***")
            .field("token_duration", &self.token_duration)
            .field("scheme", &self.scheme)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let result = TokenConfig::from_lookup(lookup_from(&[]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::Missing("TOKEN_SYMMETRIC_KEY")
        );
    }

    #[test]
    fn test_empty_key_is_fatal() {
        let result = TokenConfig::from_lookup(lookup_from(&[("TOKEN_SYMMETRIC_KEY", "")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_to_fifteen_minutes() {
        let config = TokenConfig::from_lookup(lookup_from(&[(
            "TOKEN_SYMMETRIC_KEY",
            "12345678901234567890123456789012",
        )]))
        .unwrap();
        assert_eq!(config.token_duration, Duration::minutes(15));
        assert_eq!(config.scheme, TokenScheme::Aead);
    }

    #[test]
    fn test_custom_duration_and_scheme() {
        let config = TokenConfig::from_lookup(lookup_from(&[
            ("TOKEN_SYMMETRIC_KEY", "12345678901234567890123456789012"),
            ("TOKEN_DURATION_MINUTES", "60"),
            ("TOKEN_SCHEME", "jwt"),
        ]))
        .unwrap();
        assert_eq!(config.token_duration, Duration::minutes(60));
        assert_eq!(config.scheme, TokenScheme::Jwt);
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        for raw in ["0", "-5", "soon"] {
            let result = TokenConfig::from_lookup(lookup_from(&[
                ("TOKEN_SYMMETRIC_KEY", "12345678901234567890123456789012"),
                ("TOKEN_DURATION_MINUTES", raw),
            ]));
            assert!(matches!(
                result,
                Err(ConfigError::Invalid {
                    var: "TOKEN_DURATION_MINUTES",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_out_of_range_duration_rejected() {
        let raw = i64::MAX.to_string();
        let result = TokenConfig::from_lookup(lookup_from(&[
            ("TOKEN_SYMMETRIC_KEY", "12345678901234567890123456789012"),
            ("TOKEN_DURATION_MINUTES", raw.as_str()),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                var: "TOKEN_DURATION_MINUTES",
                ..
            })
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = TokenConfig::from_lookup(lookup_from(&[(
            "TOKEN_SYMMETRIC_KEY",
            "super-secret-key-material-000000",
        )]))
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }
}
