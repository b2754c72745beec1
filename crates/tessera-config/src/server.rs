use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// bcrypt's own default work factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "production" | "prod" | "staging" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    /// In-memory storage is used when unset.
    pub database_url: Option<String>,
    pub environment: Environment,
    pub bcrypt_cost: u32,
    /// Per-operation access overrides, e.g. `GetUser=admin|standard;CreateUser=public`.
    pub role_overrides: Option<String>,
    pub observability_enabled: bool,
    pub otlp_endpoint: String,
    pub log_dir: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            metrics_port: parse_or(&lookup, "METRICS_PORT", 9090)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            environment: match lookup("ENVIRONMENT") {
                Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                    var: "ENVIRONMENT",
                    reason,
                })?,
                None => Environment::default(),
            },
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
            role_overrides: lookup("RPC_ROLE_OVERRIDES").filter(|raw| !raw.trim().is_empty()),
            observability_enabled: lookup("OBSERVABILITY_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|| "http://localhost:4317".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "storage/logs".to_string()),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("'{raw}' could not be parsed"),
        }),
        None => Ok(default),
    }
}
