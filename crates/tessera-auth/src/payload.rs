//! Token payload and the closed set of roles it can carry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::TokenError;

/// Access tier of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Standard, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Role::Standard),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Claims sealed inside every token.
///
/// Fields are private so `expires_at` can only ever be derived from
/// `issued_at` plus a positive duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    id: Uuid,
    subject: String,
    role: Role,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TokenPayload {
    /// Builds a payload issued now.
    pub fn new(subject: &str, role: Role, duration: Duration) -> Result<Self, TokenError> {
        Self::issue_at(subject, role, duration, Utc::now())
    }

    /// Builds a payload issued at `now`.
    pub fn issue_at(
        subject: &str,
        role: Role,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, TokenError> {
        if duration <= Duration::zero() {
            return Err(TokenError::InvalidDuration);
        }
        let expires_at = now
            .checked_add_signed(duration)
            .ok_or(TokenError::InvalidDuration)?;

        Ok(Self {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            role,
            issued_at: now,
            expires_at,
        })
    }

    pub(crate) fn from_parts(
        id: Uuid,
        subject: String,
        role: Role,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, TokenError> {
        Self {
            id,
            subject,
            role,
            issued_at,
            expires_at,
        }
        .ensure_well_formed()
    }

    /// Rejects a payload whose expiry does not follow its issuance.
    pub(crate) fn ensure_well_formed(self) -> Result<Self, TokenError> {
        if self.expires_at <= self.issued_at {
            return Err(TokenError::InvalidToken);
        }
        Ok(self)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A payload is valid only while `now < expires_at`.
    pub fn check_valid_at(&self, now: DateTime<Utc>) -> Result<(), TokenError> {
        if now < self.expires_at {
            Ok(())
        } else {
            Err(TokenError::ExpiredToken)
        }
    }
}
