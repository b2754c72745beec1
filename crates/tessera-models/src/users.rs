//! User records and the bodies of the `UserService` operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_auth::Role;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::{validate_name, validate_user_id};

/// A user as stored.
///
/// `hashed_password` never leaves the process: it is skipped on serialization
/// and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("hashed_password", &"[REDACTED]")
            .field("password_changed_at", &self.password_changed_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    /// Decimal string of the numeric user id.
    #[schema(example = "42")]
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            password_changed_at: user.password_changed_at,
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id.to_string(),
            name: user.name,
            email: user.email,
            role: user.role,
            password_changed_at: user.password_changed_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validate_name"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[validate(
        length(min = 3, max = 200, message = "email must be between 3 and 200 characters"),
        email(message = "email must be a valid address")
    )]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 100,
        message = "password must be between 6 and 100 characters"
    ))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginUserRequest {
    #[validate(
        length(min = 3, max = 200, message = "email must be between 3 and 200 characters"),
        email(message = "email must be a valid address")
    )]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 100,
        message = "password must be between 6 and 100 characters"
    ))]
    pub password: String,
}

/// Renames the user identified by `email`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 3, max = 200, message = "email must be between 3 and 200 characters"),
        email(message = "email must be a valid address")
    )]
    pub email: String,
    #[validate(custom(function = "validate_name"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DeleteUserRequest {
    #[validate(
        length(min = 3, max = 200, message = "email must be between 3 and 200 characters"),
        email(message = "email must be a valid address")
    )]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GetUserRequest {
    #[validate(custom(function = "validate_user_id"))]
    #[schema(example = "42")]
    pub user_id: String,
}

impl GetUserRequest {
    /// The numeric id, once the request has passed validation.
    pub fn id(&self) -> Option<i64> {
        self.user_id.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginUserResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteUserResponse {
    pub success: bool,
}
