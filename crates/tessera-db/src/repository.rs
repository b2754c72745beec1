use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tessera_models::{Role, User};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("user not found")]
    NotFound,
    #[error("user with this email already exists")]
    AlreadyExists,
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    /// The store could not be reached, as opposed to rejecting the operation.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RepositoryError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

/// 0001-01-01T00:00:00Z in seconds since the Unix epoch.
const NEVER_CHANGED_SECS: i64 = -62_135_596_800;

/// `password_changed_at` of a user who never changed their password.
///
/// Same instant as the column default in the users migration.
pub fn password_never_changed() -> DateTime<Utc> {
    DateTime::from_timestamp(NEVER_CHANGED_SECS, 0).unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub hashed_password: String,
}

/// Storage operations the user service needs.
///
/// Emails are unique. Lookups and mutations keyed by email or id return
/// [`RepositoryError::NotFound`] when no record matches.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<User, RepositoryError>;

    async fn find_user_by_id(&self, id: i64) -> Result<User, RepositoryError>;

    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError>;

    async fn update_user_name(&self, email: &str, name: &str) -> Result<User, RepositoryError>;

    async fn delete_user_by_email(&self, email: &str) -> Result<(), RepositoryError>;
}
