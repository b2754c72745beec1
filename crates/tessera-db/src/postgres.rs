use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tessera_models::{Role, User};
use tracing::instrument;

use crate::repository::{CreateUserParams, RepositoryError, UserRepository};

const USER_COLUMNS: &str =
    "id, name, email, role, hashed_password, password_changed_at, created_at";

/// Connects to PostgreSQL.
///
/// The returned pool is cheaply cloneable; call once at startup.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Applies the embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: String,
    hashed_password: String,
    password_changed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(RepositoryError::Corrupt)?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            hashed_password: row.hashed_password,
            password_changed_at: row.password_changed_at,
            created_at: row.created_at,
        })
    }
}

fn not_found_or(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        other => RepositoryError::Database(other),
    }
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, params), fields(role = %params.role))]
    async fn create_user(&self, params: CreateUserParams) -> Result<User, RepositoryError> {
        let query = format!(
            "INSERT INTO users (name, email, role, hashed_password) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&params.name)
            .bind(&params.email)
            .bind(params.role.as_str())
            .bind(&params.hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::AlreadyExists;
                }
                RepositoryError::Database(e)
            })?;

        User::try_from(row)
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: i64) -> Result<User, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or)?;

        User::try_from(row)
    }

    #[instrument(skip(self, email))]
    async fn find_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or)?;

        User::try_from(row)
    }

    #[instrument(skip(self, email, name))]
    async fn update_user_name(&self, email: &str, name: &str) -> Result<User, RepositoryError> {
        let query =
            format!("UPDATE users SET name = $2 WHERE email = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or)?;

        User::try_from(row)
    }

    #[instrument(skip(self, email))]
    async fn delete_user_by_email(&self, email: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
