//! # Tessera DB
//!
//! User storage for the Tessera user service.
//!
//! Handlers only see the [`UserRepository`] trait. [`PgUserRepository`] backs it
//! with PostgreSQL through SQLx; [`InMemoryUserRepository`] keeps records in a
//! process-local map for tests and for running without a database.
//!
//! # Example
//!
//! ```ignore
//! use tessera_db::{init_db_pool, migrate, PgUserRepository};
//!
//! let pool = init_db_pool(&database_url).await?;
//! migrate(&pool).await?;
//! let repo = PgUserRepository::new(pool);
//! ```

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryUserRepository;
pub use postgres::{PgUserRepository, init_db_pool, migrate};
pub use repository::{
    CreateUserParams, RepositoryError, UserRepository, password_never_changed,
};
