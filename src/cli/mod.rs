//! Command line interface of the `tessera` binary.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tessera_db::{CreateUserParams, RepositoryError, UserRepository};
use tessera_models::{CreateUserRequest, Role, User};
use validator::Validate;

use crate::utils::password::hash_password;

#[derive(Debug, Parser)]
#[command(name = "tessera")]
#[command(about = "Tessera - user service with per-operation role checks", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file instead of `.env`
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the RPC server
    Serve,
    /// Create an administrator account directly in the user store
    CreateAdmin {
        /// Display name of the administrator
        #[arg(short = 'n', long)]
        name: String,

        /// Email address
        #[arg(short = 'e', long)]
        email: String,

        /// Password
        #[arg(short = 'p', long, env = "TESSERA_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// Stores a new admin after applying the same field rules as `CreateUser`.
pub async fn create_admin(
    repo: &dyn UserRepository,
    name: &str,
    email: &str,
    password: &str,
    bcrypt_cost: u32,
) -> anyhow::Result<User> {
    let request = CreateUserRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    if let Err(errors) = request.validate() {
        bail!("Invalid administrator details: {errors}");
    }

    let hashed_password = hash_password(request.password, bcrypt_cost)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e.error))?;

    match repo
        .create_user(CreateUserParams {
            name: request.name,
            email: request.email,
            role: Role::Admin,
            hashed_password,
        })
        .await
    {
        Ok(user) => Ok(user),
        Err(RepositoryError::AlreadyExists) => bail!("User with this email already exists"),
        Err(e) => Err(e).context("Failed to store administrator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_db::InMemoryUserRepository;

    #[test]
    fn test_parse_create_admin() {
        let cli = Cli::try_parse_from([
            "tessera",
            "--env-file",
            "prod.env",
            "create-admin",
            "--name",
            "Root Admin",
            "--email",
            "root@x.com",
            "--password",
            "secret1",
        ])
        .unwrap();

        assert_eq!(cli.env_file, Some(PathBuf::from("prod.env")));
        match cli.command {
            Commands::CreateAdmin { name, email, .. } => {
                assert_eq!(name, "Root Admin");
                assert_eq!(email, "root@x.com");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["tessera", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve));
    }

    #[tokio::test]
    async fn test_create_admin_stores_admin() {
        let repo = InMemoryUserRepository::new();
        let user = create_admin(&repo, "Root Admin", "root@x.com", "secret1", 4 /* bcrypt minimum cost */)
            .await
            .unwrap();

        assert_eq!(user.role, Role::Admin);
        assert_ne!(user.hashed_password, "secret1");

        let err = create_admin(&repo, "Root Admin", "root@x.com", "secret1", 4 /* bcrypt minimum cost */)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_create_admin_validates_input() {
        let repo = InMemoryUserRepository::new();
        let result = create_admin(&repo, "R2", "not-an-email", "123", 4 /* bcrypt minimum cost */).await;
        assert!(result.is_err());
        assert!(repo.is_empty().await);
    }
}
