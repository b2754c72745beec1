use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use tessera_auth::{TokenMaker, token_maker_from_config};
use tessera_config::{ServerConfig, TokenConfig};
use tessera_db::{InMemoryUserRepository, PgUserRepository, UserRepository, init_db_pool, migrate};
use tracing::{info, warn};

use crate::metrics::{MetricsSink, PrometheusSink};
use crate::middleware::gate::AuthorizationGate;
use crate::middleware::policy::RoleTable;

pub use tessera_config::server::DEFAULT_BCRYPT_COST;

/// Shared handles every call needs.
///
/// Everything here is immutable after startup and cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub token_maker: Arc<dyn TokenMaker>,
    pub gate: AuthorizationGate,
    pub role_table: Arc<RoleTable>,
    pub token_duration: Duration,
    pub bcrypt_cost: u32,
    pub metrics: Arc<dyn MetricsSink>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        token_maker: Arc<dyn TokenMaker>,
        token_duration: Duration,
    ) -> Self {
        Self {
            users,
            gate: AuthorizationGate::new(Arc::clone(&token_maker)),
            token_maker,
            role_table: Arc::new(RoleTable::default()),
            token_duration,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            metrics: Arc::new(PrometheusSink),
        }
    }

    pub fn with_role_table(mut self, role_table: RoleTable) -> Self {
        self.role_table = Arc::new(role_table);
        self
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Opens the configured user store.
///
/// PostgreSQL when `DATABASE_URL` is set (migrations are applied), otherwise a
/// process-local store whose contents are lost on exit.
pub async fn init_user_repository(
    server_config: &ServerConfig,
) -> anyhow::Result<Arc<dyn UserRepository>> {
    match &server_config.database_url {
        Some(url) => {
            let pool = init_db_pool(url)
                .await
                .context("Failed to connect to database")?;
            migrate(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Using PostgreSQL user store");
            Ok(Arc::new(PgUserRepository::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, users are kept in memory and lost on shutdown");
            Ok(Arc::new(InMemoryUserRepository::new()))
        }
    }
}

pub async fn init_app_state(
    server_config: &ServerConfig,
    token_config: &TokenConfig,
) -> anyhow::Result<AppState> {
    let token_maker =
        token_maker_from_config(token_config).context("Failed to build token maker")?;

    let mut role_table = RoleTable::default();
    if let Some(overrides) = &server_config.role_overrides {
        role_table = role_table
            .apply_overrides(overrides)
            .context("Invalid RPC_ROLE_OVERRIDES")?;
        info!(overrides = %overrides, "Applied role table overrides");
    }

    let users = init_user_repository(server_config).await?;

    Ok(
        AppState::new(users, token_maker, token_config.token_duration)
            .with_role_table(role_table)
            .with_bcrypt_cost(server_config.bcrypt_cost),
    )
}
