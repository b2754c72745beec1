use anyhow::Context;
use clap::Parser;
use tessera::cli::{Cli, Commands, create_admin};
use tessera::logging::{init_tracing, shutdown_tracer};
use tessera::metrics::{init_metrics, metrics_app, set_observability_enabled};
use tessera::router::init_router;
use tessera::state::{init_app_state, init_user_repository};
use tessera::utils::mask_email;
use tessera_config::{ServerConfig, TokenConfig};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;
    set_observability_enabled(server_config.observability_enabled);

    match cli.command {
        Commands::Serve => serve(server_config).await,
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => handle_create_admin(server_config, name, email, password).await,
    }
}

async fn serve(server_config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&server_config).context("Failed to initialize tracing")?;

    let token_config = TokenConfig::from_env().context("Invalid token configuration")?;
    let metrics_handle = init_metrics().context("Failed to install metrics recorder")?;
    let state = init_app_state(&server_config, &token_config).await?;
    let app = init_router(state);

    if let Some(handle) = metrics_handle {
        let metrics_addr = format!("{}:{}", server_config.host, server_config.metrics_port);
        let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
            .await
            .with_context(|| format!("Failed to bind metrics listener on {metrics_addr}"))?;
        info!(address = %metrics_addr, "Prometheus metrics available at /metrics");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(
        address = %address,
        environment = server_config.environment.as_str(),
        scheme = ?token_config.scheme,
        "Tessera UserService listening"
    );
    info!("Swagger UI available at http://{}/swagger-ui", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}

async fn handle_create_admin(
    server_config: ServerConfig,
    name: String,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    if server_config.database_url.is_none() {
        anyhow::bail!("create-admin needs DATABASE_URL; the in-memory store does not outlive this command");
    }

    let repo = init_user_repository(&server_config).await?;
    let user = create_admin(
        repo.as_ref(),
        &name,
        &email,
        &password,
        server_config.bcrypt_cost,
    )
    .await?;

    println!("Admin created successfully");
    println!("   Id: {}", user.id);
    println!("   Email: {}", mask_email(&user.email));
    println!("   Name: {}", user.name);
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
