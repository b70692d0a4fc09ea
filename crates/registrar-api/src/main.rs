//! Registrar API Server

use std::sync::Arc;

use registrar_api::auth::{AccountRepository, InMemoryAccountRepository, PgAccountRepository};
use registrar_api::{create_router, state::AppState};
use registrar_core::config::{LoggingConfig, DEV_JWT_SECRET};
use registrar_core::AppConfig;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &logging.level;
        EnvFilter::new(format!(
            "registrar_api={level},registrar_core={level},audit=info,tower_http=info"
        ))
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    if config.auth.jwt_secret == DEV_JWT_SECRET {
        tracing::warn!("JWT_SECRET not set; using the development signing secret");
    }

    let accounts: Arc<dyn AccountRepository> = match &config.database.url {
        Some(url) => {
            let repo = PgAccountRepository::connect(url, config.database.max_connections).await?;
            repo.ensure_schema().await?;
            tracing::info!("Connected to PostgreSQL");
            Arc::new(repo)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; accounts are kept in memory and lost on exit");
            Arc::new(InMemoryAccountRepository::new())
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.server.environment;

    // Create application state
    let state = Arc::new(AppState::new(config, accounts)?);
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        environment = environment.as_str(),
        "Registrar API listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
