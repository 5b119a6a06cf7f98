// ABOUTME: CloudTrain server assembly
// ABOUTME: Wires configuration, storage, permission checks and HTTP layers into a running server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cloudtrain_api::AppState;
use cloudtrain_security::{
    GrantedPermissionsClient, IdentityTokenValidator, UserPermissionVerifier,
};
use cloudtrain_storage::GenericRepository;
use cloudtrain_tasks::{Task, TaskManagement};

pub mod api;
pub mod config;

pub use config::{Config, ConfigError};

const DEFAULT_LOG_FILTER: &str = "info,cloudtrain=debug";

/// Install the global tracing subscriber, honouring `RUST_LOG` when set
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Full application router: task routes, health probes, CORS and request tracing
pub fn build_app(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::LOCATION]);

    Ok(api::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Connect to the database, run migrations and build the shared handler state
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = cloudtrain_storage::init(&config.database_url, config.db_max_connections)
        .await
        .context("failed to initialize database")?;

    let permissions = GrantedPermissionsClient::new(
        config.granted_permissions_url()?,
        config.http_request_timeout,
        config.http_connect_timeout,
    )?;
    let tokens =
        IdentityTokenValidator::new(config.jwt_secret()?.as_bytes(), config.jwt_issuer.as_deref());

    let repository = Arc::new(GenericRepository::new(pool).with_entity::<Task>());
    let tasks = TaskManagement::new(
        repository,
        UserPermissionVerifier::new(Arc::new(permissions)),
    );

    Ok(AppState::new(tasks, tokens))
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    api::health::mark_started();

    let state = build_state(&config).await?;
    let app = build_app(state, &config.cors_origin)?;

    let addr = SocketAddr::new(config.host, config.port);
    info!("CORS origin: {}", config.cors_origin);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Apply pending schema migrations and exit
pub async fn run_migrations(config: &Config) -> anyhow::Result<()> {
    cloudtrain_storage::init(&config.database_url, 1)
        .await
        .context("failed to migrate database")?;
    info!("Database at {} is up to date", config.database_url);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
