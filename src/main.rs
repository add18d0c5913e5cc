// src/main.rs
use axum::{extract::Extension, middleware, Router};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::time::Duration;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod common;
mod logging_middleware;
mod pages;
mod services;
mod users;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::{AppConfig, AppState, TlsConfig};
use services::GoogleOAuthClient;
use users::PgCredentialStore;

// ============================================================================
// ROUTER COMPOSITION
// ============================================================================

/// Builds the full application router around an already constructed state.
pub fn app_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // PAGE ROUTES
        // ====================================================================
        .merge(pages::pages_routes())
        .nest_service("/static", ServeDir::new(static_dir))
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(auth::load_session))
        .layer(middleware::from_fn(logging_middleware::log_requests))
        .layer(Extension(Arc::new(state)))
}

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file_loaded = dotenv::dotenv().is_ok() || dotenv::from_path("/etc/.env").is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if !env_file_loaded {
        warn!("No .env file found in working directory or /etc/.env, using process environment");
    }

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;

    info!(
        port = config.port,
        redirect_url = %config.google.redirect_url,
        session_hours = config.jwt_expiration_hours,
        cookie_secure = config.cookie_secure,
        tls = config.tls.is_some(),
        "Configuration loaded"
    );

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let oauth = Arc::new(GoogleOAuthClient::new(config.google.clone())?);
    let users = Arc::new(PgCredentialStore::new(pool));
    let static_dir = config.static_dir.clone();
    let tls = config.tls.clone();
    let port = config.port;

    let app_state = AppState::new(config, oauth, users);
    let app = app_router(app_state, &static_dir);

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    match tls {
        Some(tls) => serve_tls(app, addr, &tls).await?,
        None => serve_plain(app, addr).await?,
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Grace period for in-flight requests once a shutdown signal arrives
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

async fn serve_plain(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server started, listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn serve_tls(app: Router, addr: SocketAddr, tls: &TlsConfig) -> anyhow::Result<()> {
    let rustls = RustlsConfig::from_pem_file(&tls.cert_file, &tls.key_file)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                cert_file = %tls.cert_file.display(),
                key_file = %tls.key_file.display(),
                "Failed to load TLS certificate"
            );
            e
        })?;

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!("Server started, listening on https://{}", addr);

    axum_server::bind_rustls(addr, rustls)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let terminate = async {
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
            } else {
                error!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutting down server");
}
