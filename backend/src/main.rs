//! Main entry point for the EMR authentication backend.
//!
//! This file loads configuration, sets up logging, wires the in-memory stores
//! into the auth service and serves the API until Ctrl-C.

use std::sync::Arc;

use adapters::{MemoryIdentityRegistry, MemoryNonceStore};
use backend::{
    auth::{AppState, AuthPolicy, AuthService, SessionIssuer},
    config::Config,
    services::spawn_nonce_janitor,
};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let config = Config::parse();
    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Listen: {}", config.listen);
    info!("Mode: {}", if config.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    if config.dev_mode && config.jwt_secret.is_none() {
        warn!("Using built-in development token secret");
    }
    if !config.allow_login_role_claim {
        info!("Role claims on login are disabled");
    }

    let nonces = Arc::new(MemoryNonceStore::new(config.nonce_ttl()));
    let identities = Arc::new(MemoryIdentityRegistry::new());

    let janitor = spawn_nonce_janitor(nonces.clone(), config.nonce_sweep_interval());

    let issuer = SessionIssuer::new(
        config.jwt_secret()?.as_bytes(),
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    )?;
    let auth = AuthService::new(
        nonces,
        identities,
        issuer,
        AuthPolicy {
            allow_login_role_claim: config.allow_login_role_claim,
        },
    );

    let state = AppState {
        auth: Arc::new(auth),
    };
    let app = backend::app(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    janitor.abort();
    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let level = &config.log_level;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("emr_backend={level},backend={level},adapters={level},info").into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
