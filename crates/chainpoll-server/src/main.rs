mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use chainpoll_api::session::AuthService;
use chainpoll_api::{AppState, AppStateInner};
use chainpoll_chain::ChainClient;
use chainpoll_db::MongoUserStore;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chainpoll=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // User store
    let store = MongoUserStore::connect(&config.mongodb_url, &config.db_name).await?;

    // Chain client
    let chain = ChainClient::connect(&config.chain).await?;

    let auth = AuthService::new(
        Arc::new(store),
        config.jwt_secret.as_bytes(),
        chrono::Duration::minutes(config.token_ttl_minutes),
    );
    let state: AppState = Arc::new(AppStateInner {
        auth,
        chain: Arc::new(chain),
    });

    let app = chainpoll_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Chainpoll server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}");
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
