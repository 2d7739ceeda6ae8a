mod app_state;
mod error;
mod github;
mod mirror;
mod routes;
#[cfg(test)]
mod test_support;
mod utils;

use axum::Router;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::{build_app_state, AppState};
use crate::routes::webhook_handler::webhook_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let app_state = build_app_state()?;
    let addr = app_state.config.listen_addr;

    info!(
        repo_root = %app_state.config.repo_root.display(),
        mirror_bin = %app_state.config.mirror_bin,
        mirror_sync_bin = %app_state.config.mirror_sync_bin,
        "configuration loaded"
    );

    let app = router(Arc::new(app_state));

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Every method and path lands on the webhook handler.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new().fallback(webhook_handler).with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
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
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown");
}
