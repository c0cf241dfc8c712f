use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{app, state::AppState};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build every configured instance and serve them until shutdown.
///
/// `address` overrides `server.bind_addr` from the configuration.
pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let registry = config
        .build_registry()
        .map_err(|e| format!("Failed to build instances: {}", e))?;
    let state = AppState::new(registry)?;

    for instance in state.mount_order() {
        let settings = instance.settings();
        info!(
            instance = %instance.name(),
            path_prefix = settings.path_prefix.as_deref().unwrap_or("/"),
            protect_from_dos_attacks = settings.protect_from_dos_attacks,
            "Mounting instance"
        );
    }

    let address = address.unwrap_or(config.server.bind_addr);
    let listener = TcpListener::bind(address).await?;
    info!(%address, "contentbox listening");

    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
