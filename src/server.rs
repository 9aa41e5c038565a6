//! Prediction HTTP server: loads the artifact bundle once, then serves the
//! API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::artifacts::ModelBundle;
use crate::config::ServerConfig;
use crate::error::{Result, TriageError};

/// Load the artifacts and run the server. Any artifact problem aborts here,
/// before the socket is bound; a process that cannot predict must not accept
/// traffic.
pub async fn run(config: &ServerConfig) -> Result<()> {
    let bundle = ModelBundle::load(&config.model_dir)?;
    let state = AppState::new(bundle);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| TriageError::Validation(format!("invalid bind address: {e}")))?;
    info!("Starting prediction server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TriageError::Internal(format!("Prediction server error: {}", e)))?;

    info!("Prediction server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
