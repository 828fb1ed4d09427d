//! `qaboard serve`: run the HTTP API.

use miette::{IntoDiagnostic, Result};
use qaboard_cli::server::{router, AppState};
use qaboard_core::Config;
use tracing::info;

/// Listener options.
#[derive(Debug, Clone)]
pub struct ServeAction {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin; `None` allows any.
    pub cors_origin: Option<String>,
}

pub async fn run(config: Config, action: ServeAction) -> Result<()> {
    let state = AppState::new(config).into_diagnostic()?;
    let app = router(state, action.cors_origin.as_deref());

    let listener = tokio::net::TcpListener::bind((action.host.as_str(), action.port))
        .await
        .into_diagnostic()?;
    let addr = listener.local_addr().into_diagnostic()?;
    info!(%addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler: run until killed.
        std::future::pending::<()>().await;
    }
}
