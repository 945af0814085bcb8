//! Server startup and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use portal_core::Config;
use std::net::SocketAddr;

/// Bind the listener and serve until SIGINT or SIGTERM.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        environment = %config.environment,
        max_upload_mb = config.upload.max_upload_bytes / 1024 / 1024,
        supported_locales = %config.supported_locales.join(","),
        default_locale = %config.default_locale,
        "Intake server listening"
    );

    // Peer addresses feed client resolution when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server terminated with an error")?;

    tracing::info!("Intake server stopped");
    Ok(())
}

/// Resolves on the first of Ctrl+C or (on Unix) SIGTERM.
///
/// # Panics
/// If a signal handler cannot be installed.
async fn shutdown_signal() {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler");
        sigterm.recv().await;
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let signal = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };

    tracing::info!(signal, "Draining in-flight submissions before shutdown");
    portal_infra::shutdown_telemetry().await;
}
