// ABOUTME: Server resource wiring and the HTTP listener lifecycle
// ABOUTME: Bundles the store, calendar client, and mailer behind one shared handle
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Shared server resources and the HTTP listener

use crate::calendar::CalendarService;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::notifications::NotificationSender;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Everything a request handler or background task needs, behind one `Arc`
///
/// The collaborators are trait objects so tests can substitute the remote
/// calendar and the mail relay without network access.
pub struct ServerResources {
    pub database: Arc<Database>,
    pub calendar: Arc<dyn CalendarService>,
    pub notifier: Arc<dyn NotificationSender>,
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle constructed collaborators into shared resources
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        calendar: Arc<dyn CalendarService>,
        notifier: Arc<dyn NotificationSender>,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            calendar,
            notifier,
            config,
        }
    }
}

/// Serve the REST surface until shutdown is requested
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(resources: Arc<ServerResources>) -> Result<()> {
    let port = resources.config.http_port;
    let router = crate::routes::router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("HTTP server listening on port {port}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Both SIGINT and SIGTERM stop the listener; in-flight tasks run to
    // completion or failure, there are no cancellation semantics.
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            signal.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
