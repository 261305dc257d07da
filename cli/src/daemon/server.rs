// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Directory HTTP server

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use aegis_directory::{
    application::{coordinator::DirectoryCoordinator, directory_service::StandardDirectoryService},
    domain::directory_config::DirectoryConfig,
    infrastructure::{event_bus::EventBus, room_roster::InMemoryRoomRoster},
    presentation::api,
};

pub async fn start_server(mut config: DirectoryConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.spec.api.host = host;
    }
    if let Some(port) = port {
        config.spec.api.port = port;
    }

    config.validate().context("Configuration validation failed")?;

    let directory_jid = config.directory_jid();
    info!(
        "Configuration loaded: domain={}, jid={}",
        config.spec.domain, directory_jid
    );

    if let Some(metrics_port) = config.spec.observability.metrics_port {
        install_metrics_exporter(metrics_port)?;
    }

    // Initialize services
    let event_bus = EventBus::new(config.spec.event_bus.capacity);
    let (handle, writer) = DirectoryCoordinator::spawn(config.spec.queue.capacity, event_bus);
    let roster = Arc::new(InMemoryRoomRoster::new());
    let service = Arc::new(StandardDirectoryService::new(handle, roster, directory_jid));

    let app = api::app(service, config.spec.api.cors);

    // Start HTTP server
    let addr = format!("{}:{}", config.spec.api.host, config.spec.api.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Directory listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // The router held the last handle; the writer drains its queue and exits.
    if let Err(e) = writer.await {
        error!("Directory writer panicked: {}", e);
    }

    info!("Directory shutting down");

    Ok(())
}

fn install_metrics_exporter(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
