// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Weatherwire: authenticated weather lookups over HTTP and WebSocket.

pub mod accounts;
pub mod config;
pub mod credential;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod state;
pub mod test_support;
pub mod transport;
pub mod weather;

use std::sync::{Arc, Once};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::accounts::AccountDirectory;
use crate::config::ServerConfig;
use crate::state::AppState;
use crate::transport::build_router;
use crate::weather::OpenWeatherProvider;

/// Install the process-wide rustls crypto provider (idempotent).
pub fn ensure_crypto() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Run the server until Ctrl-C.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let shutdown = CancellationToken::new();

    if config.weather_api_key.is_none() {
        tracing::warn!("no weather API key configured; upstream lookups will be rejected");
    }
    let provider = OpenWeatherProvider::new(
        config.weather_api_url.clone(),
        config.weather_api_key.clone(),
        config.region.clone(),
    )?;

    let state = Arc::new(AppState::new(config, AccountDirectory::default(), Arc::new(provider)));
    let router = build_router(state);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
            }
            shutdown.cancel();
        });
    }

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("weatherwire listening on {}", listener.local_addr()?);
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
