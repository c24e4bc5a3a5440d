// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jdbridge: REST + WebSocket control bridge for JDownloader's
//! MyJDownloader cloud remote control.

pub mod cloud;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod monitor;
pub mod registry;
pub mod service;
pub mod settings;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::cloud::myjd::MyJdConnector;
use crate::cloud::CloudConnector;
use crate::config::BridgeConfig;
use crate::state::AppState;
use crate::transport::build_router;

/// Run the bridge server until shutdown.
pub async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    // reqwest is built with rustls-no-provider; install the ring provider once.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let connector: Arc<dyn CloudConnector> =
        Arc::new(MyJdConnector::new(config.api_url.clone(), config.app_key.clone()));
    let state = Arc::new(AppState::new(config, connector, shutdown.clone()));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    if state.config.api_key.is_some() {
        tracing::info!("jdbridge listening on {addr} (api key enabled)");
    } else {
        tracing::info!("jdbridge listening on {addr}");
    }

    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
