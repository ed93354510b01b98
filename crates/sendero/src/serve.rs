// SPDX-FileCopyrightText: 2026 Sendero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sendero serve` command implementation.
//!
//! Opens the SQLite store, builds the HTTP delivery gateway when
//! delivery is enabled, and runs the dispatch loop until SIGINT or
//! SIGTERM. With delivery disabled the loop still runs; every cycle
//! is a no-op and the queue accumulates until the operator enables it.

use std::sync::Arc;

use sendero_config::SenderoConfig;
use sendero_core::{DeliveryAdapter, SenderoError};
use sendero_delivery::HttpGateway;
use sendero_engine::{install_signal_handler, Dispatcher};
use sendero_storage::SqliteStore;
use tracing::info;

/// Runs the `sendero serve` command.
///
/// Supports graceful shutdown via signal handlers; in-flight dispatch
/// work finishes and the WAL is checkpointed before exit.
pub async fn run_serve(config: SenderoConfig) -> Result<(), SenderoError> {
    init_tracing(&config.log.level);

    info!("starting sendero serve");

    let store = {
        let store = SqliteStore::new(config.storage.clone());
        store.initialize().await?;
        Arc::new(store)
    };

    let delivery: Option<Arc<dyn DeliveryAdapter>> = if config.delivery.enabled {
        let gateway = HttpGateway::new(&config.delivery)?;
        info!(adapter = gateway.name(), "outbound delivery enabled");
        Some(Arc::new(gateway))
    } else {
        info!("outbound delivery disabled by configuration");
        None
    };

    let dispatcher = Dispatcher::new(store.clone(), delivery, config.dispatcher.clone());

    let cancel = install_signal_handler();
    dispatcher.run(cancel).await;

    store.close().await?;
    info!("sendero serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured level applies
/// globally with the HTTP stack held at warn.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},hyper=warn,reqwest=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
