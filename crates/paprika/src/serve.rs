// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `paprika serve` command implementation.
//!
//! Wires the storage layer, the Telegram channel, the dispatch worker, and
//! the outbox delivery manager, then supervises them until SIGINT/SIGTERM.
//! The dispatch and delivery loops run as concurrent tasks over the same
//! single-writer database.

use std::sync::Arc;
use std::time::Duration;

use paprika_config::PaprikaConfig;
use paprika_core::types::HealthStatus;
use paprika_core::{DeliveryChannel, PaprikaError};
use paprika_engine::{shutdown, DeliveryManager, Dispatcher, IdempotencyGuard, TemplateGenerator};
use paprika_storage::Database;
use paprika_telegram::TelegramChannel;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber from the configured log level,
/// overridable via `RUST_LOG`.
fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs the `paprika serve` command.
pub async fn run_serve(config: PaprikaConfig) -> Result<(), PaprikaError> {
    init_tracing(&config.agent.log_level);
    info!(agent = %config.agent.name, "starting paprika serve");

    // Storage opens first; migrations run on open.
    let db = Database::open(&config.storage.database_path).await?;

    let worker_id = config
        .worker
        .worker_id
        .clone()
        .unwrap_or_else(|| format!("paprika-{}", uuid::Uuid::new_v4()));
    let guard = IdempotencyGuard::new(
        db.clone(),
        worker_id.clone(),
        Duration::from_secs(config.worker.claim_staleness_secs),
    );

    let channel = Arc::new(TelegramChannel::new(config.telegram.clone()).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram channel");
        eprintln!(
            "error: Telegram bot token required. Set telegram.bot_token in paprika.toml \
             or the PAPRIKA_TELEGRAM_BOT_TOKEN environment variable."
        );
        e
    })?);

    match channel.health_check().await {
        Ok(HealthStatus::Healthy) => info!("telegram channel healthy"),
        Ok(status) => warn!(?status, "telegram channel not healthy at startup, continuing"),
        Err(e) => warn!(error = %e, "telegram health check failed, continuing"),
    }

    let shutdown_token = shutdown::install_signal_handler();

    // Ingestion feeds the dispatch loop through a bounded channel.
    let (inbound_tx, inbound_rx) = mpsc::channel(100);
    let polling = Arc::clone(&channel).spawn_polling(inbound_tx, shutdown_token.clone());

    let dispatcher = Arc::new(Dispatcher::new(
        db.clone(),
        guard,
        Arc::new(TemplateGenerator::new()),
        config.worker.clone(),
    ));
    let dispatch_task = tokio::spawn(Arc::clone(&dispatcher).run(inbound_rx, shutdown_token.clone()));

    let delivery = Arc::new(DeliveryManager::new(
        db.clone(),
        Arc::clone(&channel),
        config.outbox.clone(),
    ));
    let delivery_task = tokio::spawn(Arc::clone(&delivery).run(shutdown_token.clone()));

    info!(worker_id = %worker_id, "paprika serve running");
    shutdown_token.cancelled().await;
    info!("shutdown requested, draining");

    polling.abort();
    let _ = dispatch_task.await;
    let _ = delivery_task.await;

    // Give in-flight event tasks a moment to resolve their claims; anything
    // still running past this is recovered later via the staleness reclaim.
    tokio::time::sleep(Duration::from_millis(500)).await;

    db.close().await?;
    info!("shutdown complete");
    Ok(())
}
