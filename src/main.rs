//! Trigger Order Router - Entry Point
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Read the trigger API key from the environment
//! 4. Create upstream clients (trigger gateway, price lookup)
//! 5. Open the JSON order store
//! 6. Build the use cases (OrderRouter, AdvisoryPlanner)
//! 7. Spawn health/metrics server and the readiness probe loop
//! 8. Spawn the WebSocket server
//! 9. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use trigger_order_router::adapters::advisory::BandAdvisor;
use trigger_order_router::adapters::api::client::{ApiClient, ApiClientConfig};
use trigger_order_router::adapters::api::price::PriceApiLookup;
use trigger_order_router::adapters::api::trigger::TriggerApiGateway;
use trigger_order_router::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use trigger_order_router::adapters::persistence::JsonOrderStore;
use trigger_order_router::adapters::transport::{Dispatcher, WebSocketServer, WebSocketServerConfig};
use trigger_order_router::config;
use trigger_order_router::domain::OrderCalculationEngine;
use trigger_order_router::ports::order_store::OrderStore;
use trigger_order_router::ports::trigger_gateway::TriggerGateway;
use trigger_order_router::usecases::{AdvisoryPlanner, OrderRouter};

/// Interval between readiness probes of the gateway and the store.
const HEALTH_PROBE_INTERVAL: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::var("ROUTER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.service.dry_run,
        "Starting Trigger Order Router"
    );
    if config.service.dry_run {
        warn!("Dry-run mode: legs computed but NOT submitted upstream");
    }

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);

    // ── 3. API key from env ─────────────────────────────────
    let api_key = std::env::var(&config.gateway.api_key_env)
        .ok()
        .filter(|key| !key.is_empty());
    if api_key.is_none() {
        warn!(env = %config.gateway.api_key_env, "No trigger API key set, using keyless access");
    }

    // ── 4. Upstream clients ─────────────────────────────────
    let gateway_client = Arc::new(
        ApiClient::new(ApiClientConfig {
            base_url: config.gateway.base_url.clone(),
            timeout: Duration::from_millis(config.gateway.timeout_ms),
            max_concurrent: config.gateway.max_concurrent,
            max_retries: config.gateway.max_retries,
            retry_base_delay: Duration::from_millis(config.gateway.retry_base_delay_ms),
            api_key: api_key.clone(),
        })
        .context("Failed to create trigger API client")?,
    );
    let gateway = Arc::new(TriggerApiGateway::new(gateway_client).with_metrics(Arc::clone(&metrics)));

    let price_client = Arc::new(
        ApiClient::new(ApiClientConfig {
            base_url: config.pricing.base_url.clone(),
            timeout: Duration::from_millis(config.pricing.timeout_ms),
            api_key,
            ..ApiClientConfig::default()
        })
        .context("Failed to create price API client")?,
    );
    let prices = Arc::new(PriceApiLookup::new(price_client));

    // ── 5. Order store ──────────────────────────────────────
    let store = Arc::new(
        JsonOrderStore::open(&config.persistence.data_dir)
            .await
            .context("Failed to open order store")?,
    );

    // ── 6. Use cases ────────────────────────────────────────
    let engine = OrderCalculationEngine::new(config.engine.max_decimals);
    let router = Arc::new(
        OrderRouter::new(engine, Arc::clone(&gateway), Arc::clone(&store))
            .with_dry_run(config.service.dry_run),
    );
    info!(max_decimals = router.engine().max_decimals(), "Calculation engine ready");
    let advisor = config
        .advisory
        .enabled
        .then(|| Arc::new(BandAdvisor::from_config(&config.advisory)));
    let planner = Arc::new(AdvisoryPlanner::new(engine, prices, advisor));
    let dispatcher = Arc::new(Dispatcher::new(router, planner).with_metrics(Arc::clone(&metrics)));

    // ── 7. Health/metrics server + readiness probes ─────────
    let health = Arc::new(HealthState::new());
    let health_handle = if config.metrics.enabled {
        let server = HealthServer::new(
            Arc::clone(&health),
            Arc::clone(&metrics),
            config.metrics.bind_address.clone(),
        );
        let rx = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(rx).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    let probe_handle = {
        let health = Arc::clone(&health);
        let gateway = Arc::clone(&gateway);
        let store = Arc::clone(&store);
        let mut rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEALTH_PROBE_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let gateway_ok = gateway.is_healthy().await;
                        let store_ok = store.is_healthy().await;
                        health.record(gateway_ok, store_ok);
                    }
                    _ = rx.recv() => break,
                }
            }
        })
    };

    // ── 8. WebSocket server ─────────────────────────────────
    let ws_server = WebSocketServer::new(
        WebSocketServerConfig::from_transport_config(&config.transport),
        dispatcher,
    )
    .with_metrics(Arc::clone(&metrics));
    let ws_stats = Arc::clone(ws_server.stats());
    let ws_shutdown = shutdown_tx.clone();
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server.run(ws_shutdown).await {
            error!(error = %e, "WebSocket server failed");
        }
    });

    info!("All tasks spawned, router is running");

    // ── 9. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    let _ = shutdown_tx.send(());
    health.record(false, false);

    let _ = tokio::time::timeout(Duration::from_secs(10), ws_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), probe_handle).await;
    if let Some(handle) = health_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!(
        connections_accepted = ws_stats.connections_accepted.load(Ordering::Relaxed),
        active_connections = ws_stats.active_connections.load(Ordering::Relaxed),
        "Shutdown complete"
    );
    Ok(())
}
