//! WebSocket server for order requests.
//!
//! Accepts tokio-tungstenite connections, one task per client. Each text
//! frame is dispatched and answered on the same connection. Pings are
//! answered, binary frames are rejected.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use super::dispatch::Dispatcher;
use super::messages::ServerMessage;
use crate::adapters::metrics::prometheus::MetricsRegistry;
use crate::ports::advisory::AdvisoryService;
use crate::ports::order_store::OrderStore;
use crate::ports::price_lookup::PriceLookup;
use crate::ports::trigger_gateway::TriggerGateway;

/// Configuration for the WebSocket server.
#[derive(Debug, Clone)]
pub struct WebSocketServerConfig {
    pub bind_address: String,
    /// Maximum number of concurrent clients.
    pub max_connections: usize,
}

impl WebSocketServerConfig {
    pub fn from_transport_config(config: &crate::config::TransportConfig) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
            max_connections: config.max_connections,
        }
    }
}

/// Counters for accepted and currently open connections.
#[derive(Debug, Default)]
pub struct WebSocketServerStats {
    pub connections_accepted: AtomicU64,
    pub active_connections: AtomicUsize,
}

type ClientId = u64;

pub struct WebSocketServer<G, S, P, A>
where
    G: TriggerGateway,
    S: OrderStore,
    P: PriceLookup,
    A: AdvisoryService,
{
    config: WebSocketServerConfig,
    dispatcher: Arc<Dispatcher<G, S, P, A>>,
    metrics: Option<Arc<MetricsRegistry>>,
    stats: Arc<WebSocketServerStats>,
    next_client_id: AtomicU64,
}

impl<G, S, P, A> WebSocketServer<G, S, P, A>
where
    G: TriggerGateway,
    S: OrderStore,
    P: PriceLookup,
    A: AdvisoryService,
{
    pub fn new(config: WebSocketServerConfig, dispatcher: Arc<Dispatcher<G, S, P, A>>) -> Self {
        Self {
            config,
            dispatcher,
            metrics: None,
            stats: Arc::new(WebSocketServerStats::default()),
            next_client_id: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn stats(&self) -> &Arc<WebSocketServerStats> {
        &self.stats
    }

    /// Run until the shutdown signal fires.
    pub async fn run(&self, shutdown_tx: broadcast::Sender<()>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await?;
        let mut shutdown_rx = shutdown_tx.subscribe();

        info!(
            address = %self.config.bind_address,
            max_connections = self.config.max_connections,
            "WebSocket server started"
        );

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            self.handle_new_connection(stream, addr, &shutdown_tx);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("WebSocket server shutting down");
                    break;
                }
            }
        }

        info!("WebSocket server stopped");
        Ok(())
    }

    fn handle_new_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        shutdown_tx: &broadcast::Sender<()>,
    ) {
        let current = self.stats.active_connections.load(Ordering::Relaxed);
        if current >= self.config.max_connections {
            warn!(
                addr = %addr,
                current,
                max = self.config.max_connections,
                "Rejecting connection: max clients reached"
            );
            return;
        }

        let client_id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        self.stats.active_connections.fetch_add(1, Ordering::Relaxed);

        let dispatcher = Arc::clone(&self.dispatcher);
        let stats = Arc::clone(&self.stats);
        let metrics = self.metrics.clone();
        let shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            match accept_async(stream).await {
                Ok(ws) => {
                    stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
                    if let Some(m) = &metrics {
                        m.ws_connections.inc();
                    }
                    info!(client_id, addr = %addr, "Client connected");

                    Self::client_task(client_id, ws, dispatcher, shutdown_rx).await;

                    if let Some(m) = &metrics {
                        m.ws_connections.dec();
                    }
                    info!(client_id, "Client disconnected");
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "WebSocket handshake failed");
                }
            }
            stats.active_connections.fetch_sub(1, Ordering::Relaxed);
        });
    }

    async fn client_task(
        client_id: ClientId,
        ws: tokio_tungstenite::WebSocketStream<TcpStream>,
        dispatcher: Arc<Dispatcher<G, S, P, A>>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let (mut ws_tx, mut ws_rx) = ws.split();

        loop {
            tokio::select! {
                msg_result = ws_rx.next() => {
                    let reply = match msg_result {
                        Some(Ok(Message::Text(text))) => dispatcher.handle_text(&text).await,
                        Some(Ok(Message::Binary(_))) => ServerMessage::error(
                            None,
                            "BAD_REQUEST",
                            "binary frames are not supported".to_string(),
                            None,
                        ),
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_tx.send(Message::Pong(data)).await {
                                debug!(client_id, error = %e, "Failed to send pong");
                                break;
                            }
                            continue;
                        }
                        Some(Ok(Message::Close(_))) => {
                            debug!(client_id, "Client requested close");
                            break;
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            debug!(client_id, error = %e, "WebSocket error");
                            break;
                        }
                        None => {
                            debug!(client_id, "Connection closed");
                            break;
                        }
                    };

                    let json = match serde_json::to_string(&reply) {
                        Ok(json) => json,
                        Err(e) => {
                            error!(client_id, error = %e, "Failed to serialize reply");
                            continue;
                        }
                    };
                    if let Err(e) = ws_tx.send(Message::Text(json)).await {
                        debug!(client_id, error = %e, "Failed to send reply");
                        break;
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!(client_id, "Shutdown signal received");
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }
}
