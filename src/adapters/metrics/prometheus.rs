//! Prometheus Metrics Registry - Router Observability
//!
//! Registers the router's Prometheus metrics and renders them in the
//! text exposition format for the `/metrics` endpoint. Covers engine
//! outcomes, leg submissions, upstream latency, and WebSocket traffic.

use anyhow::Context;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Centralized Prometheus metrics for the router.
///
/// All metrics follow the naming convention `trigger_router_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Engine runs by outcome (`ok` or an error code).
    pub calculations: IntCounterVec,
    /// Legs submitted upstream by kind and outcome.
    pub legs_submitted: IntCounterVec,
    /// Upstream trigger API latency in seconds.
    pub gateway_latency: HistogramVec,
    /// Open WebSocket connections.
    pub ws_connections: IntGauge,
    /// Inbound WebSocket requests by event name.
    pub ws_requests: IntCounterVec,
    /// Order status transitions by target status.
    pub status_transitions: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let calculations = IntCounterVec::new(
            Opts::new(
                "trigger_router_calculations_total",
                "Order calculations by outcome",
            ),
            &["outcome"],
        )?;

        let legs_submitted = IntCounterVec::new(
            Opts::new(
                "trigger_router_legs_submitted_total",
                "Legs submitted to the trigger API",
            ),
            &["kind", "outcome"],
        )?;

        let gateway_latency = HistogramVec::new(
            HistogramOpts::new(
                "trigger_router_gateway_latency_seconds",
                "Trigger API request latency in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation"],
        )?;

        let ws_connections = IntGauge::new(
            "trigger_router_ws_connections",
            "Open WebSocket connections",
        )?;

        let ws_requests = IntCounterVec::new(
            Opts::new(
                "trigger_router_ws_requests_total",
                "Inbound WebSocket requests by event",
            ),
            &["event"],
        )?;

        let status_transitions = IntCounterVec::new(
            Opts::new(
                "trigger_router_status_transitions_total",
                "Order status transitions by target status",
            ),
            &["status"],
        )?;

        registry.register(Box::new(calculations.clone()))?;
        registry.register(Box::new(legs_submitted.clone()))?;
        registry.register(Box::new(gateway_latency.clone()))?;
        registry.register(Box::new(ws_connections.clone()))?;
        registry.register(Box::new(ws_requests.clone()))?;
        registry.register(Box::new(status_transitions.clone()))?;

        Ok(Self {
            registry,
            calculations,
            legs_submitted,
            gateway_latency,
            ws_connections,
            ws_requests,
            status_transitions,
        })
    }

    /// Render every registered metric in the text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_counters() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.calculations.with_label_values(&["ok"]).inc();
        metrics
            .legs_submitted
            .with_label_values(&["TAKE_PROFIT", "failed"])
            .inc_by(2);

        let text = metrics.render().unwrap();
        assert!(text.contains("trigger_router_calculations_total{outcome=\"ok\"} 1"));
        assert!(text.contains(
            "trigger_router_legs_submitted_total{kind=\"TAKE_PROFIT\",outcome=\"failed\"} 2"
        ));
    }
}
