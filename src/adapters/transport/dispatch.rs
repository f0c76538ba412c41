//! Request dispatch: decoded WebSocket requests to use cases.
//!
//! Socket-free so it can be driven directly from tests.

use std::sync::Arc;

use tracing::{debug, warn};

use super::messages::{ClientRequest, Envelope, ServerMessage};
use crate::adapters::metrics::prometheus::MetricsRegistry;
use crate::domain::error::CalculationError;
use crate::domain::order::{OrderStatus, StatusTransitionError};
use crate::domain::routing::RoutingError;
use crate::ports::advisory::AdvisoryService;
use crate::ports::order_store::OrderStore;
use crate::ports::price_lookup::PriceLookup;
use crate::ports::trigger_gateway::TriggerGateway;
use crate::usecases::{AdvisoryPlanner, LegOutcome, OrderRouter, PlacementReport};

/// Map an error to its wire code and offending field.
pub fn classify(error: &anyhow::Error) -> (&'static str, Option<&'static str>) {
    if let Some(e) = error.downcast_ref::<CalculationError>() {
        return (e.code(), Some(e.field()));
    }
    if let Some(e) = error.downcast_ref::<RoutingError>() {
        let field = match e {
            RoutingError::EmptyField { field } => *field,
            RoutingError::SameToken { .. } => "output_token",
        };
        return ("INVALID_INTENT", Some(field));
    }
    if error.downcast_ref::<StatusTransitionError>().is_some() {
        return ("INVALID_TRANSITION", Some("status"));
    }
    ("REQUEST_FAILED", None)
}

pub struct Dispatcher<G, S, P, A>
where
    G: TriggerGateway,
    S: OrderStore,
    P: PriceLookup,
    A: AdvisoryService,
{
    router: Arc<OrderRouter<G, S>>,
    planner: Arc<AdvisoryPlanner<P, A>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<G, S, P, A> Dispatcher<G, S, P, A>
where
    G: TriggerGateway,
    S: OrderStore,
    P: PriceLookup,
    A: AdvisoryService,
{
    pub fn new(router: Arc<OrderRouter<G, S>>, planner: Arc<AdvisoryPlanner<P, A>>) -> Self {
        Self {
            router,
            planner,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Handle one text frame and produce exactly one reply.
    pub async fn handle_text(&self, text: &str) -> ServerMessage {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.count_request("invalid");
                return ServerMessage::error(None, "BAD_REQUEST", format!("malformed message: {e}"), None);
            }
        };

        let label = ClientRequest::EVENTS
            .iter()
            .find(|known| **known == envelope.event)
            .copied()
            .unwrap_or("unknown");
        self.count_request(label);

        match ClientRequest::decode(&envelope.event, envelope.data) {
            Ok(request) => self.handle(envelope.id, request).await,
            Err(message) => ServerMessage::error(envelope.id, "BAD_REQUEST", message, None),
        }
    }

    pub async fn handle(&self, id: Option<String>, request: ClientRequest) -> ServerMessage {
        let event = request.event();
        debug!(event, id = ?id, "Dispatching request");

        let reply = match request {
            ClientRequest::CalculateOrders(req) => {
                let result = self.router.preview(&req).map_err(anyhow::Error::from);
                self.count_calculation(result.as_ref().err());
                result.map(|set| ServerMessage::result(id.clone(), event, &set))
            }
            ClientRequest::CreateOrders(intent) => {
                let result = self.router.place(&intent).await;
                self.count_calculation(result.as_ref().err());
                if let Ok(report) = &result {
                    self.count_legs(report);
                }
                result.map(|report| ServerMessage::result(id.clone(), event, &report))
            }
            ClientRequest::ExecuteOrder(params) => self
                .router
                .execute(params.order_id, &params.signed_transaction)
                .await
                .map(|outcome| ServerMessage::result(id.clone(), event, &outcome)),
            ClientRequest::CancelOrder(params) => {
                let result = self.router.cancel(params.order_id).await;
                if result.is_ok() {
                    self.count_transition(OrderStatus::Cancelled);
                }
                result.map(|outcome| ServerMessage::result(id.clone(), event, &outcome))
            }
            ClientRequest::UpdateStatus(params) => {
                let result = self.router.mark_status(params.order_id, params.status).await;
                if result.is_ok() {
                    self.count_transition(params.status);
                }
                result.map(|record| ServerMessage::result(id.clone(), event, &record))
            }
            ClientRequest::GetOrders(params) => self
                .router
                .list_orders(&params.into_query())
                .await
                .map(|records| ServerMessage::result(id.clone(), event, &records)),
            ClientRequest::GetPrice(params) => self
                .planner
                .quote(&params.token)
                .await
                .map(|quote| ServerMessage::result(id.clone(), event, &quote)),
            ClientRequest::SuggestOrders(params) => {
                let result = self
                    .planner
                    .plan(
                        &params.token,
                        params.budget,
                        params.input_decimals,
                        params.output_decimals,
                    )
                    .await;
                self.count_calculation(result.as_ref().err());
                result.map(|plan| ServerMessage::result(id.clone(), event, &plan))
            }
        };

        reply.unwrap_or_else(|e| {
            let (code, field) = classify(&e);
            let message = format!("{e:#}");
            warn!(event, code, error = %message, "Request failed");
            ServerMessage::error(id, code, message, field)
        })
    }

    fn count_request(&self, event: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.ws_requests.with_label_values(&[event]).inc();
        }
    }

    /// Count an engine run. Failures from anywhere but the engine did not
    /// reach it and are not counted.
    fn count_calculation(&self, error: Option<&anyhow::Error>) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let outcome = match error {
            None => "ok",
            Some(e) => match e.downcast_ref::<CalculationError>() {
                Some(calc) => calc.code(),
                None => return,
            },
        };
        metrics.calculations.with_label_values(&[outcome]).inc();
    }

    fn count_legs(&self, report: &PlacementReport) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        for leg in &report.legs {
            let outcome = match leg.outcome {
                LegOutcome::Placed { .. } => "placed",
                LegOutcome::Failed { .. } => "failed",
                LegOutcome::Skipped => "skipped",
            };
            let kind = leg.kind.to_string();
            metrics
                .legs_submitted
                .with_label_values(&[kind.as_str(), outcome])
                .inc();
        }
    }

    fn count_transition(&self, status: OrderStatus) {
        if let Some(metrics) = &self.metrics {
            let status = status.to_string();
            metrics
                .status_transitions
                .with_label_values(&[status.as_str()])
                .inc();
        }
    }
}
