//! Glue between the Yoco client crate and the engine's gateway and event contracts.
use league_payment_engine::{
    db_types::OrderNumber,
    traits::{CheckoutState, GatewayError, PaymentGateway},
    GatewayEvent,
    GatewayEventKind,
};
use log::debug;
use lps_common::Cents;
use serde_json::Value;
use yoco_tools::{YocoApi, YocoApiError};

use crate::data_objects::WebhookEvent;

/// Adapts [`YocoApi`] to the engine's [`PaymentGateway`] contract.
#[derive(Clone)]
pub struct YocoGateway(pub YocoApi);

impl PaymentGateway for YocoGateway {
    fn is_configured(&self) -> bool {
        self.0.is_configured()
    }

    async fn fetch_checkout(&self, checkout_id: &str) -> Result<CheckoutState, GatewayError> {
        let checkout = self.0.fetch_checkout(checkout_id).await.map_err(gateway_error)?;
        Ok(CheckoutState {
            checkout_id: checkout.id,
            status: checkout.status,
            amount: checkout.amount,
            payment_id: checkout.payment_id,
        })
    }
}

fn gateway_error(e: YocoApiError) -> GatewayError {
    match e {
        YocoApiError::RequestError(s) => GatewayError::Unavailable(s),
        YocoApiError::QueryError { status, message } => GatewayError::Rejected { status, message },
        YocoApiError::JsonError(s) | YocoApiError::Initialization(s) => GatewayError::InvalidResponse(s),
    }
}

/// Converts a raw webhook body into an engine event.
///
/// Returns `None` for anything that must be acknowledged without action: a missing or empty event type, a missing
/// or non-object payload, and a missing or malformed order number in the metadata.
pub fn gateway_event_from_webhook(event: WebhookEvent) -> Option<GatewayEvent> {
    let event_type = event.event_type.as_deref().filter(|t| !t.is_empty())?;
    let payload = event.payload.as_ref().filter(|p| p.is_object())?;
    let order_number = match payload["metadata"]["orderId"].as_str() {
        Some(raw) => match raw.parse::<OrderNumber>() {
            Ok(order_number) => order_number,
            Err(e) => {
                debug!("🪝️ Webhook carries a malformed order number. Skipping order update. {e}");
                return None;
            },
        },
        None => {
            debug!("🪝️ Webhook has no orderId in its metadata. Skipping order update.");
            return None;
        },
    };
    let amount = payload["amount"].as_i64().map(Cents::from);
    // The payment reference may arrive in several places depending on the event version.
    let payment_id = payload["paymentId"]
        .as_str()
        .or_else(|| payload["id"].as_str())
        .map(str::to_string)
        .or_else(|| event.id.clone());
    let kind = GatewayEventKind::from(event_type);
    Some(GatewayEvent { kind, event_id: event.id, order_number, amount, payment_id })
}
