use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{NewPaymentEvent, Order, OrderNumber},
    rec_api::{
        reconcile_objects::{EventOutcome, GatewayEvent, GatewayEventKind, ReconcileSummary, VerifyOutcome},
        YOCO_GATEWAY,
    },
    traits::{CheckoutState, PaymentGateway, ReconciliationDatabase, ReconciliationError},
};

/// `ReconciliationApi` is the primary API for confirming payments against the gateway and applying the resulting
/// order transitions.
///
/// The cardinal rule, applied on every path: an order only ever becomes `paid` off the back of an explicit
/// gateway-confirmed completion with a matching amount. Absence of proof resolves to pending. The `paid` write
/// itself is a conditional update guarded on `payment_status != 'paid'`, so concurrent invocations (webhook racing
/// a poll, sweep racing a webhook) produce exactly one transition and one audit entry between them.
pub struct ReconciliationApi<B, G> {
    db: B,
    gateway: G,
}

impl<B, G> Debug for ReconciliationApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, G> ReconciliationApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> ReconciliationApi<B, G>
where
    B: ReconciliationDatabase,
    G: PaymentGateway,
{
    /// The poll path: confirm the payment state of a single order against the gateway.
    ///
    /// Called from the "verify now" endpoint after the customer returns from the gateway redirect. The redirect
    /// itself is never trusted as proof of payment; only a `completed` checkout with a matching amount marks the
    /// order paid. Every inconclusive branch (no checkout reference, no credentials, gateway unreachable, non-2xx,
    /// amount mismatch, not-yet-completed status) resolves to [`VerifyOutcome::Pending`].
    pub async fn verify_order(&self, order_number: &OrderNumber) -> Result<VerifyOutcome, ReconciliationError> {
        let Some(order) = self.db.fetch_order(order_number).await? else {
            warn!("🔍️ Order {order_number} not found during verification");
            self.record_event(NewPaymentEvent::yoco(order_number.as_str(), "verify_order_not_found")
                .with_details("Order not found in database during verification"))
                .await;
            return Err(ReconciliationError::OrderNotFound(order_number.clone()));
        };
        if order.is_paid() {
            debug!("🔍️ Order {order_number} is already paid. Nothing to verify.");
            return Ok(VerifyOutcome::AlreadyPaid);
        }
        // Without a checkout reference there is nothing to ask the gateway about. Refuse to guess.
        let Some(checkout_id) = order.gateway_checkout_id.clone() else {
            warn!("🔍️ Order {order_number} has no gateway checkout id. Verification is not possible.");
            self.record_event(
                NewPaymentEvent::yoco(order_number.as_str(), "verify_no_checkout_id")
                    .with_amount(order.total_amount)
                    .with_details("Order has no gateway checkout id. Cannot verify with the Yoco API"),
            )
            .await;
            return Ok(VerifyOutcome::Pending { gateway_status: None });
        };
        if !self.gateway.is_configured() {
            error!("🔍️ No gateway credentials are configured. Payment for {order_number} cannot be verified.");
            self.record_event(
                NewPaymentEvent::yoco(order_number.as_str(), "verify_config_error")
                    .with_amount(order.total_amount)
                    .with_details("No Yoco secret key configured"),
            )
            .await;
            return Ok(VerifyOutcome::Pending { gateway_status: None });
        }
        match self.gateway.fetch_checkout(&checkout_id).await {
            Ok(state) if state.is_completed() => self.settle_verified_order(&order, &checkout_id, state).await,
            Ok(state) => {
                debug!("🔍️ Checkout {checkout_id} status is \"{}\". Not yet completed.", state.status);
                Ok(VerifyOutcome::Pending { gateway_status: Some(state.status) })
            },
            Err(e) => {
                warn!("🔍️ Gateway lookup for checkout {checkout_id} was inconclusive. {e}");
                self.record_event(
                    NewPaymentEvent::yoco(order_number.as_str(), "verify_api_error")
                        .with_amount(order.total_amount)
                        .with_details(format!("Yoco API error: {e}")),
                )
                .await;
                self.record_event(
                    NewPaymentEvent::yoco(order_number.as_str(), "verify_inconclusive")
                        .with_amount(order.total_amount)
                        .with_details("Yoco API call did not return completed status. Order remains pending"),
                )
                .await;
                Ok(VerifyOutcome::Pending { gateway_status: None })
            },
        }
    }

    /// The gateway has reported the checkout as completed. Check the amount and apply the guarded transition.
    async fn settle_verified_order(
        &self,
        order: &Order,
        checkout_id: &str,
        state: CheckoutState,
    ) -> Result<VerifyOutcome, ReconciliationError> {
        let order_number = &order.order_number;
        let expected = order.expected_cents();
        if let Some(reported) = state.amount {
            if reported != expected {
                error!(
                    "🚨️ Amount mismatch for order {order_number}: we expect {} cents, Yoco reports {} cents. NOT \
                     marking as paid.",
                    expected.value(),
                    reported.value()
                );
                self.record_event(
                    NewPaymentEvent::yoco(order_number.as_str(), "verify_amount_mismatch")
                        .with_amount(order.total_amount)
                        .with_details(format!(
                            "SECURITY: DB expects {} cents, Yoco reports {} cents",
                            expected.value(),
                            reported.value()
                        )),
                )
                .await;
                return Ok(VerifyOutcome::Pending { gateway_status: None });
            }
        }
        let verified = state.amount.unwrap_or(expected);
        let note = format!("Payment verified via Yoco API at {}", Utc::now().to_rfc3339());
        let history_note = format!("Yoco checkout {checkout_id} verified as completed ({} cents)", verified.value());
        let applied = self
            .db
            .confirm_order_paid(order_number, YOCO_GATEWAY, state.payment_id.as_deref(), &note, &history_note)
            .await?;
        if applied {
            info!("🔍️ Order {order_number} marked as paid via Yoco API verification");
            self.record_event(
                NewPaymentEvent::yoco(order_number.as_str(), "paid")
                    .with_amount(order.total_amount)
                    .with_details(format!("Verified via Yoco API. Checkout {checkout_id} completed ({} cents)", verified.value())),
            )
            .await;
            Ok(VerifyOutcome::Confirmed)
        } else {
            // A concurrent webhook or sweep got there first. That is the normal idempotent no-op.
            debug!("🔍️ Order {order_number} was already paid when the guarded update ran");
            Ok(VerifyOutcome::AlreadyPaid)
        }
    }

    /// The webhook path: apply one gateway event.
    ///
    /// Errors returned here are persistence failures only; the HTTP layer still acknowledges the event with a 200
    /// so the gateway does not retry indefinitely.
    pub async fn process_event(&self, event: GatewayEvent) -> Result<EventOutcome, ReconciliationError> {
        match &event.kind {
            GatewayEventKind::PaymentSucceeded => self.process_payment_succeeded(event).await,
            GatewayEventKind::PaymentFailed | GatewayEventKind::CheckoutExpired => {
                self.process_payment_terminated(event).await
            },
            GatewayEventKind::Other(t) => {
                debug!("🪝️ Unhandled gateway event type \"{t}\". No action taken.");
                Ok(EventOutcome::Ignored(t.clone()))
            },
        }
    }

    async fn process_payment_succeeded(&self, event: GatewayEvent) -> Result<EventOutcome, ReconciliationError> {
        let order_number = &event.order_number;
        let payment_id = event.payment_id.as_deref().unwrap_or("N/A");
        info!("🪝️ Yoco payment succeeded. Order: {order_number}, Payment ID: {payment_id}");
        let Some(order) = self.db.fetch_order(order_number).await? else {
            warn!("🪝️ Order {order_number} not found in database. Cannot reconcile an unknown order.");
            self.record_event(
                NewPaymentEvent::yoco(order_number.as_str(), "webhook_order_not_found")
                    .with_details("Order not found in database during webhook processing"),
            )
            .await;
            return Ok(EventOutcome::UnknownOrder);
        };
        if order.is_paid() {
            debug!("🪝️ Order {order_number} is already paid. Skipping duplicate webhook.");
            self.record_event(
                NewPaymentEvent::yoco(order_number.as_str(), "webhook_duplicate")
                    .with_amount(order.total_amount)
                    .with_details("Order already paid. Duplicate webhook skipped"),
            )
            .await;
            return Ok(EventOutcome::AlreadyPaid);
        }
        if let Some(reported) = event.amount {
            let expected = order.expected_cents();
            if reported != expected {
                error!(
                    "🚨️ Yoco amount mismatch for {order_number}: expected {} cents, got {} cents. NOT marking as \
                     paid.",
                    expected.value(),
                    reported.value()
                );
                self.record_event(
                    NewPaymentEvent::yoco(order_number.as_str(), "webhook_amount_mismatch")
                        .with_amount(order.total_amount)
                        .with_details(format!(
                            "SECURITY: expected {} cents, got {} cents",
                            expected.value(),
                            reported.value()
                        )),
                )
                .await;
                return Ok(EventOutcome::AmountMismatch);
            }
        }
        let note = format!("Payment confirmed via Yoco webhook at {}", Utc::now().to_rfc3339());
        let history_note = format!("Yoco payment completed. Payment ID: {payment_id}");
        let applied = self
            .db
            .confirm_order_paid(order_number, YOCO_GATEWAY, event.payment_id.as_deref(), &note, &history_note)
            .await?;
        if applied {
            info!("🪝️ Order {order_number} marked as paid and confirmed via Yoco webhook");
            self.record_event(
                NewPaymentEvent::yoco(order_number.as_str(), "paid")
                    .with_amount(order.total_amount)
                    .with_details(format!("Confirmed via Yoco webhook. Payment ID: {payment_id}")),
            )
            .await;
            Ok(EventOutcome::Confirmed)
        } else {
            debug!("🪝️ Order {order_number} was already paid when the guarded update ran");
            Ok(EventOutcome::AlreadyPaid)
        }
    }

    async fn process_payment_terminated(&self, event: GatewayEvent) -> Result<EventOutcome, ReconciliationError> {
        let order_number = &event.order_number;
        let kind = &event.kind;
        info!("🪝️ Yoco {kind}. Order: {order_number}");
        let note = format!("Payment {kind} via Yoco at {}", Utc::now().to_rfc3339());
        let history_note = format!("Yoco: {kind}");
        let applied = self.db.cancel_order(order_number, &note, &history_note).await?;
        if applied {
            info!("🪝️ Order {order_number} marked as cancelled via Yoco");
            self.record_event(
                NewPaymentEvent::yoco(order_number.as_str(), "cancelled")
                    .with_details(format!("Order cancelled via Yoco webhook: {kind}")),
            )
            .await;
        } else {
            debug!("🪝️ Cancel for order {order_number} affected no rows (already paid, or unknown order)");
        }
        Ok(EventOutcome::Cancelled { applied })
    }

    /// The sweep: re-check every pending gateway order created within the window against the gateway.
    ///
    /// This exists because a redirect and a webhook can both miss a restarting server. Orphaned payments are caught
    /// here by asking the gateway directly. Per-order gateway failures are counted and skipped; they never abort the
    /// pass or mutate an order.
    pub async fn reconcile_pending_orders(&self, window: Duration) -> Result<ReconcileSummary, ReconciliationError> {
        let mut summary = ReconcileSummary::default();
        if !self.gateway.is_configured() {
            warn!("🕰️ No gateway credentials are configured. Skipping reconciliation pass.");
            return Ok(summary);
        }
        let orders = self.db.fetch_pending_gateway_orders(YOCO_GATEWAY, window).await?;
        if orders.is_empty() {
            debug!("🕰️ No pending Yoco orders to reconcile");
            return Ok(summary);
        }
        info!("🕰️ Found {} pending Yoco order(s) to check", orders.len());
        self.record_event(
            NewPaymentEvent::yoco("SYSTEM", "reconcile_start")
                .with_details(format!("Checking {} pending order(s)", orders.len())),
        )
        .await;
        for order in &orders {
            summary.checked += 1;
            if let Err(e) = self.reconcile_one(order, &mut summary).await {
                error!("🕰️ Error while reconciling order {}: {e}", order.order_number);
                summary.errors += 1;
            }
        }
        info!("🕰️ Reconciliation pass done. {summary}");
        self.record_event(NewPaymentEvent::yoco("SYSTEM", "reconcile_complete").with_details(summary.to_string()))
            .await;
        Ok(summary)
    }

    async fn reconcile_one(&self, order: &Order, summary: &mut ReconcileSummary) -> Result<(), ReconciliationError> {
        let order_number = &order.order_number;
        // The sweep query only returns orders that hold a checkout reference.
        let Some(checkout_id) = order.gateway_checkout_id.clone() else {
            return Ok(());
        };
        let state = match self.gateway.fetch_checkout(&checkout_id).await {
            Ok(state) => state,
            Err(e) => {
                warn!("🕰️ Gateway lookup failed for order {order_number} (checkout {checkout_id}). {e}");
                summary.errors += 1;
                return Ok(());
            },
        };
        debug!("🕰️ Order {order_number}: Yoco status is \"{}\"", state.status);
        if state.is_completed() {
            let expected = order.expected_cents();
            if let Some(reported) = state.amount {
                if reported != expected {
                    error!(
                        "🚨️ Amount mismatch for {order_number}: we expect {} cents, Yoco reports {} cents. NOT \
                         marking as paid.",
                        expected.value(),
                        reported.value()
                    );
                    self.record_event(
                        NewPaymentEvent::yoco(order_number.as_str(), "reconcile_amount_mismatch")
                            .with_amount(order.total_amount)
                            .with_details(format!(
                                "SECURITY: DB expects {} cents, Yoco reports {} cents",
                                expected.value(),
                                reported.value()
                            )),
                    )
                    .await;
                    summary.errors += 1;
                    return Ok(());
                }
            }
            let payment_id = state.payment_id.as_deref().unwrap_or("N/A");
            let note = format!(
                "Payment auto-confirmed via reconciliation at {} (Yoco checkout completed)",
                Utc::now().to_rfc3339()
            );
            let history_note =
                format!("Auto-reconciled: Yoco checkout {checkout_id} confirmed as completed. Payment ID: {payment_id}");
            let applied = self
                .db
                .confirm_order_paid(order_number, YOCO_GATEWAY, state.payment_id.as_deref(), &note, &history_note)
                .await?;
            if applied {
                info!("🕰️ Order {order_number} auto-confirmed (was pending, Yoco says completed)");
                self.record_event(
                    NewPaymentEvent::yoco(order_number.as_str(), "auto_reconciled")
                        .with_amount(order.total_amount)
                        .with_details(format!(
                            "Payment auto-confirmed by reconciliation. Yoco checkout {checkout_id} completed. \
                             Payment ID: {payment_id}. Order was pending since {}",
                            order.created_at
                        )),
                )
                .await;
                summary.confirmed += 1;
            }
        } else if state.is_terminated() {
            let note = format!(
                "Order auto-cancelled via reconciliation: Yoco checkout {} at {}",
                state.status,
                Utc::now().to_rfc3339()
            );
            let history_note = format!("Auto-reconciled: Yoco checkout {}", state.status);
            let applied = self.db.cancel_order(order_number, &note, &history_note).await?;
            if applied {
                info!("🕰️ Order {order_number} marked as cancelled (Yoco: {})", state.status);
                self.record_event(
                    NewPaymentEvent::yoco(order_number.as_str(), "auto_cancelled")
                        .with_amount(order.total_amount)
                        .with_details(format!("Yoco checkout {}. Order auto-cancelled by reconciliation", state.status)),
                )
                .await;
                summary.cancelled += 1;
            }
        }
        // Any other status: still processing. Leave the order alone.
        Ok(())
    }

    /// Audit-trail writes are best-effort. A failure to record an event must never fail the payment flow it
    /// annotates.
    async fn record_event(&self, event: NewPaymentEvent) {
        if let Err(e) = self.db.record_payment_event(event).await {
            warn!("🧾️ Could not record payment event. {e}");
        }
    }
}
