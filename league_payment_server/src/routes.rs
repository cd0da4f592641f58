//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the storage backend and the payment gateway so that the endpoint tests can exercise
//! them against mocks. actix-web cannot handle generics in attribute-macro handlers, so registration is implemented
//! manually via the `route!` macro.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use league_payment_engine::{
    db_types::{NewPaymentEvent, OrderNumber},
    traits::{PaymentGateway, ReconciliationDatabase},
    ReconciliationApi,
};
use log::*;
use lps_common::ZAR_CURRENCY_CODE;
use yoco_tools::{CheckoutMetadata, NewCheckoutRequest, YocoApi, YocoApiError};

use crate::{
    config::ServerOptions,
    data_objects::{
        CreateCheckoutParams,
        CreateCheckoutResult,
        ReconcileResult,
        VerifyPaymentParams,
        VerifyPaymentResult,
        WebhookAck,
        WebhookEvent,
    },
    errors::ServerError,
    integrations::yoco::gateway_event_from_webhook,
};

#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                // Route-level method registration, so that a wrong-method request on a known path answers 405
                // rather than falling through to the app-level 404.
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .route(actix_web::web::$method().to($name::< $( [< T $bounds:camel >], )+>));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------   Verify (poll path)  ----------------------------------------------------
route!(yoco_verify => post "/yoco/verify" impl ReconciliationDatabase, PaymentGateway);
/// Called by the success page after the gateway redirects the customer back. The redirect is never trusted: the
/// order only comes back as `paid` if the engine could confirm completion with the gateway (or it was already paid).
pub async fn yoco_verify<B, G>(
    body: web::Json<VerifyPaymentParams>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: ReconciliationDatabase,
    G: PaymentGateway,
{
    let params = body.into_inner();
    let order_number =
        params.order_id.parse::<OrderNumber>().map_err(|e| ServerError::InvalidOrderNumber(e.to_string()))?;
    debug!("🔍️ POST verify payment for order {order_number}");
    let outcome = api.verify_order(&order_number).await?;
    Ok(HttpResponse::Ok().json(VerifyPaymentResult::from(outcome)))
}

// ----------------------------------------   Webhook  ----------------------------------------------------
route!(yoco_webhook => post "/yoco/webhook" impl ReconciliationDatabase, PaymentGateway);
/// Receives payment notifications from the gateway.
///
/// This handler always answers 200: a non-2xx here would make the gateway retry indefinitely. The body is parsed
/// leniently, events that cannot be attributed to an order are acknowledged and dropped, and internal failures
/// degrade to an acknowledgment with a diagnostic field.
pub async fn yoco_webhook<B, G>(
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B, G>>,
) -> HttpResponse
where
    B: ReconciliationDatabase,
    G: PaymentGateway,
{
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("🪝️ Could not parse webhook body. {e}");
            return HttpResponse::Ok().json(WebhookAck::with_error("Invalid event payload"));
        },
    };
    let event_type = event.event_type.as_deref().unwrap_or("N/A");
    let event_id = event.id.as_deref().unwrap_or("N/A");
    info!("🪝️ Yoco webhook received. type: {event_type}, id: {event_id}");
    let order_hint = event
        .payload
        .as_ref()
        .and_then(|p| p["metadata"]["orderId"].as_str())
        .unwrap_or("unknown")
        .to_string();
    let received = NewPaymentEvent::yoco(&order_hint, "webhook_received")
        .with_details(format!("Event type: {event_type}, Event ID: {event_id}"));
    if let Err(e) = api.db().record_payment_event(received).await {
        warn!("🧾️ Could not record webhook receipt. {e}");
    }
    let Some(event) = gateway_event_from_webhook(event) else {
        debug!("🪝️ Webhook event could not be attributed to an order. Acknowledging without action.");
        return HttpResponse::Ok().json(WebhookAck::received());
    };
    match api.process_event(event).await {
        Ok(outcome) => {
            debug!("🪝️ Webhook processed. Outcome: {outcome:?}");
            HttpResponse::Ok().json(WebhookAck::received())
        },
        Err(e) => {
            // Per the gateway contract, even a persistence failure is acknowledged so the event is not redelivered
            // forever. The diagnostic field and the error log are the only traces.
            error!("🪝️ Error while processing webhook. {e}");
            HttpResponse::Ok().json(WebhookAck::with_error("Internal processing error"))
        },
    }
}

// ----------------------------------------   Checkout creation  ----------------------------------------------------
route!(yoco_create_checkout => post "/yoco/create-checkout" impl ReconciliationDatabase, PaymentGateway);
/// Creates a gateway checkout session for an order. The amount always comes from the stored order, never from the
/// client.
pub async fn yoco_create_checkout<B, G>(
    req: HttpRequest,
    body: web::Json<CreateCheckoutParams>,
    api: web::Data<ReconciliationApi<B, G>>,
    yoco: web::Data<YocoApi>,
) -> Result<HttpResponse, ServerError>
where
    B: ReconciliationDatabase,
    G: PaymentGateway,
{
    if !yoco.is_configured() {
        return Err(ServerError::GatewayNotConfigured);
    }
    let params = body.into_inner();
    if params.order_id.is_empty() || params.email.is_empty() {
        return Err(ServerError::InvalidRequestBody("Missing required payment fields".to_string()));
    }
    let order_number =
        params.order_id.parse::<OrderNumber>().map_err(|e| ServerError::InvalidOrderNumber(e.to_string()))?;
    let Some(order) = api.db().fetch_order(&order_number).await? else {
        return Err(ServerError::InvalidRequestBody("Order not found. Please try again.".to_string()));
    };
    if order.is_paid() {
        return Err(ServerError::InvalidRequestBody("This order has already been paid.".to_string()));
    }
    if !order.total_amount.is_finite() || order.total_amount <= 0.0 {
        return Err(ServerError::InvalidRequestBody("Invalid order amount".to_string()));
    }
    let amount = order.expected_cents();
    let conn = req.connection_info().clone();
    let origin = format!("{}://{}", conn.scheme(), conn.host());
    debug!("💳️ Creating Yoco checkout for order {order_number}: {amount}, return origin {origin}");
    let request = NewCheckoutRequest {
        amount,
        currency: ZAR_CURRENCY_CODE.to_string(),
        success_url: format!("{origin}/checkout/success?order={order_number}&gateway=yoco"),
        cancel_url: format!("{origin}/checkout"),
        failure_url: format!("{origin}/checkout?error=payment_failed"),
        metadata: CheckoutMetadata {
            order_id: order_number.to_string(),
            customer_id: params.customer_id,
            customer_email: params.email.clone(),
            customer_name: format!("{} {}", params.first_name, params.last_name).trim().to_string(),
            item_description: params.item_description,
        },
    };
    let checkout = match yoco.create_checkout(&request).await {
        Ok(checkout) => checkout,
        Err(YocoApiError::QueryError { status, message }) => {
            warn!("💳️ Yoco API rejected checkout creation for {order_number}. Status {status}. {message}");
            record_event(
                &api,
                NewPaymentEvent::yoco(order_number.as_str(), "checkout_api_error")
                    .with_amount(order.total_amount)
                    .with_details(format!("Yoco API {status}: {message}")),
            )
            .await;
            return Err(ServerError::GatewayRejected(message));
        },
        Err(e) => {
            error!("💳️ Could not create Yoco checkout for {order_number}. {e}");
            record_event(
                &api,
                NewPaymentEvent::yoco(order_number.as_str(), "checkout_exception").with_details(e.to_string()),
            )
            .await;
            return Err(ServerError::BackendError("Failed to create payment session".to_string()));
        },
    };
    record_event(
        &api,
        NewPaymentEvent::yoco(order_number.as_str(), "checkout_created")
            .with_amount(order.total_amount)
            .with_details(format!("Checkout ID: {}, Amount: {amount}", checkout.id)),
    )
    .await;
    // The checkout reference is what later verification keys on. Losing it is not fatal to the payment itself,
    // so the checkout is still returned to the client.
    if let Err(e) = api.db().set_gateway_checkout_id(&order_number, &checkout.id).await {
        error!("💳️ Failed to store Yoco checkout id {} for order {order_number}. {e}", checkout.id);
    }
    info!("💳️ Yoco checkout {} created for order {order_number}", checkout.id);
    Ok(HttpResponse::Ok().json(CreateCheckoutResult {
        success: true,
        checkout_id: checkout.id,
        redirect_url: checkout.redirect_url,
        status: checkout.status,
    }))
}

// ----------------------------------------   Manual reconcile  ----------------------------------------------------
route!(reconcile_payments => post "/cron/reconcile-payments" impl ReconciliationDatabase, PaymentGateway);
/// Runs a reconciliation sweep on demand. Guarded by the shared secret that scheduled jobs use; when no secret is
/// configured, the endpoint refuses every request and the periodic worker is the only sweep trigger.
pub async fn reconcile_payments<B, G>(
    req: HttpRequest,
    api: web::Data<ReconciliationApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: ReconciliationDatabase,
    G: PaymentGateway,
{
    let provided = req.headers().get("x-reconcile-secret").and_then(|v| v.to_str().ok()).unwrap_or_default();
    let expected = options.reconcile_secret.reveal();
    if expected.is_empty() || provided != expected {
        return Err(ServerError::Unauthorized("A valid reconciliation secret is required".to_string()));
    }
    info!("🕰️ Manual reconciliation pass requested");
    let summary = api.reconcile_pending_orders(options.reconcile_window).await?;
    Ok(HttpResponse::Ok().json(ReconcileResult::from(summary)))
}

async fn record_event<B, G>(api: &web::Data<ReconciliationApi<B, G>>, event: NewPaymentEvent)
where
    B: ReconciliationDatabase,
    G: PaymentGateway,
{
    if let Err(e) = api.db().record_payment_event(event).await {
        warn!("🧾️ Could not record payment event. {e}");
    }
}
