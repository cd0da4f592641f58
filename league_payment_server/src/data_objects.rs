use league_payment_engine::{ReconcileSummary, VerifyOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;

//----------------------------------------   Poll path   ----------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentParams {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentResult {
    pub success: bool,
    pub status: String,
    pub message: String,
}

impl From<VerifyOutcome> for VerifyPaymentResult {
    fn from(outcome: VerifyOutcome) -> Self {
        let status = outcome.status_label().to_string();
        let message = match &outcome {
            VerifyOutcome::AlreadyPaid => "Payment already confirmed".to_string(),
            VerifyOutcome::Confirmed => "Payment verified and confirmed".to_string(),
            VerifyOutcome::Pending { gateway_status: Some(status) } => format!("Checkout status: {status}"),
            VerifyOutcome::Pending { gateway_status: None } => {
                "Payment is being processed. Please allow a few minutes for confirmation.".to_string()
            },
        };
        Self { success: true, status, message }
    }
}

//----------------------------------------   Webhook path   ----------------------------------------------------
/// The raw webhook body, parsed leniently. Every field is optional: the webhook contract requires acknowledging
/// structurally broken events rather than rejecting them, so nothing here may fail deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true, error: None }
    }

    pub fn with_error<S: Into<String>>(error: S) -> Self {
        Self { received: true, error: Some(error.into()) }
    }
}

//----------------------------------------   Checkout creation   ----------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutParams {
    pub order_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub item_description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResult {
    pub success: bool,
    pub checkout_id: String,
    pub redirect_url: Option<String>,
    pub status: String,
}

//----------------------------------------   Manual reconcile   ----------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResult {
    pub success: bool,
    pub checked: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub errors: usize,
}

impl From<ReconcileSummary> for ReconcileResult {
    fn from(summary: ReconcileSummary) -> Self {
        Self {
            success: true,
            checked: summary.checked,
            confirmed: summary.confirmed,
            cancelled: summary.cancelled,
            errors: summary.errors,
        }
    }
}
