use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::YocoConfig, data_objects::NewCheckoutRequest, Checkout, YocoApiError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct YocoApi {
    config: YocoConfig,
    client: Arc<Client>,
}

impl YocoApi {
    pub fn new(config: YocoConfig) -> Result<Self, YocoApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| YocoApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| YocoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// A client built without a secret key can still be constructed, but must never be asked to verify anything.
    /// Callers check this before trusting any "not confirmed" answer.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn public_key(&self) -> &str {
        &self.config.public_key
    }

    pub fn test_mode(&self) -> bool {
        self.config.test_mode
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, YocoApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| YocoApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| YocoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "unknown".to_string());
            Err(YocoApiError::QueryError { status, message })
        }
    }

    /// Fetch the current state of a checkout session. This is the authoritative payment-confirmation source: an
    /// order is only ever marked paid off the back of a `completed` status returned here or a gateway-signed webhook.
    pub async fn fetch_checkout(&self, checkout_id: &str) -> Result<Checkout, YocoApiError> {
        let path = format!("/checkouts/{checkout_id}");
        debug!("Fetching checkout {checkout_id}");
        let checkout = self.rest_query::<Checkout, ()>(Method::GET, &path, None).await?;
        debug!("Checkout {checkout_id} status: {}", checkout.status);
        Ok(checkout)
    }

    /// Create a new checkout session for an order.
    pub async fn create_checkout(&self, request: &NewCheckoutRequest) -> Result<Checkout, YocoApiError> {
        debug!("Creating checkout for order {} ({})", request.metadata.order_id, request.amount);
        let checkout = self.rest_query::<Checkout, _>(Method::POST, "/checkouts", Some(request)).await?;
        info!("Checkout {} created for order {}", checkout.id, request.metadata.order_id);
        Ok(checkout)
    }
}
