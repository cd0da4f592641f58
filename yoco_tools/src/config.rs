use log::*;
use lps_common::Secret;
use serde::{Deserialize, Serialize};

const DEFAULT_YOCO_API_URL: &str = "https://payments.yoco.com/api";

/// Runtime configuration for the Yoco API client.
#[derive(Debug, Clone)]
pub struct YocoConfig {
    /// Base URL for the Yoco payments API, without a trailing slash.
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub public_key: String,
    pub test_mode: bool,
}

impl Default for YocoConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_YOCO_API_URL.to_string(),
            secret_key: Secret::default(),
            public_key: String::default(),
            test_mode: true,
        }
    }
}

impl YocoConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("LPS_YOCO_API_URL").unwrap_or_else(|_| DEFAULT_YOCO_API_URL.to_string());
        let secret_key = Secret::new(std::env::var("LPS_YOCO_SECRET_KEY").unwrap_or_else(|_| {
            warn!("LPS_YOCO_SECRET_KEY not set. Payment verification against Yoco will be unavailable.");
            String::default()
        }));
        let public_key = std::env::var("LPS_YOCO_PUBLIC_KEY").unwrap_or_default();
        let test_mode =
            std::env::var("LPS_YOCO_TEST_MODE").map(|s| &s != "0" && s.to_lowercase() != "false").unwrap_or(true);
        Self { api_url, secret_key, public_key, test_mode }
    }

    pub fn from_credentials(creds: YocoCredentials) -> Self {
        Self {
            api_url: DEFAULT_YOCO_API_URL.to_string(),
            secret_key: Secret::new(creds.secret_key),
            public_key: creds.public_key,
            test_mode: creds.test_mode,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }
}

/// The credential record as stored in the settings store (camelCase JSON, matching the admin console's format).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YocoCredentials {
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default = "default_test_mode")]
    pub test_mode: bool,
}

fn default_test_mode() -> bool {
    true
}
