//! HttpSender - JSON POST to the ingestion API

use std::time::Duration;

use contracts::{ContractError, IngestionSender, IngestionSettings, PunchRecord};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::ForwarderError;

/// Header carrying the optional ingestion API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Request body expected by the ingestion API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PunchBatch<'a> {
    pub punches: &'a [PunchRecord],
    pub tenant_id: &'a str,
}

/// Configuration for HttpSender
#[derive(Debug, Clone)]
pub struct HttpSenderConfig {
    /// POST target
    pub url: String,
    /// Optional API key header value
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl HttpSenderConfig {
    /// Create config from ingestion settings
    pub fn from_settings(settings: &IngestionSettings) -> Result<Self, String> {
        if settings.url.trim().is_empty() {
            return Err("missing ingestion url".to_string());
        }
        Ok(Self {
            url: settings.url.clone(),
            api_key: settings.api_key.clone(),
            timeout: settings.timeout(),
        })
    }
}

/// Sender that posts batches to the ingestion API
pub struct HttpSender {
    name: String,
    config: HttpSenderConfig,
    client: Client,
}

impl HttpSender {
    /// Create a new HttpSender
    pub fn new(name: impl Into<String>, config: HttpSenderConfig) -> Result<Self, ForwarderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            name: name.into(),
            config,
            client,
        })
    }

    /// Create from ingestion settings (for factory)
    pub fn from_settings(
        name: impl Into<String>,
        settings: &IngestionSettings,
    ) -> Result<Self, ForwarderError> {
        let name = name.into();
        let config = HttpSenderConfig::from_settings(settings)
            .map_err(|e| ForwarderError::sender_creation(&name, e))?;
        Self::new(name, config)
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

impl IngestionSender for HttpSender {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sender_send",
        skip(self, records),
        fields(sender = %self.name, tenant = %tenant_id, records = records.len())
    )]
    async fn send(&self, records: &[PunchRecord], tenant_id: &str) -> Result<(), ContractError> {
        let body = PunchBatch {
            punches: records,
            tenant_id,
        };

        let mut request = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ContractError::send_failed(&self.name, tenant_id, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::send_failed(
                &self.name,
                tenant_id,
                format!("API call failed with status: {status}"),
            ));
        }

        debug!(status = %status, "Batch accepted");
        Ok(())
    }
}
