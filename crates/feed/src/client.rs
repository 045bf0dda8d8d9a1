//! Fail-silent upstream HTTP client

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::trace;

use llama_core::{CoreError, CoreResult, Fetched, UpstreamConfig};

/// Reads JSON from the upstream API hosts.
///
/// Every failure (connect, timeout, non-2xx, undecodable body) collapses into
/// `Fetched::Absent`. The reason is dropped on purpose and never logged.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    accept: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> CoreResult<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CoreError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            accept: config.accept.clone(),
        })
    }

    /// GET `url` and decode the body as JSON
    pub async fn get_json(&self, url: &str) -> Fetched {
        trace!(url, "upstream request");

        match self.try_get_json(url).await {
            Ok(value) => Fetched::Value(value),
            Err(_) => Fetched::Absent,
        }
    }

    async fn try_get_json(&self, url: &str) -> reqwest::Result<Value> {
        self.http
            .get(url)
            .header(ACCEPT, &self.accept)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
