//! Upstream HTTP Client - Bounded, Retrying REST Client
//!
//! Wraps reqwest with a concurrency limit, retries with exponential
//! backoff, and an optional API key header. Shared by the trigger
//! gateway and the price lookup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::types::ApiErrorBody;

/// Header carrying the upstream API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Configuration for the upstream HTTP client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
  /// Base URL; request paths are appended verbatim.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// API key sent on every request, if configured.
  pub api_key: Option<String>,
}

impl Default for ApiClientConfig {
  fn default() -> Self {
    Self {
      base_url: "https://lite-api.jup.ag/trigger/v1".to_string(),
      timeout: Duration::from_secs(10),
      max_concurrent: 8,
      max_retries: 3,
      retry_base_delay: Duration::from_millis(200),
      api_key: None,
    }
  }
}

/// Concurrency-limited HTTP client for one upstream API.
pub struct ApiClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: ApiClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
}

impl ApiClient {
  /// Create a new client.
  pub fn new(config: ApiClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));

    Ok(Self {
      http,
      config,
      semaphore,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  /// GET `path` and decode the JSON body.
  pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
    let url = format!("{}{}", self.config.base_url, path);
    let request = self.http.get(&url);
    let response = self.execute_with_retry(request, "GET", path).await?;
    response
      .json::<R>()
      .await
      .with_context(|| format!("Invalid JSON from GET {path}"))
  }

  /// POST `body` as JSON to `path` and decode the JSON response.
  pub async fn post_json<B: Serialize + Sync, R: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<R> {
    let url = format!("{}{}", self.config.base_url, path);
    let request = self.http.post(&url).json(body);
    let response = self.execute_with_retry(request, "POST", path).await?;
    response
      .json::<R>()
      .await
      .with_context(|| format!("Invalid JSON from POST {path}"))
  }

  /// Execute request with API key, concurrency limit, and retries.
  ///
  /// Retries 429, 5xx, and transport errors. Any other non-success
  /// status fails immediately with the upstream error body.
  async fn execute_with_retry(
    &self,
    request: RequestBuilder,
    method: &str,
    path: &str,
  ) -> Result<Response> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .context("Semaphore closed")?;

    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = self.config.retry_base_delay * 2u32.pow(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis(), method, path, "Retrying request");
        sleep(delay).await;
      }

      let mut req = request
        .try_clone()
        .context("Failed to clone request")?;

      if let Some(key) = &self.config.api_key {
        req = req.header(API_KEY_HEADER, key);
      }

      match req.send().await {
        Ok(response) => match response.status() {
          status if status.is_success() => return Ok(response),
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(method, path, "Rate limited upstream, backing off");
            last_error = Some(anyhow::anyhow!("Rate limited"));
          }
          status if status.is_server_error() => {
            warn!(status = %status, method, path, "Server error, retrying");
            last_error = Some(anyhow::anyhow!("Server error: {status}"));
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
              "API error {status}: {}",
              ApiErrorBody::describe(&body)
            ));
          }
        },
        Err(e) => {
          warn!(error = %e, attempt, method, path, "Request failed");
          last_error = Some(e.into());
        }
      }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Max retries exceeded")))
  }

  /// Check if the API host answers at all.
  pub async fn health_check(&self) -> bool {
    self
      .http
      .get(&self.config.base_url)
      .send()
      .await
      .is_ok_and(|r| !r.status().is_server_error())
  }
}
