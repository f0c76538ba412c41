//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Upstream endpoints and strategy parameters are externalized
//! here - nothing is hardcoded in the domain layer. Secrets (the
//! trigger API key) are read from the environment, never from the file.

pub mod loader;

use serde::Deserialize;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the service begins accepting connections.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// WebSocket request/response transport.
  pub transport: TransportConfig,
  /// Calculation engine limits.
  #[serde(default)]
  pub engine: EngineConfig,
  /// Upstream trigger-order API.
  pub gateway: GatewayConfig,
  /// Market price API.
  pub pricing: PricingConfig,
  /// Order record storage.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Metrics and health endpoints.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Rule-based advisory strategy.
  #[serde(default)]
  pub advisory: AdvisoryConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Calculate and persist, but never call the upstream gateway.
  #[serde(default)]
  pub dry_run: bool,
}

/// WebSocket transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
  /// Listen address for client connections.
  #[serde(default = "default_transport_addr")]
  pub bind_address: String,
  /// Maximum concurrent client connections.
  #[serde(default = "default_max_connections")]
  pub max_connections: usize,
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Largest accepted token precision (capped at 18).
  #[serde(default = "default_max_decimals")]
  pub max_decimals: u32,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_decimals: default_max_decimals(),
    }
  }
}

/// Trigger API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
  /// Trigger API base URL.
  pub base_url: String,
  /// Environment variable holding the API key (optional upstream).
  #[serde(default = "default_api_key_env")]
  pub api_key_env: String,
  /// Request timeout in milliseconds.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
  /// Maximum concurrent upstream requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  #[serde(default = "default_retry_delay_ms")]
  pub retry_base_delay_ms: u64,
}

/// Price API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
  /// Price endpoint URL (token ids appended as `?ids=`).
  pub base_url: String,
  /// Request timeout in milliseconds.
  #[serde(default = "default_timeout_ms")]
  pub timeout_ms: u64,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for the order snapshot file.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Health + metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

/// Rule-based advisory configuration.
///
/// Percentages are fractions (0.02 = 2%).
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisoryConfig {
  /// Serve `suggest_orders` requests.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Entry placed this far below the current price.
  #[serde(default = "default_entry_discount")]
  pub entry_discount: f64,
  /// Take-profit placed this far above the entry.
  #[serde(default = "default_take_profit_pct")]
  pub take_profit_pct: f64,
  /// Stop-loss placed this far below the entry.
  #[serde(default = "default_stop_loss_pct")]
  pub stop_loss_pct: f64,
}

impl Default for AdvisoryConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      entry_discount: default_entry_discount(),
      take_profit_pct: default_take_profit_pct(),
      stop_loss_pct: default_stop_loss_pct(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_transport_addr() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_max_connections() -> usize {
  256
}

fn default_max_decimals() -> u32 {
  18
}

fn default_api_key_env() -> String {
  "TRIGGER_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
  10_000
}

fn default_max_concurrent() -> usize {
  8
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_delay_ms() -> u64 {
  200
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_entry_discount() -> f64 {
  0.02
}

fn default_take_profit_pct() -> f64 {
  0.10
}

fn default_stop_loss_pct() -> f64 {
  0.05
}
