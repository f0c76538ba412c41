//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;
use crate::domain::scaling::MAX_DECIMALS;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    name = %config.service.name,
    transport = %config.transport.bind_address,
    gateway = %config.gateway.base_url,
    dry_run = config.service.dry_run,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
///
/// # Errors
/// TOML syntax errors, missing sections, or failed validation.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty upstream URLs
/// - Sane engine precision bound
/// - Positive timeouts and concurrency
/// - Advisory percentages in (0, 1)
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.is_empty(),
    "service.name must not be empty"
  );

  // Engine validation
  anyhow::ensure!(
    config.engine.max_decimals <= MAX_DECIMALS,
    "engine.max_decimals must be <= {MAX_DECIMALS}, got {}",
    config.engine.max_decimals
  );

  // Transport validation
  anyhow::ensure!(
    config.transport.max_connections > 0,
    "transport.max_connections must be positive"
  );

  // Gateway validation
  anyhow::ensure!(
    !config.gateway.base_url.is_empty(),
    "gateway.base_url must not be empty"
  );
  anyhow::ensure!(
    config.gateway.timeout_ms > 0,
    "gateway.timeout_ms must be positive"
  );
  anyhow::ensure!(
    config.gateway.max_concurrent > 0,
    "gateway.max_concurrent must be positive"
  );

  // Pricing validation
  anyhow::ensure!(
    !config.pricing.base_url.is_empty(),
    "pricing.base_url must not be empty"
  );

  // Advisory validation
  for (name, value) in [
    ("entry_discount", config.advisory.entry_discount),
    ("take_profit_pct", config.advisory.take_profit_pct),
    ("stop_loss_pct", config.advisory.stop_loss_pct),
  ] {
    anyhow::ensure!(
      value > 0.0 && value < 1.0,
      "advisory.{name} must be in (0, 1), got {value}"
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const MINIMAL: &str = r#"
[service]
name = "trigger-order-router"

[transport]

[gateway]
base_url = "https://api.example.com/trigger/v1"

[pricing]
base_url = "https://api.example.com/price/v2"
"#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_minimal_config_applies_defaults() {
    let config = parse_config(MINIMAL).unwrap();
    assert_eq!(config.service.log_level, "info");
    assert!(!config.service.dry_run);
    assert_eq!(config.transport.bind_address, "0.0.0.0:8080");
    assert_eq!(config.engine.max_decimals, 18);
    assert_eq!(config.gateway.max_retries, 3);
    assert_eq!(config.gateway.api_key_env, "TRIGGER_API_KEY");
    assert_eq!(config.persistence.data_dir, "data");
    assert!(config.metrics.enabled);
    assert!((config.advisory.take_profit_pct - 0.10).abs() < f64::EPSILON);
  }

  #[test]
  fn test_rejects_excessive_max_decimals() {
    let content = format!("{MINIMAL}\n[engine]\nmax_decimals = 24\n");
    let err = parse_config(&content).unwrap_err();
    assert!(err.to_string().contains("max_decimals"));
  }

  #[test]
  fn test_rejects_out_of_range_advisory_pct() {
    let content = format!("{MINIMAL}\n[advisory]\nstop_loss_pct = 1.5\n");
    let err = parse_config(&content).unwrap_err();
    assert!(err.to_string().contains("stop_loss_pct"));
  }

  #[test]
  fn test_rejects_missing_gateway() {
    let content = MINIMAL.replace("[gateway]\nbase_url = \"https://api.example.com/trigger/v1\"\n", "");
    assert!(parse_config(&content).is_err());
  }
}
