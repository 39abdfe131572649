use std::env;

use anyhow::Context;

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  /// How often unattributed completed sales are retried. Zero disables it.
  pub retry_interval: Duration,
  pub rate_limit_per_second: u64,
  pub rate_limit_burst: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: "sqlite:ambassador.db?mode=rwc".into(),
      port: 3000,
      retry_interval: Duration::from_secs(5 * 60),
      rate_limit_per_second: 2,
      rate_limit_burst: 100,
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  fn from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
  ) -> anyhow::Result<Self> {
    let mut config = Self::default();

    if let Some(url) = lookup("DATABASE_URL") {
      config.database_url = url;
    }
    if let Some(port) = lookup("PORT") {
      config.port = port.trim().parse().context("PORT is not a valid port")?;
    }
    if let Some(interval) = lookup("RETRY_INTERVAL") {
      config.retry_interval = humantime::parse_duration(interval.trim())
        .context("RETRY_INTERVAL is not a valid duration")?;
    }
    if let Some(rate) = lookup("RATE_LIMIT_PER_SECOND") {
      config.rate_limit_per_second =
        rate.trim().parse().context("RATE_LIMIT_PER_SECOND is not a number")?;
    }
    if let Some(burst) = lookup("RATE_LIMIT_BURST") {
      config.rate_limit_burst =
        burst.trim().parse().context("RATE_LIMIT_BURST is not a number")?;
    }

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> =
      vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| vars.get(key).cloned()
  }

  #[test]
  fn test_defaults() {
    let config = Config::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.port, 3000);
    assert_eq!(config.retry_interval, Duration::from_secs(300));
    assert_eq!(config.database_url, "sqlite:ambassador.db?mode=rwc");
  }

  #[test]
  fn test_overrides() {
    let config = Config::from_lookup(lookup(&[
      ("PORT", "8080"),
      ("RETRY_INTERVAL", "1h 30m"),
      ("DATABASE_URL", "sqlite::memory:"),
      ("RATE_LIMIT_BURST", "5"),
    ]))
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.retry_interval, Duration::from_secs(90 * 60));
    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.rate_limit_burst, 5);
  }

  #[test]
  fn test_invalid_values() {
    assert!(Config::from_lookup(lookup(&[("PORT", "http")])).is_err());
    let vars = [("RETRY_INTERVAL", "soon")];
    assert!(Config::from_lookup(lookup(&vars)).is_err());
  }
}
