//! Serializable run configuration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use anvil_core::Timeframe;

/// Unique identifier for a run configuration (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce a backtest run.
///
/// Dates are `YYYY-MM-DD` strings in the file format and resolve to UTC
/// midnight. Fee and slippage are percentages (0.1 = 0.1%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub strategy_id: String,
    /// Overrides the strategy's own symbol list when non-empty.
    #[serde(default)]
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    pub start_date: String,
    pub end_date: String,
    pub initial_capital: f64,
    #[serde(default = "default_fee_rate")]
    pub fee_rate_pct: f64,
    #[serde(default = "default_slippage")]
    pub slippage_pct: f64,
    /// Reserved. The engine is long-only and never borrows; the flag is
    /// carried so configs round-trip and hash stably.
    #[serde(default)]
    pub allow_margin: bool,
}

fn default_fee_rate() -> f64 {
    0.1
}

fn default_slippage() -> f64 {
    0.05
}

impl RunConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy_id.trim().is_empty() {
            return Err(ConfigError::Invalid("strategy_id is empty".into()));
        }
        if self.fee_rate_pct < 0.0 {
            return Err(ConfigError::Invalid("fee_rate_pct is negative".into()));
        }
        if self.slippage_pct < 0.0 {
            return Err(ConfigError::Invalid("slippage_pct is negative".into()));
        }
        let start = self.start()?;
        let end = self.end()?;
        if end <= start {
            return Err(ConfigError::Invalid(format!(
                "end_date {} is not after start_date {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }

    pub fn start(&self) -> Result<DateTime<Utc>, ConfigError> {
        parse_date(&self.start_date)
    }

    pub fn end(&self) -> Result<DateTime<Utc>, ConfigError> {
        parse_date(&self.end_date)
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Two identical configs share a RunId, which is what lets the store's
    /// last-write-wins read return the newest run of a config.
    pub fn run_id(&self) -> RunId {
        // Serializing a config with only string/number fields cannot fail
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, ConfigError> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| ConfigError::Invalid(format!("bad date '{s}': {e}")))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ConfigError::Invalid(format!("bad date '{s}'")))?;
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunConfig {
        RunConfig {
            strategy_id: "rsi-reversion".into(),
            symbols: vec!["BTCUSDT".into()],
            timeframe: Timeframe::H1,
            start_date: "2024-01-01".into(),
            end_date: "2024-06-30".into(),
            initial_capital: 10_000.0,
            fee_rate_pct: 0.1,
            slippage_pct: 0.05,
            allow_margin: false,
        }
    }

    #[test]
    fn toml_roundtrip_with_defaults() {
        let toml_str = r#"
strategy_id = "rsi-reversion"
symbols = ["BTCUSDT"]
timeframe = "1h"
start_date = "2024-01-01"
end_date = "2024-06-30"
initial_capital = 10000.0
"#;
        let config = RunConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.timeframe, Timeframe::H1);
        assert_eq!(config.fee_rate_pct, 0.1);
        assert_eq!(config.slippage_pct, 0.05);
        assert!(!config.allow_margin);
    }

    #[test]
    fn margin_flag_is_carried_and_hashed() {
        let toml_str = r#"
strategy_id = "rsi-reversion"
timeframe = "1h"
start_date = "2024-01-01"
end_date = "2024-06-30"
initial_capital = 10000.0
allow_margin = true
"#;
        let config = RunConfig::from_toml(toml_str).unwrap();
        assert!(config.allow_margin);
        let mut spot = config.clone();
        spot.allow_margin = false;
        assert_ne!(config.run_id(), spot.run_id());
    }

    #[test]
    fn run_id_deterministic() {
        let config = sample();
        assert_eq!(config.run_id(), config.run_id());
        assert!(!config.run_id().is_empty());
    }

    #[test]
    fn run_id_changes_with_params() {
        let a = sample();
        let mut b = a.clone();
        b.initial_capital = 20_000.0;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn validate_rejects_inverted_dates() {
        let mut config = sample();
        config.end_date = "2023-12-31".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_bad_date_format() {
        let mut config = sample();
        config.start_date = "01/01/2024".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_fee() {
        let mut config = sample();
        config.fee_rate_pct = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn dates_resolve_to_utc_midnight() {
        let config = sample();
        let start = config.start().unwrap();
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
