use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use tracing::warn;

// -----------------------------------------------
// DELTA EXCHANGE API ENDPOINTS
// -----------------------------------------------
pub const DELTA_BASE_URL: &str = "https://api.delta.exchange/v2";

pub fn tickers_url(base_url: &str) -> String {
    format!("{}/tickers", base_url)
}

pub fn products_url(base_url: &str) -> String {
    format!("{}/products", base_url)
}

pub fn history_candles_url(
    base_url: &str,
    symbol: &str,
    resolution: &str,
    start: i64,
    end: i64,
) -> String {
    format!(
        "{}/history/candles?symbol={}&resolution={}&start={}&end={}",
        base_url,
        urlencoding::encode(symbol),
        urlencoding::encode(resolution),
        start,
        end
    )
}

// -----------------------------------------------
// INSTRUMENTS
// -----------------------------------------------
pub const SPOT_TICKER: &str = "BTCUSDT";
pub const UNDERLYING_SYMBOL: &str = "BTC";
pub const CALL_CONTRACT_TYPE: &str = "call_options";
pub const PUT_CONTRACT_TYPE: &str = "put_options";

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = concat!("delta-options/", env!("CARGO_PKG_VERSION"));
pub const HEADER_ACCEPT_JSON: &str = "application/json";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

// -----------------------------------------------
// RUN PARAMETERS
// -----------------------------------------------
pub const DAYS_AHEAD: u32 = 7;
pub const DAYS_BACK: u32 = 14;
pub const EXPIRY_OFFSET_DAYS: i64 = 3;
pub const STRIKE_SPREAD: i64 = 15_000;
pub const STRIKE_STEP: i64 = 100;
pub const RESOLUTION: &str = "1d";

/// Reference calendar date for day index 0 (2025-05-25).
pub const BASE_DATE: (i32, u32, u32) = (2025, 5, 25);

// -----------------------------------------------
// OUTPUT
// -----------------------------------------------
pub const DB_PATH: &str = "btc_options_week.db";
pub const CANDLES_CSV: &str = "btc_options_candles.csv";
pub const LOG_DIR: &str = "./logs";
pub const LOG_FILE_PREFIX: &str = "delta-options.log";

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Parameters of a single harvest run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub base_url: String,
    pub base_date: NaiveDate,
    pub days_ahead: u32,
    pub days_back: u32,
    pub strike_spread: i64,
    pub strike_step: i64,
    pub resolution: String,
    pub db_path: PathBuf,
    pub candles_csv: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        let (y, m, d) = BASE_DATE;
        Self {
            base_url: DELTA_BASE_URL.to_string(),
            base_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
            days_ahead: DAYS_AHEAD,
            days_back: DAYS_BACK,
            strike_spread: STRIKE_SPREAD,
            strike_step: STRIKE_STEP,
            resolution: RESOLUTION.to_string(),
            db_path: PathBuf::from(DB_PATH),
            candles_csv: PathBuf::from(CANDLES_CSV),
        }
    }
}

impl RunConfig {
    /// Defaults overridden by any `DELTA_*` environment variables that are set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("DELTA_BASE_URL").unwrap_or(defaults.base_url),
            base_date: std::env::var("DELTA_BASE_DATE")
                .ok()
                .and_then(|raw| match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                    Ok(date) => Some(date),
                    Err(e) => {
                        warn!(value = %raw, error = %e, "ignoring DELTA_BASE_DATE");
                        None
                    }
                })
                .unwrap_or(defaults.base_date),
            days_ahead: env_or("DELTA_DAYS_AHEAD", defaults.days_ahead),
            days_back: env_or("DELTA_DAYS_BACK", defaults.days_back),
            strike_spread: env_or("DELTA_STRIKE_SPREAD", defaults.strike_spread),
            strike_step: env_or("DELTA_STRIKE_STEP", defaults.strike_step),
            resolution: std::env::var("DELTA_RESOLUTION").unwrap_or(defaults.resolution),
            db_path: std::env::var("DELTA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            candles_csv: std::env::var("DELTA_CANDLES_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.candles_csv),
        }
    }

    /// Zero forward days is allowed and yields an empty run.
    pub fn validate(&self) -> Result<()> {
        if self.strike_step <= 0 {
            bail!("strike step must be positive, got {}", self.strike_step);
        }
        if self.strike_spread < 0 {
            bail!("strike spread must not be negative, got {}", self.strike_spread);
        }
        Ok(())
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!(key, value = %raw, fallback = %default, "unparseable override, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_config() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.base_date, NaiveDate::from_ymd_opt(2025, 5, 25).unwrap());
        assert_eq!(cfg.days_ahead, 7);
        assert_eq!(cfg.days_back, 14);
        assert_eq!(cfg.strike_spread, 15_000);
        assert_eq!(cfg.strike_step, 100);
        assert_eq!(cfg.resolution, "1d");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let cfg = RunConfig { strike_step: 0, ..RunConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = RunConfig { strike_spread: -1, ..RunConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = RunConfig { days_ahead: 0, ..RunConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_history_candles_url_encodes_symbol() {
        let url = history_candles_url("https://x.test/v2", "C-BTC-85000-280525", "1d", 10, 20);
        assert_eq!(
            url,
            "https://x.test/v2/history/candles?symbol=C-BTC-85000-280525&resolution=1d&start=10&end=20"
        );

        let url = history_candles_url("https://x.test/v2", "A B", "1d", 0, 1);
        assert!(url.contains("symbol=A%20B"));
    }
}
