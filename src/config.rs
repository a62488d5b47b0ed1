/// config.rs — Centralised configuration loaded from .env
///
/// Every knob the pipeline consumes lives in one struct passed explicitly
/// into each component — no ambient module state. Loading happens once at
/// startup; the CLI may override individual fields afterwards.
use chrono::NaiveDate;
use std::env;

use crate::error::{Result, VolError};

pub const DEFAULT_TICKER: &str = "^GSPC";
pub const DEFAULT_START_DATE: &str = "2010-01-01";
pub const DEFAULT_END_DATE: &str = "2024-12-31";

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── Data request ─────────────────────────────────────────────────
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    // ── Volatility estimation ────────────────────────────────────────
    /// Annualization factor A (trading periods per year).
    pub trading_days_per_year: u32,
    /// Trailing window W for realized vol.
    pub rolling_window: usize,
    /// Iteration budget for the GARCH Nelder-Mead fit.
    pub garch_max_iters: u64,

    // ── Overlay sizing ───────────────────────────────────────────────
    pub target_annual_vol: f64,
    pub min_leverage: f64,
    pub max_leverage: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_TICKER.into(),
            start_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            trading_days_per_year: 252,
            rolling_window: 21,
            garch_max_iters: 5000,
            target_annual_vol: 0.10,
            min_leverage: 0.0,
            max_leverage: 2.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // ignore missing .env

        let ticker = env::var("TICKER").unwrap_or_else(|_| DEFAULT_TICKER.into());
        let start_date = parse_date_env("START_DATE", DEFAULT_START_DATE)?;
        let end_date = parse_date_env("END_DATE", DEFAULT_END_DATE)?;

        let cfg = Self {
            ticker,
            start_date,
            end_date,
            trading_days_per_year: parse_env("TRADING_DAYS_PER_YEAR", 252u32)?,
            rolling_window: parse_env("ROLLING_WINDOW", 21usize)?,
            garch_max_iters: parse_env("GARCH_MAX_ITERS", 5000u64)?,
            target_annual_vol: parse_env("TARGET_ANNUAL_VOL", 0.10)?,
            min_leverage: parse_env("MIN_LEVERAGE", 0.0)?,
            max_leverage: parse_env("MAX_LEVERAGE", 2.0)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_date >= self.end_date {
            return Err(VolError::InvalidInput(format!(
                "config: start_date {} not before end_date {}",
                self.start_date, self.end_date
            )));
        }
        if self.rolling_window < 2 {
            return Err(VolError::InvalidInput(format!(
                "config: rolling_window must be ≥ 2, got {}",
                self.rolling_window
            )));
        }
        if self.trading_days_per_year == 0 {
            return Err(VolError::InvalidInput(
                "config: trading_days_per_year must be positive".into(),
            ));
        }
        if !(self.target_annual_vol > 0.0) {
            return Err(VolError::InvalidInput(format!(
                "config: target_annual_vol must be > 0, got {}",
                self.target_annual_vol
            )));
        }
        if self.min_leverage > self.max_leverage {
            return Err(VolError::InvalidInput(format!(
                "config: min_leverage {} > max_leverage {}",
                self.min_leverage, self.max_leverage
            )));
        }
        if self.garch_max_iters == 0 {
            return Err(VolError::InvalidInput(
                "config: garch_max_iters must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|e| VolError::InvalidInput(format!("config key {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn parse_date_env(key: &str, default: &str) -> Result<NaiveDate> {
    let raw = env::var(key).unwrap_or_else(|_| default.into());
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| VolError::InvalidInput(format!("config key {key}: {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.rolling_window, 21);
        assert_eq!(cfg.trading_days_per_year, 252);
        assert!((cfg.target_annual_vol - 0.10).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut cfg = AppConfig::default();
        cfg.min_leverage = 3.0;
        assert!(matches!(cfg.validate(), Err(VolError::InvalidInput(_))));

        let mut cfg = AppConfig::default();
        cfg.end_date = cfg.start_date;
        assert!(matches!(cfg.validate(), Err(VolError::InvalidInput(_))));

        let mut cfg = AppConfig::default();
        cfg.rolling_window = 1;
        assert!(matches!(cfg.validate(), Err(VolError::InvalidInput(_))));
    }
}
