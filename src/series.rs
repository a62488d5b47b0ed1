/// series.rs — Return Series Builder
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// Log-return from consecutive closes:
///
///   r_t = ln(P_t / P_{t-1}) = ln(P_t) − ln(P_{t-1})
///
/// Rolling realized volatility (trailing window of W returns, sample std):
///
///   rv_t = std(r_{t-W+1} … r_t) · √A
///
///   where A = trading periods per year (252 for daily equity data).
///   rv_t is undefined for t < W−1; those leading rows carry no realized
///   vol and are dropped ONCE when the aligned panel is built — downstream
///   series never see an undefined value.
/// ─────────────────────────────────────────────────────────────────────────
use chrono::NaiveDate;
use statrs::statistics::Statistics;

use crate::error::{Result, VolError};

/// Ordered (date, close) observations. Dates strictly increasing, closes
/// positive and finite. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
}

impl PriceSeries {
    /// Build a validated series from raw provider rows.
    ///
    /// Non-finite closes (the provider's missing entries) are dropped first;
    /// what remains must be ≥ 2 strictly positive closes on strictly
    /// increasing dates.
    pub fn from_rows(rows: Vec<(NaiveDate, f64)>) -> Result<Self> {
        let mut dates = Vec::with_capacity(rows.len());
        let mut closes = Vec::with_capacity(rows.len());
        for (date, close) in rows {
            if !close.is_finite() {
                continue;
            }
            if close <= 0.0 {
                return Err(VolError::InvalidInput(format!(
                    "price series: non-positive close {close} on {date}"
                )));
            }
            if let Some(&prev) = dates.last() {
                if date <= prev {
                    return Err(VolError::InvalidInput(format!(
                        "price series: dates not strictly increasing ({prev} → {date})"
                    )));
                }
            }
            dates.push(date);
            closes.push(close);
        }
        if closes.len() < 2 {
            return Err(VolError::InvalidInput(format!(
                "price series: need ≥ 2 valid closes, got {}",
                closes.len()
            )));
        }
        Ok(Self { dates, closes })
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Log-returns: one element shorter than the price series, dated by the
    /// later close of each pair.
    pub fn log_returns(&self) -> ReturnSeries {
        let n = self.len();
        let mut values = Vec::with_capacity(n - 1);
        for t in 1..n {
            values.push((self.closes[t] / self.closes[t - 1]).ln());
        }
        ReturnSeries {
            dates: self.dates[1..].to_vec(),
            values,
        }
    }
}

/// Ordered (date, log_return) observations.
#[derive(Debug, Clone)]
pub struct ReturnSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Annualized rolling realized volatility over a trailing window of
    /// `window` returns. The result starts at return index `window − 1`; the
    /// undefined leading rows are simply absent.
    pub fn realized_vol(&self, window: usize, trading_days: f64) -> Result<RealizedVolSeries> {
        if window < 2 {
            return Err(VolError::InvalidInput(format!(
                "realized vol: window must be ≥ 2, got {window}"
            )));
        }
        if self.len() < window {
            return Err(VolError::InvalidInput(format!(
                "realized vol: {} returns < window {window}",
                self.len()
            )));
        }
        let ann = trading_days.sqrt();
        let n = self.len();
        let mut values = Vec::with_capacity(n - window + 1);
        for t in (window - 1)..n {
            let sd = self.values[t + 1 - window..=t].iter().std_dev();
            values.push(sd * ann);
        }
        Ok(RealizedVolSeries {
            dates: self.dates[window - 1..].to_vec(),
            values,
        })
    }
}

/// Annualized realized volatility, aligned to the return dates from index
/// `window − 1` onward.
#[derive(Debug, Clone)]
pub struct RealizedVolSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl RealizedVolSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Returns and realized vol on one common date axis: the return series with
/// its leading `window − 1` rows (undefined realized vol) dropped. This is
/// the only place leading rows are discarded; the GARCH fit, the overlay and
/// the metrics all consume this axis.
#[derive(Debug, Clone)]
pub struct VolPanel {
    pub dates: Vec<NaiveDate>,
    pub log_return: Vec<f64>,
    pub realized_vol: Vec<f64>,
}

impl VolPanel {
    pub fn build(returns: &ReturnSeries, window: usize, trading_days: f64) -> Result<Self> {
        let rv = returns.realized_vol(window, trading_days)?;
        let skip = window - 1;
        Ok(Self {
            dates: returns.dates[skip..].to_vec(),
            log_return: returns.values[skip..].to_vec(),
            realized_vol: rv.values,
        })
    }

    pub fn len(&self) -> usize {
        self.log_return.len()
    }
}
