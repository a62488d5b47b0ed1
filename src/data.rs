/// data.rs — Price Data Provider
///
/// Single blocking fetch of daily closes from a Yahoo-Finance-style chart
/// endpoint. The provider's contract is strict: it returns one ordered close
/// series for one symbol or fails with `DataUnavailable` — no retries, no
/// runtime shape-sniffing of the payload. Missing closes come back as NaN
/// rows and are dropped by the `PriceSeries` builder.
use chrono::{DateTime, Days, NaiveDate};
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, VolError};
use crate::series::PriceSeries;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = concat!("vol_engine/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    close: Vec<Option<f64>>,
}

/// HTTP client for the daily-close chart API.
pub struct ChartClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChartClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VolError::DataUnavailable(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Fetch daily closes for `symbol` over `[start, end]` (inclusive).
    pub async fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let period1 = date_to_unix(start)?;
        // The chart API treats period2 as exclusive; push it one day out.
        let period2 = date_to_unix(
            end.checked_add_days(Days::new(1)).ok_or_else(|| {
                VolError::DataUnavailable(format!("end date {end} out of range"))
            })?,
        )?;
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url, symbol, period1, period2
        );
        info!("Fetching {symbol} daily closes {start} → {end}");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| VolError::DataUnavailable(format!("{symbol}: request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(VolError::DataUnavailable(format!(
                "{symbol}: provider returned HTTP {}",
                resp.status()
            )));
        }
        let envelope: ChartEnvelope = resp
            .json()
            .await
            .map_err(|e| VolError::DataUnavailable(format!("{symbol}: bad payload: {e}")))?;

        let rows = rows_from_envelope(envelope, symbol)?;
        info!("Received {} daily rows for {symbol}", rows.len());
        PriceSeries::from_rows(rows)
    }
}

fn date_to_unix(date: NaiveDate) -> Result<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| VolError::DataUnavailable(format!("unrepresentable date {date}")))
}

/// Flatten the provider envelope to (date, close) rows. Missing closes
/// become NaN rows so the series builder applies the one dropping rule.
fn rows_from_envelope(envelope: ChartEnvelope, symbol: &str) -> Result<Vec<(NaiveDate, f64)>> {
    if let Some(err) = envelope.chart.error {
        return Err(VolError::DataUnavailable(format!(
            "{symbol}: provider error: {err}"
        )));
    }
    let result = envelope
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| {
            VolError::DataUnavailable(format!("{symbol}: provider returned no result"))
        })?;
    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    if timestamps.is_empty() || timestamps.len() != closes.len() {
        return Err(VolError::DataUnavailable(format!(
            "{symbol}: malformed series ({} timestamps, {} closes)",
            timestamps.len(),
            closes.len()
        )));
    }

    let mut rows = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.into_iter().zip(closes) {
        let date = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| {
                VolError::DataUnavailable(format!("{symbol}: bad timestamp {ts}"))
            })?
            .date_naive();
        rows.push((date, close.unwrap_or(f64::NAN)));
    }
    Ok(rows)
}
